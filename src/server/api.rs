use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use userbook_common::{Field, Record};

use super::db::DbHandle;
#[cfg(test)]
use super::db::UsersDb;
use super::models::{UserFields, parse_user_id};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
}

pub type SharedState = Arc<AppState>;

const DEFAULT_LIMIT: i64 = 10;

// ── Request payload types ─────────────────────────────────────────────

/// Pagination query; values stay text so a bad number is a 400 with our
/// message rather than an extractor rejection.
#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    Invalid(Vec<String>),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": msg}))).into_response()
            }
            ApiError::Invalid(problems) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid record", "problems": problems})),
            )
                .into_response(),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": msg})),
            )
                .into_response(),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/users",
            get(list_users)
                .post(create_user)
                .put(update_user)
                .delete(delete_user),
        )
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Bodies must be JSON objects carrying at least one of `keys`.
fn require_object(body: Value, keys: &[Field]) -> Result<Map<String, Value>, ApiError> {
    let invalid = || ApiError::BadRequest("invalid JSON".into());
    let Value::Object(map) = body else {
        return Err(invalid());
    };
    if !keys.iter().any(|k| map.contains_key(k.name())) {
        return Err(invalid());
    }
    Ok(map)
}

fn user_fields(map: Map<String, Value>) -> Result<UserFields, ApiError> {
    let record: Record = serde_json::from_value(Value::Object(map))
        .map_err(|e| ApiError::BadRequest(format!("invalid record: {}", e)))?;
    UserFields::from_record(record).map_err(ApiError::Invalid)
}

fn parse_page_param(name: &str, value: Option<String>, default: i64) -> Result<i64, ApiError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid {}: {}", name, v))),
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    warn!(error = %e, "database error");
    ApiError::Internal(e.to_string())
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_users(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = parse_page_param("limit", query.limit, DEFAULT_LIMIT)?;
    let offset = parse_page_param("offset", query.offset, 0)?;
    let users = state
        .db
        .call(move |db| db.list_users(limit, offset))
        .await
        .map_err(internal)?;
    debug!(limit, offset, returned = users.len(), "listed users");
    Ok(Json(users))
}

async fn create_user(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let map = require_object(body, &Field::ATTRIBUTES)?;
    let fields = user_fields(map)?;
    let id = state
        .db
        .call(move |db| db.create_user(&fields))
        .await
        .map_err(internal)?;
    debug!(id, "created user");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_user(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let map = require_object(body, &Field::ALL)?;
    let id = map
        .get(Field::Id.name())
        .and_then(parse_user_id)
        .ok_or_else(|| ApiError::BadRequest("invalid id".into()))?;
    let fields = user_fields(map)?;
    let changed = state
        .db
        .call(move |db| db.update_user(id, &fields))
        .await
        .map_err(internal)?;
    if changed == 0 {
        return Err(ApiError::BadRequest(format!("no user with id {}", id)));
    }
    debug!(id, "updated user");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let map = require_object(body, &[Field::Id])?;
    let id = map
        .get(Field::Id.name())
        .and_then(parse_user_id)
        .ok_or_else(|| ApiError::BadRequest("invalid id".into()))?;
    let deleted = state
        .db
        .call(move |db| db.delete_user(id))
        .await
        .map_err(internal)?;
    debug!(id, deleted, "delete user");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let db = UsersDb::new_in_memory().unwrap();
        Arc::new(AppState {
            db: DbHandle::new(db),
        })
    }

    fn test_app(state: &SharedState) -> Router {
        api_router().with_state(state.clone())
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/api/users")
            .header("content-type", "application/json; charset=UTF-8")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn list_request(query: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(format!("/api/users{}", query))
            .body(Body::empty())
            .unwrap()
    }

    fn ann() -> Value {
        serde_json::json!({
            "id": "",
            "firstname": "Ann",
            "lastname": "Lee",
            "dob": "1990-01-02",
            "zipcode": "12345"
        })
    }

    async fn seed(state: &SharedState, count: usize) {
        for i in 0..count {
            let mut body = ann();
            body["firstname"] = Value::from(format!("user{}", i));
            let resp = test_app(state).oneshot(json_request("POST", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        }
    }

    async fn list(state: &SharedState, query: &str) -> Vec<Value> {
        let resp = test_app(state).oneshot(list_request(query)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp.into_body()).await
    }

    // 1. Health check
    #[tokio::test]
    async fn test_health_check() {
        let state = test_state();
        let resp = test_app(&state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    // 2. List (empty)
    #[tokio::test]
    async fn test_list_users_empty() {
        let state = test_state();
        assert!(list(&state, "").await.is_empty());
    }

    // 3. Create then list
    #[tokio::test]
    async fn test_create_user() {
        let state = test_state();
        let resp = test_app(&state).oneshot(json_request("POST", ann())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let users = list(&state, "?limit=10&offset=0").await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["firstname"], "Ann");
        assert_eq!(users[0]["zipcode"], "12345");
        assert!(users[0]["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_create_accepts_numeric_zipcode() {
        let state = test_state();
        let mut body = ann();
        body["zipcode"] = Value::from(54321);
        let resp = test_app(&state).oneshot(json_request("POST", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(list(&state, "").await[0]["zipcode"], "54321");
    }

    #[tokio::test]
    async fn test_create_without_record_keys_is_rejected() {
        let state = test_state();
        let resp = test_app(&state)
            .oneshot(json_request("POST", serde_json::json!({"name": "Ann"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = body_json(resp.into_body()).await;
        assert_eq!(body["error"], "invalid JSON");
    }

    #[tokio::test]
    async fn test_create_invalid_fields_is_rejected() {
        let state = test_state();
        let mut body = ann();
        body["firstname"] = Value::from("");
        body["zipcode"] = Value::from("1234");
        let resp = test_app(&state).oneshot(json_request("POST", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = body_json(resp.into_body()).await;
        assert_eq!(
            body["problems"],
            serde_json::json!(["First Name is required", "Zip Code must look like xxxxx (5 digits)"])
        );
        assert!(list(&state, "").await.is_empty());
    }

    // 4. Pagination
    #[tokio::test]
    async fn test_list_pages_by_offset() {
        let state = test_state();
        seed(&state, 13).await;

        assert_eq!(list(&state, "").await.len(), 10);
        let page = list(&state, "?limit=10&offset=10").await;
        let names: Vec<&str> = page.iter().map(|u| u["firstname"].as_str().unwrap()).collect();
        assert_eq!(names, ["user10", "user11", "user12"]);
        assert!(list(&state, "?offset=13").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging() {
        let state = test_state();
        for query in ["?limit=ten", "?offset=-1", "?limit=-5"] {
            let resp = test_app(&state).oneshot(list_request(query)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {}", query);
        }
    }

    // 5. Update
    #[tokio::test]
    async fn test_update_user() {
        let state = test_state();
        seed(&state, 1).await;
        let id = list(&state, "").await[0]["id"].as_i64().unwrap();

        let mut body = ann();
        body["id"] = Value::from(id.to_string());
        body["lastname"] = Value::from("Li");
        let resp = test_app(&state).oneshot(json_request("PUT", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(list(&state, "").await[0]["lastname"], "Li");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_rejected() {
        let state = test_state();
        let mut body = ann();
        body["id"] = Value::from(999);
        let resp = test_app(&state).oneshot(json_request("PUT", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let state = test_state();
        seed(&state, 1).await;
        let resp = test_app(&state).oneshot(json_request("PUT", ann())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    // 6. Delete
    #[tokio::test]
    async fn test_delete_user() {
        let state = test_state();
        seed(&state, 2).await;
        let id = list(&state, "").await[1]["id"].as_i64().unwrap();

        let resp = test_app(&state)
            .oneshot(json_request("DELETE", serde_json::json!({"id": id.to_string()})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let users = list(&state, "").await;
        assert_eq!(users.len(), 1);
        assert_ne!(users[0]["id"].as_i64().unwrap(), id);
    }

    #[tokio::test]
    async fn test_delete_missing_row_still_succeeds() {
        let state = test_state();
        let resp = test_app(&state)
            .oneshot(json_request("DELETE", serde_json::json!({"id": 41})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_delete_without_id_is_rejected() {
        let state = test_state();
        let resp = test_app(&state)
            .oneshot(json_request("DELETE", serde_json::json!({"firstname": "Ann"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
