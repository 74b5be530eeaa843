//! Requests against the `/api/users` collection endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::errors::ClientError;

pub const USERS_PATH: &str = "/api/users";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// One operation against the collection endpoint, disambiguated by method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsersRequest {
    /// `POST` with a serialized creation form
    Create { body: String },
    /// `PUT` with a serialized record form, including `id`
    Update { body: String },
    /// `DELETE` with `{"id": ...}`
    Delete { body: String },
    /// `GET ?limit=&offset=`
    List { limit: u32, offset: usize },
}

impl UsersRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "POST",
            Self::Update { .. } => "PUT",
            Self::Delete { .. } => "DELETE",
            Self::List { .. } => "GET",
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Create { body } | Self::Update { body } | Self::Delete { body } => Some(body),
            Self::List { .. } => None,
        }
    }
}

/// Sends a request and yields the response body of a 2xx answer.
///
/// Any other status, and any transport error, is a failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &UsersRequest) -> Result<String, ClientError>;
}

/// `reqwest`-backed transport talking to a running collection service.
pub struct HttpTransport {
    client: reqwest::Client,
    users_url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let invalid = || ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
        };
        let base = reqwest::Url::parse(base_url).map_err(|_| invalid())?;
        if base.cannot_be_a_base() {
            return Err(invalid());
        }
        let users_url = base.join(USERS_PATH).map_err(|_| invalid())?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, users_url })
    }

    pub fn users_url(&self) -> &reqwest::Url {
        &self.users_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &UsersRequest) -> Result<String, ClientError> {
        let url = self.users_url.clone();
        let builder = match request {
            UsersRequest::Create { body } => self.client.post(url).body(body.clone()),
            UsersRequest::Update { body } => self.client.put(url).body(body.clone()),
            UsersRequest::Delete { body } => self.client.delete(url).body(body.clone()),
            UsersRequest::List { limit, offset } => self
                .client
                .get(url)
                .query(&[("limit", limit.to_string()), ("offset", offset.to_string())]),
        };
        let builder = if request.body().is_some() {
            builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        } else {
            builder
        };

        let response = builder.send().await.inspect_err(|e| {
            debug!(method = request.method(), error = %e, "request did not complete");
        })?;
        let status = response.status();
        debug!(method = request.method(), status = status.as_u16(), "request completed");

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
