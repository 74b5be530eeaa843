use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use userbook_common::{Field, FieldViolation, Record};

/// A user row as returned by `GET /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub dob: String,
    pub zipcode: String,
}

/// The four validated attributes of a create or update body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub firstname: String,
    pub lastname: String,
    pub dob: String,
    pub zipcode: String,
}

impl UserFields {
    /// Apply the client's field constraints, plus a calendar check on `dob`
    /// that a pattern alone cannot express.
    pub fn from_record(record: Record) -> Result<Self, Vec<String>> {
        let mut problems: Vec<String> = record
            .violations()
            .iter()
            .map(FieldViolation::to_string)
            .collect();
        if problems.is_empty() && NaiveDate::parse_from_str(&record.dob, "%Y-%m-%d").is_err() {
            problems.push(format!("{} is not a calendar date", Field::Dob.label()));
        }
        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(Self {
            firstname: record.firstname,
            lastname: record.lastname,
            dob: record.dob,
            zipcode: record.zipcode,
        })
    }
}

/// Parse an identifier given as a JSON number or numeric string.
pub fn parse_user_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
