use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::field::{Field, FieldViolation, check_value};

/// Server-assigned record identifier.
///
/// Opaque to the client: it is carried as text in the hidden `id` input and
/// decoded from either a JSON string or a JSON number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_string(deserializer).map(RecordId)
    }
}

/// One user entity as exchanged with the collection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub firstname: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lastname: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dob: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub zipcode: String,
}

impl Record {
    pub fn new(
        id: impl Into<RecordId>,
        firstname: &str,
        lastname: &str,
        dob: &str,
        zipcode: &str,
    ) -> Self {
        Self {
            id: id.into(),
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            dob: dob.to_string(),
            zipcode: zipcode.to_string(),
        }
    }

    /// The text value of `field`.
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Id => self.id.as_str(),
            Field::FirstName => &self.firstname,
            Field::LastName => &self.lastname,
            Field::Dob => &self.dob,
            Field::ZipCode => &self.zipcode,
        }
    }

    /// Check every attribute, returning all violations in form order.
    pub fn violations(&self) -> Vec<FieldViolation> {
        Field::ATTRIBUTES
            .iter()
            .filter_map(|field| check_value(*field, self.value(*field)).err())
            .collect()
    }
}

/// Deserialize a string from a JSON string, number, bool or null.
///
/// Older servers store zip codes as integers and ids are numeric, so the
/// client accepts either and keeps the text form.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientString;

    impl Visitor<'_> for LenientString {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(LenientString)
}
