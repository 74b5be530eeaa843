use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named field of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Id,
    FirstName,
    LastName,
    Dob,
    ZipCode,
}

const DOB_PATTERN: &str = r"\d{4}-\d{2}-\d{2}";
const ZIPCODE_PATTERN: &str = r"\d{5}";

// Patterns follow form-input semantics: the whole value must match and `\d`
// is ASCII only.
static DOB_RE: LazyLock<Regex> = LazyLock::new(|| anchored(DOB_PATTERN));
static ZIPCODE_RE: LazyLock<Regex> = LazyLock::new(|| anchored(ZIPCODE_PATTERN));

fn anchored_source(pattern: &str) -> String {
    format!("^(?-u:{})$", pattern)
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&anchored_source(pattern)).expect("field pattern is a valid regex")
}

/// Whole-value match of `value` against an input's `pattern` attribute.
///
/// The field patterns use precompiled regexes. A pattern that does not
/// compile imposes no constraint.
pub fn matches_input_pattern(pattern: &str, value: &str) -> bool {
    match pattern {
        DOB_PATTERN => DOB_RE.is_match(value),
        ZIPCODE_PATTERN => ZIPCODE_RE.is_match(value),
        other => Regex::new(&anchored_source(other)).map_or(true, |re| re.is_match(value)),
    }
}

impl Field {
    /// Every field in form order.
    pub const ALL: [Field; 5] = [
        Field::Id,
        Field::FirstName,
        Field::LastName,
        Field::Dob,
        Field::ZipCode,
    ];

    /// The user-editable attributes, in form order.
    pub const ATTRIBUTES: [Field; 4] = [
        Field::FirstName,
        Field::LastName,
        Field::Dob,
        Field::ZipCode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FirstName => "firstname",
            Self::LastName => "lastname",
            Self::Dob => "dob",
            Self::ZipCode => "zipcode",
        }
    }

    /// Human-readable label used in placeholders and messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Dob => "Date of Birth",
            Self::ZipCode => "Zip Code",
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Id => None,
            Self::FirstName => Some("First Name"),
            Self::LastName => Some("Last Name"),
            Self::Dob => Some("Date of Birth (YYYY-MM-DD)"),
            Self::ZipCode => Some("Zip Code (xxxxx)"),
        }
    }

    /// Validation pattern in input-attribute form (unanchored source text).
    pub fn pattern(&self) -> Option<&'static str> {
        match self {
            Self::Dob => Some(DOB_PATTERN),
            Self::ZipCode => Some(ZIPCODE_PATTERN),
            _ => None,
        }
    }

    /// Whether `value` satisfies this field's pattern. Fields without a
    /// pattern accept anything.
    pub fn matches_pattern(&self, value: &str) -> bool {
        self.pattern()
            .is_none_or(|pattern| matches_input_pattern(pattern, value))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "firstname" => Ok(Self::FirstName),
            "lastname" => Ok(Self::LastName),
            "dob" => Ok(Self::Dob),
            "zipcode" => Ok(Self::ZipCode),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// A single failed constraint on a field, with a message fit for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldViolation {
    #[error("{} is required", .0.label())]
    Missing(Field),

    #[error("{} must look like {}", .0.label(), example_for(.0))]
    Pattern(Field),
}

fn example_for(field: &Field) -> &'static str {
    match field {
        Field::Dob => "YYYY-MM-DD",
        Field::ZipCode => "xxxxx (5 digits)",
        _ => "the expected format",
    }
}

impl FieldViolation {
    /// The field the failed constraint belongs to.
    pub fn field(&self) -> Field {
        match self {
            Self::Missing(field) | Self::Pattern(field) => *field,
        }
    }
}

/// Check a required, possibly patterned value.
///
/// An empty value reports only `Missing`; the pattern is checked only for
/// non-empty values.
pub fn check_value(field: Field, value: &str) -> Result<(), FieldViolation> {
    if value.is_empty() {
        return Err(FieldViolation::Missing(field));
    }
    if !field.matches_pattern(value) {
        return Err(FieldViolation::Pattern(field));
    }
    Ok(())
}
