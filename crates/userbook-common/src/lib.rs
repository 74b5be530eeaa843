//! Shared domain types for userbook.
//!
//! The client builds its forms from [`Field`] metadata and the server checks
//! incoming bodies against the same constraints, so both sides agree on what
//! a valid record looks like.

pub mod field;
pub mod record;

pub use field::{Field, FieldViolation, check_value, matches_input_pattern};
pub use record::{Record, RecordId};
