//! Field rules for boats and loads.
//!
//! The same rules run on create, full replace, and on the merged result of a
//! partial update, so an entity can never be stored with a value that would
//! have been rejected on the way in.

use crate::error::ValidationError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const LABEL_MAX_CHARS: usize = 50;
pub const CONTENT_MAX_CHARS: usize = 100;
pub const BOAT_LENGTH_MIN: i64 = 1;
pub const BOAT_LENGTH_MAX: i64 = 2000;
pub const LOAD_WEIGHT_MIN: i64 = 1;
pub const LOAD_WEIGHT_MAX: i64 = 100_000;
pub const DELIVERY_DATE_FORMAT: &str = "%Y-%m-%d";

static LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 ]+$").expect("Invalid label regex"));

static CONTENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 ,.'-]+$").expect("Invalid content regex"));

/// Unwrap a required field or report it as missing.
pub fn require<T>(field: &str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::missing(field))
}

/// Boat `name` and `type`: 1-50 letters, digits and spaces, not blank.
pub fn validate_label(field: &str, value: &str) -> Result<(), ValidationError> {
    let chars = value.chars().count();
    if chars == 0 || chars > LABEL_MAX_CHARS {
        return Err(ValidationError::invalid(
            field,
            format!("must be 1 to {} characters", LABEL_MAX_CHARS),
        ));
    }
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(field, "must not be blank"));
    }
    if !LABEL_PATTERN.is_match(value) {
        return Err(ValidationError::invalid(
            field,
            "may only contain letters, digits and spaces",
        ));
    }
    Ok(())
}

pub fn validate_content(value: &str) -> Result<(), ValidationError> {
    let chars = value.chars().count();
    if chars == 0 || chars > CONTENT_MAX_CHARS {
        return Err(ValidationError::invalid(
            "content",
            format!("must be 1 to {} characters", CONTENT_MAX_CHARS),
        ));
    }
    if value.trim().is_empty() {
        return Err(ValidationError::invalid("content", "must not be blank"));
    }
    if !CONTENT_PATTERN.is_match(value) {
        return Err(ValidationError::invalid(
            "content",
            "may only contain letters, digits, spaces and , . ' -",
        ));
    }
    Ok(())
}

fn validate_range(field: &str, value: i64, min: i64, max: i64) -> Result<u32, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max,
    })
}

pub fn validate_boat_length(value: i64) -> Result<u32, ValidationError> {
    validate_range("length", value, BOAT_LENGTH_MIN, BOAT_LENGTH_MAX)
}

pub fn validate_weight(value: i64) -> Result<u32, ValidationError> {
    validate_range("weight", value, LOAD_WEIGHT_MIN, LOAD_WEIGHT_MAX)
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_delivery_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, DELIVERY_DATE_FORMAT).map_err(|_| {
        ValidationError::invalid("delivery_date", "must be a calendar date in YYYY-MM-DD form")
    })
}

/// Parse the textual form of a boolean flag (`"true"` / `"false"`).
pub fn parse_flag(field: &str, value: &str) -> Result<bool, ValidationError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValidationError::invalid(field, "must be true or false")),
    }
}
