pub mod flashcards;
pub mod generate;
pub mod images;
pub mod instructions;
pub mod sets;
pub mod study;
pub mod upload;

use crate::error::{ApiError, Result};

/// Parse a required numeric id taken from a query string.
pub(crate) fn require_id(value: Option<&str>, name: &str) -> Result<i64> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))?;

    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("{} must be an integer", name)))
}

/// Non-blank text field of a request body.
pub(crate) fn require_text(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
}
