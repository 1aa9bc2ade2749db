//! Identifier validation shared by tables, columns, keys and schemas.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{TabulaError, TabulaResult};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern compiles"));

/// Whether `name` is non-empty and only uses letters, digits, `_` and `-`.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Validate an identifier, returning it owned on success.
pub fn validate_name(name: &str) -> TabulaResult<String> {
    if is_valid_name(name) {
        Ok(name.to_string())
    } else {
        Err(TabulaError::InvalidName(name.to_string()))
    }
}
