//! Code validation and canonical form.

use std::fmt;

use crate::RawCode;

/// The input is not a string with non-whitespace content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub label: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid code format: {:?}", self.label)
    }
}

impl std::error::Error for ValidationError {}

pub fn is_valid(raw: &RawCode) -> bool {
    raw.as_str().is_some_and(|s| !s.trim().is_empty())
}

/// Trimmed code. Case is preserved.
pub fn clean(raw: &RawCode) -> Result<String, ValidationError> {
    match raw.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ValidationError { label: raw.label() }),
    }
}

/// Key the input will be recorded under: the cleaned code, or its label.
pub fn ledger_key(raw: &RawCode) -> String {
    clean(raw).unwrap_or_else(|e| e.label)
}
