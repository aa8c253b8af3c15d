use std::fmt;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One element of an input code list, exactly as supplied.
///
/// Inputs come from JSON, so an element is not guaranteed to be a string.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCode(Value);

impl RawCode {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Ledger key used when the input cannot be normalized.
    ///
    /// Strings are trimmed, so blank inputs of any width share the key `""`.
    /// Anything else uses its JSON text (`42`, `null`, ...).
    pub fn label(&self) -> String {
        match &self.0 {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for RawCode {
    fn from(s: &str) -> Self {
        RawCode(Value::String(s.to_string()))
    }
}

impl From<String> for RawCode {
    fn from(s: String) -> Self {
        RawCode(Value::String(s))
    }
}

impl From<Value> for RawCode {
    fn from(v: Value) -> Self {
        RawCode(v)
    }
}

// ---------------------------------------------------------------------------
// Status strings
// ---------------------------------------------------------------------------

/// Symbolic values written to the ledger when a code has no identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CodeStatus {
    Valid,
    NotFound,
    SkippedCreation,
    InvalidFormat,
    CreationFailed,
    Exception,
}

impl CodeStatus {
    pub const ALL: [CodeStatus; 6] = [
        CodeStatus::Valid,
        CodeStatus::NotFound,
        CodeStatus::SkippedCreation,
        CodeStatus::InvalidFormat,
        CodeStatus::CreationFailed,
        CodeStatus::Exception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Valid => "VALID",
            CodeStatus::NotFound => "NO_ID",
            CodeStatus::SkippedCreation => "NO_ID_skipped_creation",
            CodeStatus::InvalidFormat => "NO_ID_invalid_format",
            CodeStatus::CreationFailed => "NO_ID_creation_failed",
            CodeStatus::Exception => "NO_ID_exception",
        }
    }

    pub fn from_ledger_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Classified result of processing one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// An existing or newly created discount matched the code.
    Resolved(String),
    /// No discount exists and creation was not attempted.
    Skipped,
    InvalidFormat,
    /// The create was rejected or could not be confirmed.
    CreationFailed,
    /// Unclassified failure.
    Exception,
}

impl ReconciliationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReconciliationOutcome::Resolved(_))
    }

    pub fn status(&self) -> CodeStatus {
        match self {
            ReconciliationOutcome::Resolved(_) => CodeStatus::Valid,
            ReconciliationOutcome::Skipped => CodeStatus::SkippedCreation,
            ReconciliationOutcome::InvalidFormat => CodeStatus::InvalidFormat,
            ReconciliationOutcome::CreationFailed => CodeStatus::CreationFailed,
            ReconciliationOutcome::Exception => CodeStatus::Exception,
        }
    }

    /// The identifier for `Resolved`, the status string otherwise.
    pub fn ledger_value(&self) -> String {
        match self {
            ReconciliationOutcome::Resolved(id) => id.clone(),
            other => other.status().as_str().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger values read back
// ---------------------------------------------------------------------------

/// A ledger value interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerValue {
    /// Remote discount identifier.
    Id(String),
    Status(CodeStatus),
    /// `NO_ID`-prefixed string this version does not know.
    Unrecognized(String),
}

impl LedgerValue {
    pub fn parse(raw: &str) -> Self {
        if let Some(st) = CodeStatus::from_ledger_str(raw) {
            return LedgerValue::Status(st);
        }
        if raw.is_empty() || raw.starts_with(CodeStatus::NotFound.as_str()) {
            return LedgerValue::Unrecognized(raw.to_string());
        }
        LedgerValue::Id(raw.to_string())
    }

    pub fn is_id(&self) -> bool {
        matches!(self, LedgerValue::Id(_))
    }
}
