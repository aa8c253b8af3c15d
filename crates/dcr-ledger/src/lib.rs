//! dcr-ledger
//!
//! Durable `code -> result` ledger for reconciliation runs.
//!
//! The ledger is a single JSON object on disk. Keys are codes, values are
//! either a remote discount identifier or a symbolic status string. The file
//! is valid JSON after every flush; a run that dies between flushes loses only
//! what it had not flushed yet.
//!
//! Writes are structural appends: new entries are spliced in before the
//! closing brace and everything already on disk is left byte-for-byte intact.
//! A key flushed twice is kept twice on disk; readers see the last value.

mod error;
mod writer;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub use error::LedgerError;
pub use writer::{FlushKind, FlushReport, LedgerWriter};

/// Ledger contents: code -> identifier or status string.
pub type LedgerEntries = BTreeMap<String, String>;

/// Parse a ledger file.
///
/// Never fails: a missing, empty, or unparsable file reads as an empty
/// mapping (logged at error level when unparsable). Duplicate keys resolve
/// to the last value written.
pub fn read_ledger(path: impl AsRef<Path>) -> LedgerEntries {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LedgerEntries::new(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "ledger read failed");
            return LedgerEntries::new();
        }
    };

    if raw.trim().is_empty() {
        return LedgerEntries::new();
    }

    match serde_json::from_str::<LedgerEntries>(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "could not decode ledger json");
            LedgerEntries::new()
        }
    }
}
