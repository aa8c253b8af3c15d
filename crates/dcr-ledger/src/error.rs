use std::fmt;
use std::io;
use std::path::PathBuf;

/// Persistence failures. These are the only errors a reconciliation run
/// propagates: without a working ledger nothing it does is durable.
#[derive(Debug)]
pub enum LedgerError {
    /// The ledger file (or its directory) could not be created.
    Create { path: PathBuf, source: io::Error },
    /// An existing ledger could not be read back for appending or resuming.
    Read { path: PathBuf, source: io::Error },
    /// Entries could not be written or synced to disk.
    Write { path: PathBuf, source: io::Error },
    /// A ledger offered for resume is not a JSON object of strings.
    Corrupt { path: PathBuf, reason: String },
    /// Entries could not be rendered as JSON.
    Encode(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Create { path, source } => {
                write!(f, "ledger create failed: {}: {source}", path.display())
            }
            LedgerError::Read { path, source } => {
                write!(f, "ledger read failed: {}: {source}", path.display())
            }
            LedgerError::Write { path, source } => {
                write!(f, "ledger write failed: {}: {source}", path.display())
            }
            LedgerError::Corrupt { path, reason } => {
                write!(f, "ledger is corrupt: {}: {reason}", path.display())
            }
            LedgerError::Encode(msg) => write!(f, "ledger encode failed: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Create { source, .. }
            | LedgerError::Read { source, .. }
            | LedgerError::Write { source, .. } => Some(source),
            LedgerError::Corrupt { .. } | LedgerError::Encode(_) => None,
        }
    }
}
