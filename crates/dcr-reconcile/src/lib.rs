//! dcr-reconcile
//!
//! Reconciliation of discount codes against the remote platform.
//!
//! - `normalizer`: validation and canonical form of a code
//! - `service`: one code through lookup and create-or-skip, classified
//! - `engine`: batches, flush cadence, final read-back from the ledger
//! - `summary`: statistics over a finished ledger
//! - `input`: code list loading
//!
//! Per-code failures never stop a run. Only ledger errors propagate.

mod engine;
mod input;
pub mod normalizer;
mod service;
mod summary;
mod types;

pub use engine::{BatchEngine, BatchRun, RunOutcome, RunPhase};
pub use input::{load_codes, parse_codes};
pub use normalizer::ValidationError;
pub use service::ReconciliationService;
pub use summary::{ProcessingSummary, VALID_ID_BUCKET};
pub use types::*;
