//! dcr-testkit
//!
//! In-memory doubles and fixtures for reconciliation tests.
//!
//! [`ScriptedGateway`] implements [`DiscountGateway`] with a scripted
//! registry and records every call, so tests can assert how often the
//! platform would have been contacted.

mod scripted_gateway;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use dcr_config::{CreationPolicy, EngineSettings};
use dcr_ledger::LedgerWriter;

pub use scripted_gateway::{CreateScript, GatewayCall, ScriptedGateway};

/// Identifier in the platform's global id format.
pub fn discount_gid(n: u64) -> String {
    format!("gid://shopify/DiscountCodeNode/{n}")
}

/// Fresh ledger under `dir` with the default base name and a 3-letter suffix.
pub fn new_ledger(dir: &Path) -> Result<LedgerWriter> {
    LedgerWriter::create(dir, "discount_code_results", 3)
        .with_context(|| format!("create test ledger in {}", dir.display()))
}

/// Engine settings without inter-batch delay.
pub fn engine_settings(
    batch_size: usize,
    save_frequency: usize,
    creation_policy: CreationPolicy,
) -> EngineSettings {
    EngineSettings {
        batch_size,
        save_frequency,
        inter_batch_delay: Duration::ZERO,
        creation_policy,
    }
}
