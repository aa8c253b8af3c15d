//! `dcr summary`: statistics for an existing ledger.

use anyhow::{bail, Result};
use dcr_ledger::read_ledger;
use dcr_reconcile::ProcessingSummary;
use std::path::Path;

pub fn print_summary(ledger: &Path, total: Option<usize>) -> Result<()> {
    if !ledger.exists() {
        bail!("ledger not found: {}", ledger.display());
    }
    let results = read_ledger(ledger);
    let summary = ProcessingSummary::from_results(&results, total.unwrap_or(results.len()));
    println!("{summary}");
    Ok(())
}
