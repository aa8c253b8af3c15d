//! Post-run statistics over ledger contents.

use std::collections::BTreeMap;
use std::fmt;

use dcr_ledger::LedgerEntries;
use tracing::info;

use crate::{CodeStatus, LedgerValue};

/// Breakdown bucket for entries holding a remote identifier.
pub const VALID_ID_BUCKET: &str = "VALID_ID";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSummary {
    pub total_codes: usize,
    pub total_processed: usize,
    pub with_ids: usize,
    /// Count per status string; identifiers are counted under [`VALID_ID_BUCKET`].
    pub by_status: BTreeMap<String, usize>,
}

impl ProcessingSummary {
    pub fn from_results(results: &LedgerEntries, total_codes: usize) -> Self {
        let mut by_status = BTreeMap::new();
        let mut with_ids = 0usize;
        for value in results.values() {
            let bucket = match LedgerValue::parse(value) {
                LedgerValue::Id(_) | LedgerValue::Status(CodeStatus::Valid) => {
                    with_ids += 1;
                    VALID_ID_BUCKET.to_string()
                }
                LedgerValue::Status(st) => st.as_str().to_string(),
                LedgerValue::Unrecognized(s) => s,
            };
            *by_status.entry(bucket).or_insert(0) += 1;
        }
        Self {
            total_codes,
            total_processed: results.len(),
            with_ids,
            by_status,
        }
    }

    /// Percentage of processed codes that have an identifier.
    pub fn success_rate(&self) -> Option<f64> {
        (self.total_processed > 0)
            .then(|| self.with_ids as f64 / self.total_processed as f64 * 100.0)
    }

    pub fn log(&self) {
        info!(
            total_codes = self.total_codes,
            total_processed = self.total_processed,
            with_ids = self.with_ids,
            "processing summary"
        );
        if let Some(rate) = self.success_rate() {
            info!(rate = format_args!("{rate:.1}%"), "success rate");
        }
        for (status, count) in &self.by_status {
            info!(status = %status, count, "status breakdown");
        }
    }
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "PROCESSING SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total codes provided: {}", self.total_codes)?;
        writeln!(f, "Total codes processed: {}", self.total_processed)?;
        writeln!(f, "Codes with valid IDs: {}", self.with_ids)?;
        if let Some(rate) = self.success_rate() {
            writeln!(f, "Success rate: {rate:.1}%")?;
        }
        writeln!(f, "Status breakdown:")?;
        for (status, count) in &self.by_status {
            writeln!(f, "  {status}: {count}")?;
        }
        write!(f, "{rule}")
    }
}
