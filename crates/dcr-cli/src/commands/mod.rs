//! Command handler modules for dcr-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod run;
pub mod summary;

use anyhow::Result;
use dcr_config::{report_unused_keys, LoadedConfig, UnusedKeyPolicy};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Maximum unused pointers printed before eliding the rest.
const UNUSED_KEYS_SHOWN: usize = 50;

/// Merge config layers in order. No paths means defaults only.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    dcr_config::load_layered_yaml(&path_refs)
}

/// Report config keys nothing reads. `Fail` turns a non-empty report into an error.
pub fn check_unused_keys(loaded: &LoadedConfig, policy: UnusedKeyPolicy) -> Result<()> {
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if report.is_clean() {
        return Ok(());
    }

    eprintln!(
        "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
        report.unused_leaf_pointers.len()
    );
    for p in report.unused_leaf_pointers.iter().take(UNUSED_KEYS_SHOWN) {
        eprintln!("  unused={}", p);
    }
    let extra = report
        .unused_leaf_pointers
        .len()
        .saturating_sub(UNUSED_KEYS_SHOWN);
    if extra > 0 {
        eprintln!("  ... and {} more", extra);
    }
    Ok(())
}
