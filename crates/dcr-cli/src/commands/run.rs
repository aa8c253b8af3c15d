//! `dcr run`: reconcile a code list and write a results ledger.

use anyhow::{Context, Result};
use dcr_config::secrets::resolve_secrets;
use dcr_config::{CreationPolicy, UnusedKeyPolicy};
use dcr_gateway::{AuthStrategy, ShopifyGateway};
use dcr_ledger::LedgerWriter;
use dcr_reconcile::{load_codes, BatchEngine, ProcessingSummary};
use std::path::PathBuf;
use std::sync::Arc;

use super::{check_unused_keys, load_config};

pub struct RunArgs {
    pub codes: PathBuf,
    pub config_paths: Vec<String>,
    pub create_missing: bool,
    pub batch_size: Option<u64>,
    pub save_frequency: Option<u64>,
    pub resume: Option<PathBuf>,
    pub strict_config: bool,
}

pub async fn run_reconcile(args: RunArgs) -> Result<()> {
    let loaded = load_config(&args.config_paths)?;
    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    check_unused_keys(&loaded, policy)?;

    let mut settings = loaded.settings()?;
    if let Some(n) = args.batch_size {
        settings.engine.batch_size = n as usize;
    }
    if let Some(n) = args.save_frequency {
        settings.engine.save_frequency = n as usize;
    }
    if args.create_missing {
        settings.engine.creation_policy = CreationPolicy::Create;
    }

    let codes = load_codes(&args.codes)?;
    let total_codes = codes.len();

    let secrets = resolve_secrets(&loaded.config_json);
    let auth = AuthStrategy::select(&secrets).context("select platform authentication")?;
    let gateway = ShopifyGateway::new(&settings.gateway, settings.discount.clone(), auth)
        .context("build platform gateway")?;

    let mut ledger = match &args.resume {
        Some(path) => LedgerWriter::resume(path)?,
        None => LedgerWriter::create(
            &settings.ledger.dir,
            &settings.ledger.base_filename,
            settings.ledger.suffix_len,
        )?,
    };

    let engine = BatchEngine::new(Arc::new(gateway), settings.engine.clone());
    let outcome = engine
        .run(codes, &mut ledger)
        .await
        .context("reconciliation run aborted: ledger failure")?;

    println!("config_hash={}", loaded.config_hash);
    println!("ledger_path={}", outcome.ledger_path.display());
    println!(
        "processed={} successful={} carried_over={} duplicates={} flushes={}",
        outcome.processed,
        outcome.successful,
        outcome.carried_over,
        outcome.duplicates,
        outcome.flushes
    );
    if !outcome.missing.is_empty() {
        eprintln!("WARN: MISSING_CODES count={}", outcome.missing.len());
    }

    let summary = ProcessingSummary::from_results(&outcome.results, total_codes);
    summary.log();
    println!("{summary}");

    Ok(())
}
