//! Batch engine: drives a code list through the service and the ledger.
//!
//! A run moves `Idle -> Processing(batch) -> ... -> Finalizing -> Done`.
//! Batches run sequentially. The accumulator is flushed every
//! `save_frequency` batches and once more at the end; a run that stops early
//! loses at most the entries gathered since the last flush.
//!
//! The value a run returns is re-read from the ledger file, never taken from
//! memory.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use dcr_config::EngineSettings;
use dcr_gateway::DiscountGateway;
use dcr_ledger::{FlushKind, LedgerEntries, LedgerError, LedgerWriter};
use tracing::{debug, info, warn};

use crate::{normalizer, LedgerValue, RawCode, ReconciliationService};

/// Number of missing codes printed when the final ledger lacks some inputs.
const MISSING_SAMPLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    /// 1-based number of the batch processed last.
    Processing { batch: usize },
    Finalizing,
    Done,
}

/// What a finished run reports. `results` is the ledger as it is on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub ledger_path: PathBuf,
    pub results: LedgerEntries,
    /// Distinct codes accounted for this run (processed + carried over).
    pub processed: usize,
    /// Codes that ended with an identifier, carried-over ones included.
    pub successful: usize,
    /// Codes already resolved in the ledger before the run started.
    pub carried_over: usize,
    /// Inputs not processed because their key was already taken: a repeated
    /// code, or an invalid input whose label matches a code handled this run
    /// or resolved before it.
    pub duplicates: usize,
    /// Flushes that wrote entries.
    pub flushes: usize,
    /// Input keys absent from the final ledger. Empty after a complete run
    /// unless persistence misbehaved.
    pub missing: Vec<String>,
}

impl RunOutcome {
    pub fn success_rate(&self) -> Option<f64> {
        (self.processed > 0).then(|| self.successful as f64 / self.processed as f64 * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct BatchEngine {
    service: ReconciliationService,
    settings: EngineSettings,
}

impl BatchEngine {
    /// The service applies `settings.creation_policy`. `batch_size` and
    /// `save_frequency` of zero are treated as one.
    pub fn new(gateway: Arc<dyn DiscountGateway>, mut settings: EngineSettings) -> Self {
        settings.batch_size = settings.batch_size.max(1);
        settings.save_frequency = settings.save_frequency.max(1);
        let service = ReconciliationService::new(gateway, settings.creation_policy);
        Self { service, settings }
    }

    pub fn service(&self) -> &ReconciliationService {
        &self.service
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Begin a run over `codes`, writing to `ledger`.
    ///
    /// Codes the ledger already maps to an identifier are carried over: they
    /// are not looked up again and not rewritten.
    pub fn start<'a>(&'a self, codes: Vec<RawCode>, ledger: &'a mut LedgerWriter) -> BatchRun<'a> {
        let carried: BTreeSet<String> = ledger
            .read_all()
            .into_iter()
            .filter(|(_, v)| LedgerValue::parse(v).is_id())
            .map(|(k, _)| k)
            .collect();

        let batches_total = codes.len().div_ceil(self.settings.batch_size);

        info!(
            codes = codes.len(),
            batch_size = self.settings.batch_size,
            save_frequency = self.settings.save_frequency,
            batches = batches_total,
            policy = self.settings.creation_policy.as_str(),
            "starting to process discount codes"
        );
        info!(path = %ledger.path().display(), "results will be saved to ledger");
        if !carried.is_empty() {
            info!(resolved = carried.len(), "ledger already holds resolved codes; they will be carried over");
        }

        BatchRun {
            engine: self,
            ledger,
            codes,
            batches_total,
            next_batch: 0,
            phase: RunPhase::Idle,
            accumulator: LedgerEntries::new(),
            seen_codes: BTreeSet::new(),
            invalid_labels: BTreeSet::new(),
            carried,
            processed: 0,
            successful: 0,
            carried_over: 0,
            duplicates: 0,
            flushes: 0,
        }
    }

    /// Process every batch and finalize.
    pub async fn run(
        &self,
        codes: Vec<RawCode>,
        ledger: &mut LedgerWriter,
    ) -> Result<RunOutcome, LedgerError> {
        let mut run = self.start(codes, ledger);
        while run.step().await? {}
        run.finish()
    }
}

/// One run in progress. Owns the accumulator; borrows the ledger exclusively.
///
/// Dropping a run without calling [`BatchRun::finish`] leaves the ledger with
/// every flush made so far and nothing from the accumulator.
#[derive(Debug)]
pub struct BatchRun<'a> {
    engine: &'a BatchEngine,
    ledger: &'a mut LedgerWriter,
    codes: Vec<RawCode>,
    batches_total: usize,
    next_batch: usize,
    phase: RunPhase,
    accumulator: LedgerEntries,
    /// Clean codes already handled this run.
    seen_codes: BTreeSet<String>,
    /// Labels recorded for invalid inputs and not yet taken over by a code.
    invalid_labels: BTreeSet<String>,
    /// Keys resolved in the ledger before the run started.
    carried: BTreeSet<String>,
    processed: usize,
    successful: usize,
    carried_over: usize,
    duplicates: usize,
    flushes: usize,
}

impl BatchRun<'_> {
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn batches_total(&self) -> usize {
        self.batches_total
    }

    /// Entries gathered since the last flush.
    pub fn pending(&self) -> &LedgerEntries {
        &self.accumulator
    }

    /// Process the next batch, flushing if the save cadence is reached.
    ///
    /// Returns `false` when there was no batch left to process.
    pub async fn step(&mut self) -> Result<bool, LedgerError> {
        if self.next_batch >= self.batches_total
            || matches!(self.phase, RunPhase::Finalizing | RunPhase::Done)
        {
            return Ok(false);
        }

        let size = self.engine.settings.batch_size;
        let start = self.next_batch * size;
        let end = (start + size).min(self.codes.len());
        let batch_num = self.next_batch + 1;
        self.phase = RunPhase::Processing { batch: batch_num };

        let mut batch_done = 0usize;
        let mut batch_success = 0usize;
        for idx in start..end {
            let raw = self.codes[idx].clone();
            let key = normalizer::ledger_key(&raw);
            if !self.claim(&raw, &key) {
                debug!(code = %key, "duplicate input; already handled this run");
                self.duplicates += 1;
                continue;
            }

            batch_done += 1;
            if self.carried.contains(&key) {
                debug!(code = %key, "already resolved in ledger; carried over");
                self.carried_over += 1;
                batch_success += 1;
                continue;
            }

            let (code, outcome) = self.engine.service.ensure_exists(&raw).await;
            if outcome.is_success() {
                batch_success += 1;
            }
            self.accumulator.insert(code, outcome.ledger_value());
        }

        self.successful += batch_success;
        self.next_batch += 1;
        self.log_batch_complete(batch_num, batch_done, batch_success);

        if batch_num % self.engine.settings.save_frequency == 0 && !self.accumulator.is_empty() {
            info!(
                entries = self.accumulator.len(),
                batch = batch_num,
                "saving accumulated results"
            );
            self.flush(FlushKind::Interim)?;
        }

        let delay = self.engine.settings.inter_batch_delay;
        if self.next_batch < self.batches_total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(true)
    }

    /// Flush what remains, re-read the ledger, and report.
    ///
    /// Batches not yet stepped through are not processed. A failed final
    /// flush leaves the run in `Finalizing` with the accumulator intact.
    pub fn finish(&mut self) -> Result<RunOutcome, LedgerError> {
        self.phase = RunPhase::Finalizing;

        if !self.accumulator.is_empty() {
            info!(entries = self.accumulator.len(), "saving remaining accumulated results");
            self.flush(FlushKind::Final)?;
        }

        let results = self.ledger.read_all();
        let expected: BTreeSet<String> = self.codes.iter().map(normalizer::ledger_key).collect();
        let missing: Vec<String> = expected
            .into_iter()
            .filter(|k| !results.contains_key(k))
            .collect();

        info!(total_results = results.len(), "processing complete");
        if self.processed > 0 {
            info!(
                successful = self.successful,
                processed = self.processed,
                pct = format_args!("{:.1}", self.successful as f64 / self.processed as f64 * 100.0),
                "success rate"
            );
        }
        if !missing.is_empty() {
            let sample: Vec<&str> = missing.iter().take(MISSING_SAMPLE).map(String::as_str).collect();
            warn!(missing = missing.len(), sample = ?sample, "missing codes detected");
        }

        self.phase = RunPhase::Done;
        Ok(RunOutcome {
            ledger_path: self.ledger.path().to_path_buf(),
            results,
            processed: self.processed,
            successful: self.successful,
            carried_over: self.carried_over,
            duplicates: self.duplicates,
            flushes: self.flushes,
            missing,
        })
    }

    /// Decide whether `raw` is processed, updating the per-run key sets.
    ///
    /// Valid codes dedupe among themselves and take over a key first used by
    /// an invalid input, whose entry they then supersede. An invalid input
    /// never displaces a code handled this run or resolved before it.
    fn claim(&mut self, raw: &RawCode, key: &str) -> bool {
        if normalizer::is_valid(raw) {
            if !self.seen_codes.insert(key.to_string()) {
                return false;
            }
            if self.invalid_labels.remove(key) {
                debug!(code = %key, "code supersedes an invalid input with the same label");
            } else {
                self.processed += 1;
            }
            return true;
        }

        if self.seen_codes.contains(key) || self.carried.contains(key) {
            return false;
        }
        if !self.invalid_labels.insert(key.to_string()) {
            return false;
        }
        self.processed += 1;
        true
    }

    fn flush(&mut self, kind: FlushKind) -> Result<(), LedgerError> {
        self.ledger.flush(&self.accumulator, kind)?;
        self.accumulator.clear();
        self.flushes += 1;
        Ok(())
    }

    fn log_batch_complete(&self, batch_num: usize, batch_done: usize, batch_success: usize) {
        let pct = if self.processed > 0 {
            self.successful as f64 / self.processed as f64 * 100.0
        } else {
            0.0
        };
        info!(
            batch = batch_num,
            of = self.batches_total,
            processed = self.processed,
            total = self.codes.len(),
            batch_success = format_args!("{batch_success}/{batch_done}"),
            overall = format_args!("{}/{} ({pct:.1}%)", self.successful, self.processed),
            "batch complete"
        );
    }
}
