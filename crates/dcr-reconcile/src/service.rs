//! Per-code reconciliation: normalize, look up, create or skip, classify.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dcr_config::CreationPolicy;
use dcr_gateway::{CreateFailure, DiscountGateway};
use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::{normalizer, RawCode, ReconciliationOutcome};

#[derive(Clone)]
pub struct ReconciliationService {
    gateway: Arc<dyn DiscountGateway>,
    policy: CreationPolicy,
}

impl std::fmt::Debug for ReconciliationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationService")
            .field("gateway", &self.gateway.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ReconciliationService {
    pub fn new(gateway: Arc<dyn DiscountGateway>, policy: CreationPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> CreationPolicy {
        self.policy
    }

    /// Classify one input. Never fails: every path yields `(ledger key, outcome)`,
    /// including a panic inside the gateway.
    pub async fn ensure_exists(&self, raw: &RawCode) -> (String, ReconciliationOutcome) {
        match AssertUnwindSafe(self.classify(raw)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let label = normalizer::ledger_key(raw);
                error!(
                    code = %label,
                    error = %panic_message(payload.as_ref()),
                    "unexpected error processing code"
                );
                (label, ReconciliationOutcome::Exception)
            }
        }
    }

    async fn classify(&self, raw: &RawCode) -> (String, ReconciliationOutcome) {
        let code = match normalizer::clean(raw) {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "skipping invalid code");
                return (e.label, ReconciliationOutcome::InvalidFormat);
            }
        };

        if let Some(id) = self.gateway.find(&code).await {
            return (code, ReconciliationOutcome::Resolved(id));
        }

        let outcome = match self.policy {
            CreationPolicy::Skip => {
                info!(code = %code, "no discount found; creation skipped by policy");
                ReconciliationOutcome::Skipped
            }
            CreationPolicy::Create => self.create(&code).await,
        };
        (code, outcome)
    }

    async fn create(&self, code: &str) -> ReconciliationOutcome {
        match self.gateway.create(code, code).await {
            Ok(Some(id)) => ReconciliationOutcome::Resolved(id),
            Ok(None) => {
                warn!(code = %code, "create could not be confirmed");
                ReconciliationOutcome::CreationFailed
            }
            Err(CreateFailure::Rejected(errors)) => {
                let reasons: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                warn!(code = %code, errors = %reasons.join("; "), "create rejected");
                ReconciliationOutcome::CreationFailed
            }
            Err(CreateFailure::Unclassified(msg)) => {
                error!(code = %code, error = %msg, "unexpected error creating code");
                ReconciliationOutcome::Exception
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
