//! Typed settings read from the merged config JSON.
//!
//! Every knob has a default, so an empty config is a valid config. Present
//! values of the wrong type or out of range are rejected with the offending
//! pointer in the message.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 15;
pub const DEFAULT_SAVE_FREQUENCY: usize = 3;
pub const DEFAULT_DISCOUNT_PERCENTAGE: f64 = 0.10;
pub const DEFAULT_STARTS_AT: &str = "2025-01-01T00:00:00Z";
pub const DEFAULT_API_VERSION: &str = "2025-04";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BASE_FILENAME: &str = "discount_code_results";
pub const DEFAULT_SUFFIX_LEN: usize = 3;

/// What to do when a code has no remote discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreationPolicy {
    /// Record the code as skipped; never call create.
    #[default]
    Skip,
    /// Attempt exactly one remote create.
    Create,
}

impl CreationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationPolicy::Skip => "skip",
            CreationPolicy::Create => "create",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(CreationPolicy::Skip),
            "create" => Ok(CreationPolicy::Create),
            other => bail!("invalid creation_policy '{}'. expected one of: skip | create", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub batch_size: usize,
    /// Flush the accumulator every N batches.
    pub save_frequency: usize,
    /// Fixed pause between batches (rate limiting). Zero disables it.
    pub inter_batch_delay: Duration,
    pub creation_policy: CreationPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            save_frequency: DEFAULT_SAVE_FREQUENCY,
            inter_batch_delay: Duration::ZERO,
            creation_policy: CreationPolicy::Skip,
        }
    }
}

/// Values applied to newly created discounts.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountDefaults {
    /// Fraction in (0, 1], e.g. 0.10 for ten percent off.
    pub percentage: f64,
    pub starts_at: DateTime<Utc>,
}

impl Default for DiscountDefaults {
    fn default() -> Self {
        Self {
            percentage: DEFAULT_DISCOUNT_PERCENTAGE,
            starts_at: DateTime::parse_from_rfc3339(DEFAULT_STARTS_AT)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    /// e.g. `example.myshopify.com`. Only required when talking to the platform.
    pub shop_domain: Option<String>,
    /// Origin overriding `https://{shop_domain}` (proxies, local mocks).
    pub base_url: Option<String>,
    pub api_version: String,
    /// Pause before the single identifier-recovery lookup after a create.
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            shop_domain: None,
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSettings {
    pub dir: PathBuf,
    pub base_filename: String,
    pub suffix_len: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            base_filename: DEFAULT_BASE_FILENAME.to_string(),
            suffix_len: DEFAULT_SUFFIX_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub discount: DiscountDefaults,
    pub gateway: GatewaySettings,
    pub ledger: LedgerSettings,
}

impl Settings {
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let mut s = Settings::default();

        if let Some(n) = read_u64(cfg, "/engine/batch_size")? {
            s.engine.batch_size = positive(n, "/engine/batch_size")?;
        }
        if let Some(n) = read_u64(cfg, "/engine/save_frequency")? {
            s.engine.save_frequency = positive(n, "/engine/save_frequency")?;
        }
        if let Some(ms) = read_u64(cfg, "/engine/inter_batch_delay_ms")? {
            s.engine.inter_batch_delay = Duration::from_millis(ms);
        }
        if let Some(p) = read_str(cfg, "/engine/creation_policy")? {
            s.engine.creation_policy = CreationPolicy::parse(&p)?;
        }

        if let Some(v) = cfg.pointer("/discount/percentage") {
            let Some(p) = v.as_f64() else {
                bail!("CONFIG_INVALID /discount/percentage: expected a number");
            };
            if !(p > 0.0 && p <= 1.0) {
                bail!("CONFIG_INVALID /discount/percentage: {} is outside (0, 1]", p);
            }
            s.discount.percentage = p;
        }
        if let Some(raw) = read_str(cfg, "/discount/starts_at")? {
            let Ok(dt) = DateTime::parse_from_rfc3339(&raw) else {
                bail!("CONFIG_INVALID /discount/starts_at: '{}' is not RFC 3339", raw);
            };
            s.discount.starts_at = dt.with_timezone(&Utc);
        }

        s.gateway.shop_domain = read_str(cfg, "/gateway/shop_domain")?;
        s.gateway.base_url = read_str(cfg, "/gateway/base_url")?;
        if let Some(v) = read_str(cfg, "/gateway/api_version")? {
            s.gateway.api_version = v;
        }
        if let Some(ms) = read_u64(cfg, "/gateway/retry_delay_ms")? {
            s.gateway.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_u64(cfg, "/gateway/request_timeout_ms")? {
            let ms = positive(ms, "/gateway/request_timeout_ms")? as u64;
            s.gateway.request_timeout = Duration::from_millis(ms);
        }

        if let Some(dir) = read_str(cfg, "/ledger/dir")? {
            s.ledger.dir = PathBuf::from(dir);
        }
        if let Some(name) = read_str(cfg, "/ledger/base_filename")? {
            s.ledger.base_filename = name;
        }
        if let Some(n) = read_u64(cfg, "/ledger/suffix_len")? {
            s.ledger.suffix_len = positive(n, "/ledger/suffix_len")?;
        }

        Ok(s)
    }
}

fn read_u64(cfg: &Value, pointer: &str) -> Result<Option<u64>> {
    match cfg.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID {}: expected a non-negative integer, got {}", pointer, v),
        },
    }
}

/// Blank strings count as absent.
fn read_str(cfg: &Value, pointer: &str) -> Result<Option<String>> {
    match cfg.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(other) => bail!("CONFIG_INVALID {}: expected a string, got {}", pointer, other),
    }
}

fn positive(n: u64, pointer: &str) -> Result<usize> {
    if n == 0 {
        bail!("CONFIG_INVALID {}: must be at least 1", pointer);
    }
    Ok(n as usize)
}
