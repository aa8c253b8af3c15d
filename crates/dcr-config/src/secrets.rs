//! Runtime credential resolution for the remote discount platform.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `/auth/keys_env/*`.
//! - Callers invoke [`resolve_secrets`] once at startup and hand the result to
//!   the gateway constructor; nothing else reads credentials from the environment.
//! - `Debug` impls redact values. Error messages name env vars, never values.
//!
//! Two credential sets exist, matching the two authentication modes:
//! - delegated app: client id + client secret + OAuth access token
//! - direct admin token
//!
//! Which one is used is decided by the gateway, not here; this module only
//! reports what the environment provides.

use serde_json::Value;

pub const DEFAULT_CLIENT_ID_VAR: &str = "SHOPIFY_CLIENT_ID";
pub const DEFAULT_CLIENT_SECRET_VAR: &str = "SHOPIFY_CLIENT_SECRET";
pub const DEFAULT_ACCESS_TOKEN_VAR: &str = "SHOPIFY_ACCESS_TOKEN";
pub const DEFAULT_ADMIN_TOKEN_VAR: &str = "SHOPIFY_ADMIN_TOKEN";

/// Env var NAMES the credentials are read from. Safe to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEnvNames {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub admin_token: String,
}

impl Default for SecretEnvNames {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID_VAR.to_string(),
            client_secret: DEFAULT_CLIENT_SECRET_VAR.to_string(),
            access_token: DEFAULT_ACCESS_TOKEN_VAR.to_string(),
            admin_token: DEFAULT_ADMIN_TOKEN_VAR.to_string(),
        }
    }
}

/// Credentials resolved from the environment.
///
/// A field is `None` when its env var is unset or blank.
/// **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub admin_token: Option<String>,
    /// Where each value came from, for error messages.
    pub env_names: SecretEnvNames,
}

impl ResolvedSecrets {
    /// All three delegated-app credentials are present.
    pub fn has_delegated_app(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.access_token.is_some()
    }

    pub fn has_admin_token(&self) -> bool {
        self.admin_token.is_some()
    }
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("client_id", &self.client_id.as_ref().map(|_| "<REDACTED>"))
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<REDACTED>"))
            .field("env_names", &self.env_names)
            .finish()
    }
}

/// Read a non-empty string at `pointer`; `None` if absent, not a string, or blank.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Env var names from config, falling back to the well-known defaults.
pub fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    let defaults = SecretEnvNames::default();
    SecretEnvNames {
        client_id: read_str_at(config_json, "/auth/keys_env/client_id")
            .unwrap_or(defaults.client_id),
        client_secret: read_str_at(config_json, "/auth/keys_env/client_secret")
            .unwrap_or(defaults.client_secret),
        access_token: read_str_at(config_json, "/auth/keys_env/access_token")
            .unwrap_or(defaults.access_token),
        admin_token: read_str_at(config_json, "/auth/keys_env/admin_token")
            .unwrap_or(defaults.admin_token),
    }
}

/// Resolve every credential the config points at. Never fails: absence is
/// reported as `None` and judged later by the gateway's auth selection.
pub fn resolve_secrets(config_json: &Value) -> ResolvedSecrets {
    let names = parse_env_names(config_json);
    ResolvedSecrets {
        client_id: resolve_env(&names.client_id),
        client_secret: resolve_env(&names.client_secret),
        access_token: resolve_env(&names.access_token),
        admin_token: resolve_env(&names.admin_token),
        env_names: names,
    }
}
