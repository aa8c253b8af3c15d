//! Authentication mode selection.
//!
//! Two modes, tried in order:
//! 1. delegated app: client id + client secret + access token
//! 2. admin token
//!
//! Selection happens once, when the gateway is built. If neither credential
//! set is complete the run cannot start.

use std::fmt;

use dcr_config::secrets::ResolvedSecrets;
use tracing::{info, warn};

use crate::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    DelegatedApp,
    AdminToken,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::DelegatedApp => "delegated_app",
            AuthMode::AdminToken => "admin_token",
        }
    }
}

/// The credential a gateway sends with every request.
///
/// **Token values are redacted in `Debug` output.**
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    DelegatedApp { client_id: String, access_token: String },
    AdminToken { token: String },
}

impl AuthStrategy {
    /// Prefer the delegated app; fall back to the admin token.
    pub fn select(secrets: &ResolvedSecrets) -> Result<Self, GatewayError> {
        match Self::delegated_app(secrets) {
            Ok(auth) => {
                info!(mode = auth.mode().as_str(), "platform authentication selected");
                Ok(auth)
            }
            Err(e) => {
                warn!(error = %e, "delegated app authentication unavailable; trying admin token");
                let auth = Self::admin_token(secrets)?;
                info!(mode = auth.mode().as_str(), "platform authentication selected");
                Ok(auth)
            }
        }
    }

    fn delegated_app(secrets: &ResolvedSecrets) -> Result<Self, GatewayError> {
        let names = &secrets.env_names;
        match (&secrets.client_id, &secrets.client_secret, &secrets.access_token) {
            (Some(client_id), Some(_), Some(access_token)) => Ok(AuthStrategy::DelegatedApp {
                client_id: client_id.clone(),
                access_token: access_token.clone(),
            }),
            _ => Err(GatewayError::Config(format!(
                "delegated app requires {}, {} and {}",
                names.client_id, names.client_secret, names.access_token
            ))),
        }
    }

    fn admin_token(secrets: &ResolvedSecrets) -> Result<Self, GatewayError> {
        match &secrets.admin_token {
            Some(token) => Ok(AuthStrategy::AdminToken {
                token: token.clone(),
            }),
            None => Err(GatewayError::Config(format!(
                "no platform credentials: set {}, {} and {}, or {}",
                secrets.env_names.client_id,
                secrets.env_names.client_secret,
                secrets.env_names.access_token,
                secrets.env_names.admin_token
            ))),
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            AuthStrategy::DelegatedApp { .. } => AuthMode::DelegatedApp,
            AuthStrategy::AdminToken { .. } => AuthMode::AdminToken,
        }
    }

    /// Value of the access-token header.
    pub(crate) fn access_token(&self) -> &str {
        match self {
            AuthStrategy::DelegatedApp { access_token, .. } => access_token,
            AuthStrategy::AdminToken { token } => token,
        }
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::DelegatedApp { client_id, .. } => f
                .debug_struct("DelegatedApp")
                .field("client_id", client_id)
                .field("access_token", &"<REDACTED>")
                .finish(),
            AuthStrategy::AdminToken { .. } => f
                .debug_struct("AdminToken")
                .field("token", &"<REDACTED>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcr_config::secrets::SecretEnvNames;

    fn secrets(
        client_id: Option<&str>,
        client_secret: Option<&str>,
        access_token: Option<&str>,
        admin_token: Option<&str>,
    ) -> ResolvedSecrets {
        ResolvedSecrets {
            client_id: client_id.map(str::to_string),
            client_secret: client_secret.map(str::to_string),
            access_token: access_token.map(str::to_string),
            admin_token: admin_token.map(str::to_string),
            env_names: SecretEnvNames::default(),
        }
    }

    #[test]
    fn delegated_app_preferred_when_complete() {
        let s = secrets(Some("cid"), Some("csec"), Some("oauth"), Some("admin"));
        let auth = AuthStrategy::select(&s).unwrap();
        assert_eq!(auth.mode(), AuthMode::DelegatedApp);
        assert_eq!(auth.access_token(), "oauth");
    }

    #[test]
    fn partial_delegated_app_falls_back_to_admin_token() {
        let s = secrets(Some("cid"), None, Some("oauth"), Some("admin"));
        let auth = AuthStrategy::select(&s).unwrap();
        assert_eq!(auth.mode(), AuthMode::AdminToken);
        assert_eq!(auth.access_token(), "admin");
    }

    #[test]
    fn no_credentials_is_a_config_error_naming_env_vars() {
        let err = AuthStrategy::select(&secrets(None, None, None, None)).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, GatewayError::Config(_)));
        assert!(msg.contains("SHOPIFY_ADMIN_TOKEN"));
        assert!(msg.contains("SHOPIFY_ACCESS_TOKEN"));
    }

    #[test]
    fn debug_redacts_tokens() {
        let auth = AuthStrategy::AdminToken {
            token: "shpat_supersecret".to_string(),
        };
        let dbg = format!("{auth:?}");
        assert!(!dbg.contains("supersecret"));
        assert!(dbg.contains("REDACTED"));
    }
}
