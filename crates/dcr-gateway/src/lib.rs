//! dcr-gateway
//!
//! Boundary to the remote discount platform.
//!
//! [`DiscountGateway`] is the only thing the reconciliation service knows
//! about the platform: look a code up, create a code. Both calls absorb
//! transport and platform failures and report them as absence, so one bad
//! request never aborts a run. Failures the caller must tell apart come back
//! as [`CreateFailure`].
//!
//! [`ShopifyGateway`] is the production implementation (GraphQL Admin API
//! over reqwest). Test doubles live in `dcr-testkit`.

mod auth;
mod error;
mod graphql;
mod shopify;

use std::fmt;

use serde::Deserialize;

pub use auth::{AuthMode, AuthStrategy};
pub use error::GatewayError;
pub use graphql::{GraphqlRequest, CREATE_DISCOUNT_MUTATION, FIND_DISCOUNT_QUERY};
pub use shopify::ShopifyGateway;

// ---------------------------------------------------------------------------
// Create failures
// ---------------------------------------------------------------------------

/// Validation error reported by the platform for a create request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    /// Path of the offending input field, when the platform names one.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(path) if !path.is_empty() => write!(f, "{}: {}", path.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// A create that did not end in "created" or "absent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateFailure {
    /// The platform refused the create and said why.
    Rejected(Vec<UserError>),
    /// The platform answered with something that could not be interpreted.
    Unclassified(String),
}

impl fmt::Display for CreateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateFailure::Rejected(errors) => {
                let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "create rejected: {}", joined.join("; "))
            }
            CreateFailure::Unclassified(msg) => write!(f, "unclassified create failure: {msg}"),
        }
    }
}

impl std::error::Error for CreateFailure {}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Remote discount platform contract.
///
/// Codes passed in are already normalized. Implementations must be
/// `Send + Sync`; the service holds them behind `Arc<dyn DiscountGateway>`.
#[async_trait::async_trait]
pub trait DiscountGateway: Send + Sync {
    /// Short name for logs (e.g. `"shopify"`).
    fn name(&self) -> &'static str;

    /// Identifier of the discount registered under `code`, if any.
    ///
    /// Transport and platform failures are logged and reported as `None`.
    async fn find(&self, code: &str) -> Option<String>;

    /// Create a discount for `code` and return its identifier.
    ///
    /// `Ok(None)` means the create could not be confirmed: the request
    /// failed, or it succeeded without an identifier and one recovery lookup
    /// found nothing either.
    async fn create(&self, code: &str, title: &str) -> Result<Option<String>, CreateFailure>;
}
