use std::time::Duration;

use dcr_config::{DiscountDefaults, GatewaySettings};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::graphql::{CreateData, CreatePayload, FindData, GraphqlRequest, GraphqlResponse};
use crate::{AuthStrategy, CreateFailure, DiscountGateway, GatewayError};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Longest slice of an error body kept in a [`GatewayError::Http`].
const MAX_ERROR_BODY: usize = 512;

/// Shopify Admin GraphQL gateway.
#[derive(Debug)]
pub struct ShopifyGateway {
    http: reqwest::Client,
    endpoint: String,
    auth: AuthStrategy,
    discount: DiscountDefaults,
    retry_delay: Duration,
}

impl ShopifyGateway {
    /// Gateway for `https://{shop_domain}`, or `settings.base_url` when set.
    pub fn new(
        settings: &GatewaySettings,
        discount: DiscountDefaults,
        auth: AuthStrategy,
    ) -> Result<Self, GatewayError> {
        let base_url = match (&settings.base_url, &settings.shop_domain) {
            (Some(url), _) => url.clone(),
            (None, Some(shop)) => format!("https://{shop}"),
            (None, None) => {
                return Err(GatewayError::Config(
                    "gateway.shop_domain is required to reach the platform".to_string(),
                ))
            }
        };
        Self::new_with_base_url(base_url, settings, discount, auth)
    }

    /// Same as [`ShopifyGateway::new`] against an explicit origin (tests, proxies).
    pub fn new_with_base_url(
        base_url: String,
        settings: &GatewaySettings,
        discount: DiscountDefaults,
        auth: AuthStrategy,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("http client: {e}")))?;
        let endpoint = format!(
            "{}/admin/api/{}/graphql.json",
            base_url.trim_end_matches('/'),
            settings.api_version
        );
        info!(endpoint = %endpoint, mode = auth.mode().as_str(), "shopify gateway ready");
        Ok(Self {
            http,
            endpoint,
            auth,
            discount,
            retry_delay: settings.retry_delay,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: &GraphqlRequest,
    ) -> Result<GraphqlResponse<T>, GatewayError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.auth.access_token())
            .json(req)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Lookup with the failure kept visible.
    pub async fn try_find(&self, code: &str) -> Result<Option<String>, GatewayError> {
        let resp: GraphqlResponse<FindData> = self.execute(&GraphqlRequest::find(code)).await?;
        if let Some(msg) = resp.error_message() {
            return Err(GatewayError::Api(msg));
        }
        Ok(resp.data.and_then(FindData::id))
    }

    async fn try_create(&self, code: &str, title: &str) -> Result<CreatePayload, GatewayError> {
        let req = GraphqlRequest::create(code, title, &self.discount);
        let resp: GraphqlResponse<CreateData> = self.execute(&req).await?;
        if let Some(msg) = resp.error_message() {
            return Err(GatewayError::Api(msg));
        }
        // A missing payload is treated like a create that returned no id.
        Ok(resp
            .data
            .and_then(|d| d.discount_code_basic_create)
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl DiscountGateway for ShopifyGateway {
    fn name(&self) -> &'static str {
        "shopify"
    }

    async fn find(&self, code: &str) -> Option<String> {
        match self.try_find(code).await {
            Ok(id) => {
                debug!(code, found = id.is_some(), "discount lookup");
                id
            }
            Err(e) => {
                error!(code, error = %e, "discount lookup failed; treating as absent");
                None
            }
        }
    }

    async fn create(&self, code: &str, title: &str) -> Result<Option<String>, CreateFailure> {
        let title = if title.trim().is_empty() { code } else { title };

        let payload = match self.try_create(code, title).await {
            Ok(p) => p,
            Err(GatewayError::Decode(msg)) => {
                error!(code, error = %msg, "discount create returned an unreadable response");
                return Err(CreateFailure::Unclassified(msg));
            }
            Err(e) => {
                error!(code, error = %e, "discount create failed");
                return Ok(None);
            }
        };

        if !payload.user_errors.is_empty() {
            for ue in &payload.user_errors {
                warn!(code, error = %ue, "discount create rejected");
            }
            return Err(CreateFailure::Rejected(payload.user_errors));
        }

        if let Some(id) = payload.id() {
            info!(code, id = %id, "discount created");
            return Ok(Some(id));
        }

        warn!(code, "discount created but no id returned; looking it up");
        tokio::time::sleep(self.retry_delay).await;
        let recovered = self.find(code).await;
        if recovered.is_none() {
            warn!(code, "created discount could not be found");
        }
        Ok(recovered)
    }
}
