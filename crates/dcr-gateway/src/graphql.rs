//! GraphQL documents and payload shapes for the discount Admin API.
//!
//! Documents are static; codes and titles travel only in `variables`, so no
//! input can change the shape of a query.

use dcr_config::DiscountDefaults;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::UserError;

pub const FIND_DISCOUNT_QUERY: &str = r#"query FindDiscountByCode($code: String!) {
  codeDiscountNodeByCode(code: $code) {
    id
  }
}"#;

pub const CREATE_DISCOUNT_MUTATION: &str = r#"mutation CreateBasicDiscount($input: DiscountCodeBasicInput!) {
  discountCodeBasicCreate(basicCodeDiscount: $input) {
    codeDiscountNode {
      id
    }
    userErrors {
      field
      message
    }
  }
}"#;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of a GraphQL POST.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: &'static str,
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn find(code: &str) -> Self {
        Self {
            query: FIND_DISCOUNT_QUERY,
            variables: json!({ "code": code }),
        }
    }

    /// Basic percentage discount, open to all customers, applying to all items.
    pub fn create(code: &str, title: &str, discount: &DiscountDefaults) -> Self {
        Self {
            query: CREATE_DISCOUNT_MUTATION,
            variables: json!({
                "input": {
                    "title": title,
                    "code": code,
                    "startsAt": discount.starts_at.to_rfc3339(),
                    "customerSelection": { "all": true },
                    "customerGets": {
                        "value": { "percentage": discount.percentage },
                        "items": { "all": true }
                    }
                }
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

impl<T> GraphqlResponse<T> {
    /// Top-level errors joined into one message, if any.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let msgs: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        Some(msgs.join("; "))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlErrorEntry {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeRef {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindData {
    pub code_discount_node_by_code: Option<NodeRef>,
}

impl FindData {
    pub fn id(self) -> Option<String> {
        self.code_discount_node_by_code.and_then(|n| n.id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateData {
    pub discount_code_basic_create: Option<CreatePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePayload {
    pub code_discount_node: Option<NodeRef>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

impl CreatePayload {
    pub fn id(&self) -> Option<String> {
        self.code_discount_node.as_ref().and_then(|n| n.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_request_carries_code_only_in_variables() {
        let code = r#"EVIL") { id } mutation { x"#;
        let req = GraphqlRequest::find(code);
        assert_eq!(req.query, FIND_DISCOUNT_QUERY);
        assert_eq!(req.variables["code"], code);

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["query"].as_str().unwrap(), FIND_DISCOUNT_QUERY);
        assert_eq!(body["variables"]["code"].as_str().unwrap(), code);
    }

    #[test]
    fn create_request_shape() {
        let discount = DiscountDefaults::default();
        let req = GraphqlRequest::create("SAVE10", "Save ten", &discount);
        let input = &req.variables["input"];
        assert_eq!(input["code"], "SAVE10");
        assert_eq!(input["title"], "Save ten");
        assert_eq!(input["startsAt"], "2025-01-01T00:00:00+00:00");
        assert_eq!(input["customerSelection"]["all"], true);
        assert_eq!(input["customerGets"]["items"]["all"], true);
        assert!((input["customerGets"]["value"]["percentage"].as_f64().unwrap() - 0.10).abs() < 1e-12);
    }

    #[test]
    fn find_response_without_node_has_no_id() {
        let r: GraphqlResponse<FindData> =
            serde_json::from_str(r#"{"data":{"codeDiscountNodeByCode":null}}"#).unwrap();
        assert!(r.error_message().is_none());
        assert_eq!(r.data.and_then(FindData::id), None);
    }

    #[test]
    fn create_response_with_user_errors() {
        let r: GraphqlResponse<CreateData> = serde_json::from_str(
            r#"{"data":{"discountCodeBasicCreate":{"codeDiscountNode":null,
                "userErrors":[{"field":["basicCodeDiscount","code"],"message":"Code must be unique"}]}}}"#,
        )
        .unwrap();
        let payload = r.data.and_then(|d| d.discount_code_basic_create).unwrap();
        assert_eq!(payload.id(), None);
        assert_eq!(payload.user_errors.len(), 1);
        assert_eq!(payload.user_errors[0].message, "Code must be unique");
    }

    #[test]
    fn top_level_errors_are_joined() {
        let r: GraphqlResponse<FindData> =
            serde_json::from_str(r#"{"errors":[{"message":"Throttled"},{"message":"again"}]}"#)
                .unwrap();
        assert_eq!(r.error_message().as_deref(), Some("Throttled; again"));
    }
}
