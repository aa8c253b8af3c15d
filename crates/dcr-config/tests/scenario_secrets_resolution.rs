//! Credential resolution reads env var NAMES from config and never leaks values.
//!
//! Each test uses its own globally unique env var names, so parallel tests
//! never observe each other's `set_var` calls.

use dcr_config::load_layered_yaml_from_strings;
use dcr_config::secrets::{resolve_secrets, SecretEnvNames};

fn load(yaml: &str) -> serde_json::Value {
    load_layered_yaml_from_strings(&[yaml])
        .expect("test yaml must parse cleanly")
        .config_json
}

#[test]
fn unset_vars_resolve_to_none() {
    let cfg = load(
        r#"
auth:
  keys_env:
    client_id: "DCR_SENTINEL_UNSET_CLIENT_ID_A1"
    client_secret: "DCR_SENTINEL_UNSET_CLIENT_SECRET_A1"
    access_token: "DCR_SENTINEL_UNSET_ACCESS_TOKEN_A1"
    admin_token: "DCR_SENTINEL_UNSET_ADMIN_TOKEN_A1"
"#,
    );
    let s = resolve_secrets(&cfg);
    assert!(!s.has_delegated_app());
    assert!(!s.has_admin_token());
    assert_eq!(s.env_names.admin_token, "DCR_SENTINEL_UNSET_ADMIN_TOKEN_A1");
}

#[test]
fn set_vars_are_resolved_and_blank_counts_as_unset() {
    std::env::set_var("DCR_TEST_B2_ADMIN", "  admin-value  ");
    std::env::set_var("DCR_TEST_B2_ACCESS", "   ");
    let cfg = load(
        r#"
auth:
  keys_env:
    admin_token: "DCR_TEST_B2_ADMIN"
    access_token: "DCR_TEST_B2_ACCESS"
"#,
    );
    let s = resolve_secrets(&cfg);
    assert_eq!(s.admin_token.as_deref(), Some("admin-value"));
    assert!(s.access_token.is_none(), "blank value must count as unset");
}

#[test]
fn delegated_app_requires_all_three_values() {
    std::env::set_var("DCR_TEST_C3_ID", "id");
    std::env::set_var("DCR_TEST_C3_SECRET", "secret");
    let cfg = load(
        r#"
auth:
  keys_env:
    client_id: "DCR_TEST_C3_ID"
    client_secret: "DCR_TEST_C3_SECRET"
    access_token: "DCR_SENTINEL_UNSET_ACCESS_TOKEN_C3"
"#,
    );
    assert!(!resolve_secrets(&cfg).has_delegated_app());

    std::env::set_var("DCR_TEST_C3_TOKEN", "token");
    let cfg = load(
        r#"
auth:
  keys_env:
    client_id: "DCR_TEST_C3_ID"
    client_secret: "DCR_TEST_C3_SECRET"
    access_token: "DCR_TEST_C3_TOKEN"
"#,
    );
    assert!(resolve_secrets(&cfg).has_delegated_app());
}

#[test]
fn missing_names_fall_back_to_defaults() {
    let s = resolve_secrets(&load("{}"));
    assert_eq!(s.env_names, SecretEnvNames::default());
    assert_eq!(s.env_names.admin_token, "SHOPIFY_ADMIN_TOKEN");
}

#[test]
fn debug_output_is_redacted() {
    std::env::set_var("DCR_TEST_D4_ADMIN", "super-secret-admin-token");
    let cfg = load("auth:\n  keys_env:\n    admin_token: \"DCR_TEST_D4_ADMIN\"\n");
    let dbg = format!("{:?}", resolve_secrets(&cfg));
    assert!(!dbg.contains("super-secret-admin-token"), "got: {dbg}");
    assert!(dbg.contains("<REDACTED>"));
    assert!(dbg.contains("DCR_TEST_D4_ADMIN"), "names are safe to print");
}
