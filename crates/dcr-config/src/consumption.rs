/// Registry of JSON-pointer prefixes the reconciler actually reads.
///
/// A leaf is consumed when it sits under any of these prefixes. Keep this in
/// step with `Settings::from_config_json` and `secrets::resolve_secrets`.
pub fn consumed_pointers() -> &'static [&'static str] {
    CONSUMED
}

static CONSUMED: &[&str] = &[
    // Settings::from_config_json
    "/engine/batch_size",
    "/engine/save_frequency",
    "/engine/inter_batch_delay_ms",
    "/engine/creation_policy",
    "/discount/percentage",
    "/discount/starts_at",
    "/gateway/shop_domain",
    "/gateway/base_url",
    "/gateway/api_version",
    "/gateway/retry_delay_ms",
    "/gateway/request_timeout_ms",
    "/ledger/dir",
    "/ledger/base_filename",
    "/ledger/suffix_len",
    // secrets::resolve_secrets
    "/auth/keys_env",
];
