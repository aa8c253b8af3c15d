use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const ENV_CLIENT_ID: &str = "DCR_CLI_TEST_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "DCR_CLI_TEST_CLIENT_SECRET";
const ENV_ACCESS_TOKEN: &str = "DCR_CLI_TEST_ACCESS_TOKEN";
const ENV_ADMIN_TOKEN: &str = "DCR_CLI_TEST_ADMIN_TOKEN";

/// Parse the `ledger_path=` line and load the ledger it names.
fn ledger_from_stdout(stdout: &str) -> (PathBuf, BTreeMap<String, String>) {
    let line = stdout
        .lines()
        .find(|l| l.starts_with("ledger_path="))
        .expect("ledger_path line");
    let path = PathBuf::from(line.trim_start_matches("ledger_path="));
    let raw = fs::read_to_string(&path).expect("read ledger");
    (path, serde_json::from_str(&raw).expect("ledger is valid json"))
}

fn write_config(dir: &Path, base_url: Option<&str>) -> anyhow::Result<PathBuf> {
    let mut yaml = String::new();
    yaml.push_str("gateway:\n  retry_delay_ms: 1\n");
    if let Some(url) = base_url {
        yaml.push_str(&format!("  base_url: \"{url}\"\n"));
    }
    yaml.push_str(&format!(
        "ledger:\n  dir: \"{}\"\n  base_filename: \"results\"\n",
        dir.join("out").display()
    ));
    yaml.push_str(&format!(
        "auth:\n  keys_env:\n    client_id: {ENV_CLIENT_ID}\n    client_secret: {ENV_CLIENT_SECRET}\n    access_token: {ENV_ACCESS_TOKEN}\n    admin_token: {ENV_ADMIN_TOKEN}\n"
    ));
    let path = dir.join("config.yaml");
    fs::write(&path, yaml)?;
    Ok(path)
}

#[allow(deprecated)]
fn dcr(dir: &Path) -> anyhow::Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("dcr")?;
    cmd.current_dir(dir)
        .env_remove(ENV_CLIENT_ID)
        .env_remove(ENV_CLIENT_SECRET)
        .env_remove(ENV_ACCESS_TOKEN)
        .env_remove(ENV_ADMIN_TOKEN);
    Ok(cmd)
}

#[test]
fn run_without_credentials_fails_naming_env_vars() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let cfg = write_config(tmp.path(), Some("http://127.0.0.1:9"))?;
    let codes = tmp.path().join("codes.json");
    fs::write(&codes, r#"{"codes": ["A"]}"#)?;

    dcr(tmp.path())?
        .args(["run", "--codes"])
        .arg(&codes)
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(predicate::str::contains(ENV_ADMIN_TOKEN));

    // Nothing reached the ledger directory.
    assert!(!tmp.path().join("out").exists());
    Ok(())
}

#[test]
fn run_without_shop_domain_fails() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let cfg = write_config(tmp.path(), None)?;
    let codes = tmp.path().join("codes.json");
    fs::write(&codes, r#"["A"]"#)?;

    dcr(tmp.path())?
        .env(ENV_ADMIN_TOKEN, "tok")
        .args(["run", "--codes"])
        .arg(&codes)
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("shop_domain"));
    Ok(())
}

#[test]
fn run_with_bad_codes_file_fails() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let cfg = write_config(tmp.path(), Some("http://127.0.0.1:9"))?;
    let codes = tmp.path().join("codes.json");
    fs::write(&codes, r#"{"items": ["A"]}"#)?;

    dcr(tmp.path())?
        .env(ENV_ADMIN_TOKEN, "tok")
        .args(["run", "--codes"])
        .arg(&codes)
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("codes"));
    Ok(())
}

#[test]
fn run_against_mock_platform_writes_ledger_and_resumes() -> anyhow::Result<()> {
    let server = MockServer::start();
    let exist = server.mock(|when, then| {
        when.method(POST)
            .path("/admin/api/2025-04/graphql.json")
            .header("X-Shopify-Access-Token", "admin-tok")
            .body_contains("\"EXIST1\"");
        then.status(200).json_body(json!({
            "data": {"codeDiscountNodeByCode": {"id": "gid://shopify/DiscountCodeNode/1"}}
        }));
    });
    let absent = server.mock(|when, then| {
        when.method(POST)
            .path("/admin/api/2025-04/graphql.json")
            .body_contains("codeDiscountNodeByCode")
            .body_contains("\"SAVE10\"");
        then.status(200)
            .json_body(json!({"data": {"codeDiscountNodeByCode": null}}));
    });

    let tmp = tempdir()?;
    let cfg = write_config(tmp.path(), Some(&server.base_url()))?;
    let codes = tmp.path().join("codes.json");
    fs::write(&codes, r#"{"codes": ["SAVE10", "", "  ", "EXIST1"]}"#)?;

    let out = dcr(tmp.path())?
        .env(ENV_ADMIN_TOKEN, "admin-tok")
        .args(["run", "--codes"])
        .arg(&codes)
        .arg("--config")
        .arg(&cfg)
        .args(["--batch-size", "2", "--save-frequency", "1"])
        .output()?;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout)?;
    let (path, ledger) = ledger_from_stdout(&stdout);
    assert!(path.starts_with(tmp.path().join("out")));
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger["SAVE10"], "NO_ID_skipped_creation");
    assert_eq!(ledger[""], "NO_ID_invalid_format");
    assert_eq!(ledger["EXIST1"], "gid://shopify/DiscountCodeNode/1");
    assert!(stdout.contains("processed=3 successful=1"));
    assert!(stdout.contains("PROCESSING SUMMARY"));
    exist.assert_hits(1);
    absent.assert_hits(1);

    // Resume: EXIST1 is carried over and not looked up again.
    let out = dcr(tmp.path())?
        .env(ENV_ADMIN_TOKEN, "admin-tok")
        .args(["run", "--codes"])
        .arg(&codes)
        .arg("--config")
        .arg(&cfg)
        .arg("--resume")
        .arg(&path)
        .output()?;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout)?;
    assert!(stdout.contains("carried_over=1"));

    let (resumed_path, resumed) = ledger_from_stdout(&stdout);
    assert_eq!(resumed_path, path);
    assert_eq!(resumed, ledger);
    exist.assert_hits(1);
    absent.assert_hits(2);
    Ok(())
}
