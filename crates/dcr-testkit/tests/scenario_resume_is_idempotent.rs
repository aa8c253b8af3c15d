//! Re-running over an existing ledger with skip policy never changes a
//! resolved entry and does not contact the platform for it.

use std::sync::Arc;

use dcr_config::CreationPolicy;
use dcr_ledger::LedgerWriter;
use dcr_reconcile::{BatchEngine, RawCode};
use dcr_testkit::{discount_gid, engine_settings, new_ledger, ScriptedGateway};

fn inputs() -> Vec<RawCode> {
    ["EXIST1", "EXIST2", "MISSING1", "MISSING2"]
        .into_iter()
        .map(RawCode::from)
        .collect()
}

#[tokio::test]
async fn second_run_leaves_resolved_entries_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let gw = Arc::new(
        ScriptedGateway::new()
            .with_existing("EXIST1", &discount_gid(1))
            .with_existing("EXIST2", &discount_gid(2)),
    );
    let engine = BatchEngine::new(gw.clone(), engine_settings(2, 1, CreationPolicy::Skip));

    let mut ledger = new_ledger(dir.path()).unwrap();
    let first = engine.run(inputs(), &mut ledger).await.unwrap();
    assert_eq!(first.successful, 2);
    let path = first.ledger_path.clone();

    // Second run: the platform is unreachable, every lookup reports absence.
    gw.set_lookup_outage(true);
    let finds_before = gw.find_calls();

    let mut resumed = LedgerWriter::resume(&path).unwrap();
    let second = engine.run(inputs(), &mut resumed).await.unwrap();

    assert_eq!(second.results["EXIST1"], discount_gid(1));
    assert_eq!(second.results["EXIST2"], discount_gid(2));
    assert_eq!(second.results["MISSING1"], "NO_ID_skipped_creation");
    assert_eq!(second.carried_over, 2);
    assert_eq!(second.successful, 2);
    assert_eq!(second.results, first.results);

    // Only the unresolved codes were looked up again.
    assert_eq!(gw.find_calls() - finds_before, 2);
    assert_eq!(gw.calls_for("EXIST1").len(), 1);
    assert_eq!(gw.create_calls(), 0);
}

#[tokio::test]
async fn resumed_run_can_resolve_previous_failures() {
    let dir = tempfile::tempdir().unwrap();
    let gw = Arc::new(ScriptedGateway::new().with_existing("EXIST1", &discount_gid(1)));

    let mut ledger = new_ledger(dir.path()).unwrap();
    let skip = BatchEngine::new(gw.clone(), engine_settings(10, 1, CreationPolicy::Skip));
    let first = skip.run(inputs(), &mut ledger).await.unwrap();
    assert_eq!(first.results["MISSING2"], "NO_ID_skipped_creation");

    let create = BatchEngine::new(gw.clone(), engine_settings(10, 1, CreationPolicy::Create));
    let mut resumed = LedgerWriter::resume(&first.ledger_path).unwrap();
    let second = create.run(inputs(), &mut resumed).await.unwrap();

    // Skipped codes are reprocessed and the new value wins.
    for code in ["EXIST2", "MISSING1", "MISSING2"] {
        assert!(second.results[code].starts_with("gid://"), "{code}");
    }
    assert_eq!(second.results["EXIST1"], discount_gid(1));
    assert_eq!(second.results.len(), 4);
    assert_eq!(second.carried_over, 1);
    assert_eq!(gw.create_calls(), 3);
}

#[tokio::test]
async fn invalid_input_does_not_overwrite_a_resolved_code() {
    let dir = tempfile::tempdir().unwrap();
    let gw = Arc::new(ScriptedGateway::new().with_existing("7", &discount_gid(7)));
    let engine = BatchEngine::new(gw.clone(), engine_settings(5, 1, CreationPolicy::Skip));

    let mut ledger = new_ledger(dir.path()).unwrap();
    let first = engine.run(vec![RawCode::from("7")], &mut ledger).await.unwrap();
    assert_eq!(first.results["7"], discount_gid(7));

    let mut resumed = LedgerWriter::resume(&first.ledger_path).unwrap();
    let second = engine
        .run(vec![RawCode::from(serde_json::json!(7))], &mut resumed)
        .await
        .unwrap();

    assert_eq!(second.results["7"], discount_gid(7));
    assert_eq!(second.duplicates, 1);
    assert_eq!(second.flushes, 0);
    assert_eq!(gw.find_calls(), 1);
}
