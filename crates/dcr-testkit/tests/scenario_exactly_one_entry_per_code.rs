use std::sync::Arc;

use dcr_config::CreationPolicy;
use dcr_reconcile::{normalizer, BatchEngine, ProcessingSummary, RawCode};
use dcr_testkit::{discount_gid, engine_settings, new_ledger, CreateScript, ScriptedGateway};
use serde_json::json;

#[tokio::test]
async fn every_distinct_code_has_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = new_ledger(dir.path()).unwrap();

    let mut gw = ScriptedGateway::new();
    for i in (0..40).step_by(3) {
        gw = gw.with_existing(&format!("P{i}"), &discount_gid(i));
    }
    gw = gw.on_create("P7", CreateScript::Unconfirmed).panic_on("P11");
    let gw = Arc::new(gw);

    let engine = BatchEngine::new(gw.clone(), engine_settings(4, 2, CreationPolicy::Create));

    let mut codes: Vec<RawCode> = (0..40).map(|i| RawCode::from(format!("P{i}"))).collect();
    codes.push(RawCode::from(" P5 "));
    codes.push(RawCode::from(""));
    codes.push(RawCode::from(json!(false)));

    let expected: std::collections::BTreeSet<String> =
        codes.iter().map(normalizer::ledger_key).collect();

    let outcome = engine.run(codes, &mut ledger).await.unwrap();

    let keys: std::collections::BTreeSet<String> = outcome.results.keys().cloned().collect();
    assert_eq!(keys, expected);
    assert!(outcome.missing.is_empty());
    assert_eq!(outcome.processed, expected.len());
    assert_eq!(outcome.duplicates, 1);

    // Writer wrote each key exactly once.
    assert_eq!(ledger.entries_written(), expected.len());

    let summary = ProcessingSummary::from_results(&outcome.results, 43);
    assert_eq!(summary.total_processed, expected.len());
    assert_eq!(summary.with_ids, outcome.successful);
    assert_eq!(summary.by_status["NO_ID_creation_failed"], 1);
    assert_eq!(summary.by_status["NO_ID_exception"], 1);
    assert_eq!(summary.by_status["NO_ID_invalid_format"], 2);
}
