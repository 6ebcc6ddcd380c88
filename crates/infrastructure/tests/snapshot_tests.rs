//! Integration tests for the JSON snapshot store

use benchmaker_application::SnapshotStore;
use benchmaker_domain::{ResultStatus, Snapshot, SNAPSHOT_VERSION};
use benchmaker_infrastructure::JsonSnapshotStore;
use benchmaker_testing::*;

fn sample_snapshot() -> Snapshot {
    let suite = create_test_suite();
    let run = RunResultBuilder::new(&suite)
        .with_scores("model-a", &[1.0, 0.5, 0.0, 1.0])
        .cancelled()
        .build();

    let mut snapshot = Snapshot::default();
    snapshot.upsert_suite(suite);
    snapshot.upsert_suite(create_judge_suite());
    snapshot.upsert_run(run);
    snapshot.active_test_suite_id = Some("suite-mixed".to_string());
    snapshot.touch();
    snapshot
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSnapshotStore::new(dir.path().join("nested/dir/benchmaker.json"));
    let saved = sample_snapshot();

    store.save(&saved).await.unwrap();
    let loaded = store.load().await.unwrap();

    assert_eq!(loaded.version, SNAPSHOT_VERSION);
    assert_eq!(loaded.test_suites, saved.test_suites.iter().cloned().map(truncate_times).collect::<Vec<_>>());
    assert_eq!(loaded.active_test_suite_id.as_deref(), Some("suite-mixed"));
    assert_eq!(loaded.current_run_id, saved.current_run_id);

    let run = &loaded.runs[0];
    assert!(run.cancelled);
    assert!(run.is_sealed());
    assert_eq!(run.test_suite_name, "Mixed Methods");
    let arithmetic = run.result("arithmetic", "model-a").unwrap();
    assert_eq!(arithmetic.status, ResultStatus::Completed);
    assert_eq!(arithmetic.score_value(), Some(0.5));
}

#[tokio::test]
async fn test_save_replaces_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("benchmaker.json");
    let store = JsonSnapshotStore::new(&path);

    store.save(&sample_snapshot()).await.unwrap();
    store.save(&Snapshot::default()).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert!(loaded.runs.is_empty());

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(files, vec![std::ffi::OsString::from("benchmaker.json")]);
}

#[tokio::test]
async fn test_persisted_format_is_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("benchmaker.json");
    JsonSnapshotStore::new(&path).save(&sample_snapshot()).await.unwrap();

    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert!(json["testSuites"].is_array());
    assert_eq!(json["activeTestSuiteId"], "suite-mixed");
    assert_eq!(json["testSuites"][0]["testCases"][1]["scoringMethod"], "numeric-tolerance");
    assert_eq!(json["testSuites"][0]["testCases"][0]["metadata"]["difficulty"], "easy");
    assert_eq!(json["testSuites"][0]["testCases"][0]["metadata"]["category"], "geography");
    assert!(json["runs"][0]["results"][0]["testCaseId"].is_string());
}

/// Timestamps are persisted with millisecond precision
fn truncate_times(mut suite: benchmaker_domain::TestSuite) -> benchmaker_domain::TestSuite {
    use chrono::{DateTime, Utc};
    let trunc = |t: DateTime<Utc>| DateTime::<Utc>::from_timestamp_millis(t.timestamp_millis()).unwrap();
    suite.created_at = trunc(suite.created_at);
    suite.updated_at = trunc(suite.updated_at);
    suite
}
