use rig_dashboard::config::ConfigStore;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn patch(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("patch must be an object"),
    }
}

#[tokio::test]
async fn merged_title_survives_reload_on_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        json!({"title": "Before", "custom_key": 7}).to_string(),
    )
    .unwrap();

    let store = ConfigStore::new(dir.path());
    store.load().await.unwrap();
    let merged = store.merge(patch(json!({"title": "X"}))).await.unwrap();
    assert_eq!(merged.title, "X");

    let fresh = ConfigStore::new(dir.path());
    let loaded = fresh.load().await.unwrap();
    assert_eq!(loaded.title, "X");
    assert_eq!(loaded.extra.get("custom_key"), Some(&json!(7)));
}

#[tokio::test]
async fn defaults_apply_for_zero_values() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        json!({"collection_interval_seconds": 0, "cookie_max_age": 0, "data_retention_days": null}).to_string(),
    )
    .unwrap();

    let settings = ConfigStore::new(dir.path()).load().await.unwrap();
    assert_eq!(settings.collection_interval_seconds, 300);
    assert_eq!(settings.cookie_max_age, 3600);
    assert_eq!(settings.data_retention_days, 30);
}

#[tokio::test]
async fn invalid_document_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let err = ConfigStore::new(dir.path()).load().await.unwrap_err();
    assert!(err.to_string().contains("parse"), "unexpected error: {}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_torn_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        json!({"title": "v0", "cookie_max_age": 1000}).to_string(),
    )
    .unwrap();

    let store = Arc::new(ConfigStore::new(dir.path()));
    store.load().await.unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        let done = done.clone();
        readers.push(tokio::spawn(async move {
            let mut reads = 0u64;
            while !done.load(Ordering::SeqCst) {
                let snapshot = store.get();
                let generation: u64 = snapshot.title.trim_start_matches('v').parse().unwrap();
                assert_eq!(snapshot.cookie_max_age, 1000 + generation);
                reads += 1;
                tokio::task::yield_now().await;
            }
            reads
        }));
    }

    for i in 1..=20u64 {
        store
            .merge(patch(json!({"title": format!("v{}", i), "cookie_max_age": 1000 + i})))
            .await
            .unwrap();
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    assert_eq!(store.get().title, "v20");
}

#[tokio::test]
async fn artifacts_require_all_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());
    assert!(!store.required_artifacts_exist());

    std::fs::write(dir.path().join("config.json"), "{}").unwrap();
    std::fs::write(dir.path().join("access.json"), "{}").unwrap();
    assert!(!store.required_artifacts_exist());

    std::fs::write(dir.path().join("jsonWebTokenKey.json"), "{}").unwrap();
    assert!(store.required_artifacts_exist());
}
