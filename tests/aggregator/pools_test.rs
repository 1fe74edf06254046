use rig_dashboard::config::Settings;
use rig_dashboard::services::aggregator::pools::{fetch_pools, pool_entry};
use rig_dashboard::services::aggregator::FanOutOptions;
use rig_dashboard::services::remote::RemoteClient;
use serde_json::json;
use std::time::Duration;

use crate::common::{failing_device, miningcore, spawn_peer};

#[tokio::test]
async fn one_failing_pool_instance_still_yields_every_entry() {
    let main = spawn_peer(miningcore("dgb1")).await;
    let broken = spawn_peer(failing_device()).await;
    let settings = Settings::from_value(json!({
        "title": "Test Rigs",
        "mining_core_enabled": true,
        "mining_core_url": [{"main": main}, {"backup": broken}]
    }))
    .unwrap();

    let remote = RemoteClient::new(Duration::from_secs(2));
    let outcomes = fetch_pools(&remote, &settings, FanOutOptions::default()).await;
    assert_eq!(outcomes.len(), 2);

    let entries: Vec<_> = outcomes.into_iter().map(pool_entry).collect();
    let ok = entries.iter().find(|e| e.instance_name == "main").unwrap();
    assert_eq!(ok.status, "OK");
    assert_eq!(ok.pools.len(), 1);
    assert_eq!(ok.pools[0]["id"], "dgb1");

    let failed = entries.iter().find(|e| e.instance_name == "backup").unwrap();
    assert_eq!(failed.status, "Error");
    assert_eq!(failed.message.as_deref(), Some("500 Internal Server Error"));
    assert!(failed.pools.is_empty());
}

#[tokio::test]
async fn disabled_pools_are_not_queried() {
    let settings = Settings::from_value(json!({
        "title": "Test Rigs",
        "mining_core_enabled": false,
        "mining_core_url": [{"main": "http://127.0.0.1:1"}]
    }))
    .unwrap();

    let remote = RemoteClient::new(Duration::from_secs(1));
    assert!(fetch_pools(&remote, &settings, FanOutOptions::default()).await.is_empty());
}
