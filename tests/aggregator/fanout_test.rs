use rig_dashboard::config::Peer;
use rig_dashboard::services::aggregator::devices::{device_entry, fetch_device_info};
use rig_dashboard::services::aggregator::{fan_out, FanOutOptions, PeerFailure};
use rig_dashboard::services::remote::RemoteClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{device_config, failing_device, healthy_device, spawn_peer};

#[tokio::test]
async fn concurrency_stays_within_limit() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let peers: Vec<Peer> = (0..10).map(|i| Peer::new(format!("rig-{}", i), "http://x")).collect();
    let options = FanOutOptions {
        timeout: Duration::from_secs(2),
        max_concurrency: 3,
    };

    let (counter, high) = (in_flight.clone(), peak.clone());
    let outcomes = fan_out(peers, options, move |peer: Peer| {
        let counter = counter.clone();
        let high = high.clone();
        async move {
            let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
            high.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            counter.fetch_sub(1, Ordering::SeqCst);
            if peer.name.ends_with('3') {
                Err(PeerFailure::new("bad_status", "503 Service Unavailable"))
            } else {
                Ok(peer.name.len())
            }
        }
    })
    .await;

    assert_eq!(outcomes.len(), 10);
    assert_eq!(outcomes.iter().filter(|o| !o.is_ok()).count(), 1);
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn one_failing_device_still_yields_every_entry() {
    let a = spawn_peer(healthy_device("rig-a")).await;
    let b = spawn_peer(healthy_device("rig-b")).await;
    let broken = spawn_peer(failing_device()).await;

    let settings = rig_dashboard::config::Settings::from_value(device_config(&[
        ("rig-a", a.as_str()),
        ("rig-b", b.as_str()),
        ("rig-broken", broken.as_str()),
    ]))
    .unwrap();

    let remote = RemoteClient::new(Duration::from_secs(2));
    let outcomes = fetch_device_info(&remote, &settings, FanOutOptions::default()).await;
    assert_eq!(outcomes.len(), 3);

    let entries: Vec<_> = outcomes.into_iter().map(device_entry).collect();
    let failed: Vec<_> = entries.iter().filter(|e| e["status"] == "Error").collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["id"], "rig-broken");
    assert_eq!(failed[0]["message"], "500 Internal Server Error");

    let ok = entries.iter().find(|e| e["id"] == "rig-a").unwrap();
    assert_eq!(ok["hostname"], "rig-a");
}

#[tokio::test]
async fn unreachable_device_is_reported_not_raised() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let settings =
        rig_dashboard::config::Settings::from_value(device_config(&[("gone", url.as_str())])).unwrap();
    let remote = RemoteClient::new(Duration::from_secs(1));
    let outcomes = fetch_device_info(&remote, &settings, FanOutOptions::default()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result.as_ref().unwrap_err().kind, "unreachable");
}

#[tokio::test]
async fn direct_client_call_is_bounded_by_timeout() {
    let slow = axum::Router::new().route(
        "/api/system/info",
        axum::routing::get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let url = spawn_peer(slow).await;
    let remote = RemoteClient::new(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = remote
        .get_json(&format!("{}/api/system/info", url))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "unreachable");
    assert!(started.elapsed() < Duration::from_secs(2));
}
