use axum::{extract::State, http::header, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Instant;

use super::schema::SystemsInfoResponse;
use crate::config::RpcDirectory;
use crate::services::aggregator::devices::{device_entry, fetch_device_info};
use crate::services::aggregator::nodes::{fetch_nodes, node_entry};
use crate::services::aggregator::pools::{fetch_pools, pool_entry};
use crate::AppState;

/// Live view of every device, pool and node. Always 200; per-peer failures are
/// reported inside the body.
pub async fn systems_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.config.get();
    let options = state.fanout;

    let directory = if settings.crypt_nodes_enabled {
        RpcDirectory::load(state.config.config_dir()).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Node RPC configuration unreadable");
            RpcDirectory::default()
        })
    } else {
        RpcDirectory::default()
    };

    let started = Instant::now();
    let (devices, pools, nodes) = tokio::join!(
        fetch_device_info(&state.remote, &settings, options),
        fetch_pools(&state.remote, &settings, options),
        fetch_nodes(&state.remote, &settings, directory, options),
    );

    let metrics = &state.metrics;
    metrics.record_outcomes("device", devices.iter().map(|o| o.is_ok()));
    metrics.record_outcomes("pool", pools.iter().map(|o| o.is_ok()));
    metrics.record_outcomes("node", nodes.iter().map(|o| o.is_ok()));
    metrics
        .fanout_duration_seconds
        .with_label_values(&["systems_info"])
        .observe(started.elapsed().as_secs_f64());

    let response = SystemsInfoResponse {
        miner_data: devices.into_iter().map(device_entry).collect(),
        display_fields: settings.display_fields.clone(),
        mining_core_data: pools.into_iter().map(pool_entry).collect(),
        mining_core_display_fields: settings.mining_core_display_fields.clone(),
        crypto_node_data: nodes.into_iter().map(|o| node_entry(&settings, o)).collect(),
        disable_settings: settings.disable_settings,
        disable_configurations: settings.disable_configurations,
        disable_authentication: settings.disable_authentication,
        mining_core_enabled: settings.mining_core_enabled,
    };

    (
        [
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        Json(response),
    )
}
