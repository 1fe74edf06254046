use rig_dashboard::config::{ConfigStore, Environment};
use rig_dashboard::services::gate::{BootGate, ModeInitializer, ServerMode};
use rig_dashboard::services::metrics::MetricsRegistry;
use rig_dashboard::{create_bootstrap_app, NormalModeInitializer};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rig_dashboard=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = match Environment::from_env() {
        Ok(env) => Arc::new(env),
        Err(e) => fatal(&e),
    };
    let config = Arc::new(ConfigStore::new(&env.config_dir));
    let metrics = match MetricsRegistry::new() {
        Ok(metrics) => metrics,
        Err(e) => fatal(&format!("Failed to register metrics: {}", e)),
    };

    let initializer = Arc::new(NormalModeInitializer::new(env.clone(), config.clone(), metrics));

    let mode = if config.required_artifacts_exist() {
        match initializer.initialize().await {
            Ok(router) => ServerMode::Normal(router),
            Err(e) => fatal(&e.to_string()),
        }
    } else {
        tracing::warn!(dir = %env.config_dir.display(), "Setup files missing, starting in bootstrap mode");
        ServerMode::Bootstrap(create_bootstrap_app(env.clone()))
    };

    let port = env.port_override.unwrap_or_else(|| config.get().web_server_port);
    let gate = Arc::new(BootGate::new(mode, config.clone(), initializer.clone()));

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => fatal(&format!("Failed to bind port {}: {}", port, e)),
    };
    tracing::info!("Server running on http://localhost:{}", port);

    if let Err(e) = axum::serve(listener, gate.into_router())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    initializer.shutdown().await;
    tracing::info!("Shutdown complete");
}

fn fatal(message: &str) -> ! {
    tracing::error!("{}", message);
    std::process::exit(1);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
