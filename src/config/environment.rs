use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FANOUT_CONCURRENCY: usize = 32;

/// Process-level settings read from the environment.
/// Business settings live in `config.json` and go through `ConfigStore`.
#[derive(Debug, Clone)]
pub struct Environment {
    pub config_dir: PathBuf,
    pub public_dir: PathBuf,
    pub data_dir: PathBuf,
    pub port_override: Option<u16>,
    pub remote_timeout: Duration,
    pub fanout_concurrency: usize,
}

impl Environment {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let base_dir = match env::var("BASE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir().map_err(|e| format!("Cannot resolve working directory: {}", e))?,
        };

        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("config"));
        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("public"));
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("data"));

        let port_override = match env::var("PORT") {
            Ok(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|_| format!("PORT must be a valid port number, got {:?}", raw))?,
            ),
            Err(_) => None,
        };

        let remote_timeout = env::var("REMOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS);

        let fanout_concurrency = env::var("FANOUT_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_FANOUT_CONCURRENCY);

        Ok(Self {
            config_dir,
            public_dir,
            data_dir,
            port_override,
            remote_timeout: Duration::from_secs(remote_timeout),
            fanout_concurrency,
        })
    }

    /// Rooted at `base`, with default timeouts. Used by tests and embedders.
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.join("config"),
            public_dir: base.join("public"),
            data_dir: base.join("data"),
            port_override: None,
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
        }
    }

    pub fn metrics_db_path(&self) -> PathBuf {
        self.data_dir.join("metrics.db")
    }
}
