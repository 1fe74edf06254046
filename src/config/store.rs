use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::settings::{canonicalize_keys, Settings};

pub const CONFIG_FILE: &str = "config.json";
pub const ACCESS_FILE: &str = "access.json";
pub const JWT_KEY_FILE: &str = "jsonWebTokenKey.json";
pub const RPC_CONFIG_FILE: &str = "rpcConfig.json";

/// Files that must all exist before the server may leave bootstrap mode.
pub const REQUIRED_ARTIFACTS: [&str; 3] = [CONFIG_FILE, ACCESS_FILE, JWT_KEY_FILE];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Configuration parse error: {0}")]
    Parse(String),

    #[error("Configuration I/O error: {0}")]
    Io(String),
}

/// Holder of the current configuration snapshot.
///
/// Readers clone an `Arc` under a short read lock. `merge` serializes writers on
/// a separate async mutex so file I/O never happens while the snapshot lock is held.
pub struct ConfigStore {
    config_dir: PathBuf,
    current: RwLock<Arc<Settings>>,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            current: RwLock::new(Arc::new(Settings::default().normalized())),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(name)
    }

    pub fn required_artifacts_exist(&self) -> bool {
        REQUIRED_ARTIFACTS
            .iter()
            .all(|name| self.config_dir.join(name).is_file())
    }

    /// Read `config.json`, apply defaults and publish the result as the current snapshot.
    pub async fn load(&self) -> Result<Arc<Settings>, ConfigError> {
        let raw = self.read_raw().await?;
        let settings = Settings::from_value(Value::Object(raw))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let snapshot = Arc::new(settings);
        *self.current.write() = snapshot.clone();

        tracing::debug!(
            devices = snapshot.device_peers().len(),
            pools = snapshot.pool_peers().len(),
            nodes = snapshot.node_peers().len(),
            "Configuration loaded"
        );

        Ok(snapshot)
    }

    pub fn get(&self) -> Arc<Settings> {
        self.current.read().clone()
    }

    /// Swap the whole snapshot in memory. The backing file is untouched.
    pub fn replace(&self, settings: Settings) -> Arc<Settings> {
        let snapshot = Arc::new(settings.normalized());
        *self.current.write() = snapshot.clone();
        snapshot
    }

    /// Overwrite top-level keys of the on-disk document, persist it atomically and reload.
    ///
    /// Nothing is written when the merged document does not parse; the previous
    /// snapshot stays in effect on any error.
    pub async fn merge(&self, patch: Map<String, Value>) -> Result<Arc<Settings>, ConfigError> {
        let _guard = self.write_lock.lock().await;

        let mut raw = self.read_raw().await?;
        for (key, value) in patch {
            raw.insert(key, value);
        }

        let merged = Value::Object(raw);
        Settings::from_value(merged.clone()).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let body = serde_json::to_vec_pretty(&merged).map_err(|e| ConfigError::Parse(e.to_string()))?;
        write_atomic(&self.config_path(), &body).await?;

        tracing::info!(path = %self.config_path().display(), "Configuration updated");

        self.load().await
    }

    /// Raw on-disk document without defaults applied. Legacy key names are
    /// already mapped to their current names.
    pub async fn read_raw(&self) -> Result<Map<String, Value>, ConfigError> {
        let path = self.config_path();
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.clone()),
            _ => ConfigError::Io(format!("{}: {}", path.display(), e)),
        })?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(mut map)) => {
                canonicalize_keys(&mut map);
                Ok(map)
            }
            Ok(_) => Err(ConfigError::Parse(format!(
                "{}: top-level value must be an object",
                path.display()
            ))),
            Err(e) => Err(ConfigError::Parse(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Write to a sibling temp file then rename over the target.
pub async fn write_atomic(path: &Path, body: &[u8]) -> Result<(), ConfigError> {
    let dir = path
        .parent()
        .ok_or_else(|| ConfigError::Io(format!("{} has no parent directory", path.display())))?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ConfigError::Io(format!("{}: {}", dir.display(), e)))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("config.json");
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&tmp, body).await {
        return Err(ConfigError::Io(format!("{}: {}", tmp.display(), e)));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(ConfigError::Io(format!("{}: {}", path.display(), e)));
    }

    Ok(())
}
