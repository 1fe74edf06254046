use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::store::{write_atomic, ACCESS_FILE};
use crate::services::hashing;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),
}

/// Credentials kept in `access.json` as `{username: argon2-hash}`.
pub struct AccessCrud {
    path: PathBuf,
}

impl AccessCrud {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(ACCESS_FILE),
        }
    }

    pub async fn load(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AuthError::Store(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::Store(format!("{}: {}", self.path.display(), e)))
    }

    /// Check a login attempt. Hash verification runs off the async workers.
    pub async fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let accounts = self.load().await?;
        let Some(hash) = accounts.get(username).cloned() else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || hashing::verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if valid {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Replace the credential file with a single account, or an empty object when `None`.
    pub async fn write(&self, account: Option<(&str, &str)>) -> Result<(), AuthError> {
        let mut accounts = BTreeMap::new();
        if let Some((username, password)) = account {
            let password = password.to_string();
            let hash = tokio::task::spawn_blocking(move || hashing::hash_password(&password))
                .await
                .map_err(|e| AuthError::Hashing(e.to_string()))?
                .map_err(|e| AuthError::Hashing(e.to_string()))?;
            accounts.insert(username.to_string(), hash);
        }

        let body = serde_json::to_vec_pretty(&accounts).map_err(|e| AuthError::Store(e.to_string()))?;
        write_atomic(&self.path, &body)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}
