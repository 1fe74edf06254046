use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::config::store::JWT_KEY_FILE;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT key file error: {0}")]
    KeyFile(String),

    #[error("Invalid token lifetime {0:?}")]
    Lifetime(String),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // username
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Contents of `jsonWebTokenKey.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtKeyFile {
    #[serde(rename = "jsonWebTokenKey")]
    pub key: String,
    #[serde(rename = "expiresIn", default = "default_expires_in")]
    pub expires_in: String,
}

fn default_expires_in() -> String {
    "1h".to_string()
}

pub struct JwtService {
    secret: String,
    token_duration: Duration,
}

impl JwtService {
    pub fn new(secret: String, token_duration: Duration) -> Self {
        Self {
            secret,
            token_duration,
        }
    }

    /// Read the signing key and lifetime from the config directory.
    pub async fn from_config_dir(config_dir: &Path) -> Result<Self, JwtError> {
        let path = config_dir.join(JWT_KEY_FILE);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| JwtError::KeyFile(format!("{}: {}", path.display(), e)))?;
        let file: JwtKeyFile = serde_json::from_slice(&bytes)
            .map_err(|e| JwtError::KeyFile(format!("{}: {}", path.display(), e)))?;

        if file.key.is_empty() {
            return Err(JwtError::KeyFile(format!("{}: empty jsonWebTokenKey", path.display())));
        }

        Ok(Self::new(file.key, parse_lifetime(&file.expires_in)?))
    }

    pub fn create_token(&self, username: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            exp: (now + self.token_duration).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenData<Claims>, JwtError> {
        Ok(decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?)
    }

    pub fn token_duration_secs(&self) -> i64 {
        self.token_duration.num_seconds()
    }
}

/// `30s`, `15m`, `1h`, `7d`; a bare number is seconds.
pub fn parse_lifetime(raw: &str) -> Result<Duration, JwtError> {
    let raw = raw.trim();
    let invalid = || JwtError::Lifetime(raw.to_string());

    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((i, _)) => raw.split_at(i),
        None => (raw, "s"),
    };
    let value: i64 = digits.parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }

    match unit {
        "s" => Ok(Duration::seconds(value)),
        "m" => Ok(Duration::minutes(value)),
        "h" => Ok(Duration::hours(value)),
        "d" => Ok(Duration::days(value)),
        _ => Err(invalid()),
    }
}
