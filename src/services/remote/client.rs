use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("{0}")]
    Unreachable(String),

    #[error("{status} {reason}")]
    BadStatus { status: u16, reason: String },

    #[error("Invalid response payload: {0}")]
    BadPayload(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl RemoteError {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Unreachable(_) => "unreachable",
            RemoteError::BadStatus { .. } => "bad_status",
            RemoteError::BadPayload(_) => "bad_payload",
            RemoteError::Rpc { .. } => "rpc",
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Unreachable(format!("request timed out: {}", e))
        } else if e.is_decode() {
            RemoteError::BadPayload(e.to_string())
        } else {
            RemoteError::Unreachable(e.to_string())
        }
    }
}

/// One bounded-timeout call to one peer. Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteClient {
    pub fn new(timeout: Duration) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "HTTP client build failed, using defaults with per-request timeouts");
                reqwest::Client::default()
            }
        };

        Self { client, timeout }
    }

    /// Every outgoing request carries the timeout, whatever client backs it.
    pub(super) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).timeout(self.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and decode the body as JSON. A non-2xx status is an error.
    pub async fn get_json(&self, url: &str) -> Result<Value, RemoteError> {
        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(bad_status(status));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::BadPayload(e.to_string()))
    }

    /// POST with an optional JSON body. Devices often answer with plain text or nothing.
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value, RemoteError> {
        let mut request = self.request(Method::POST, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send_lenient(request).await
    }

    pub async fn patch_json(&self, url: &str, body: &Value) -> Result<Value, RemoteError> {
        self.send_lenient(self.request(Method::PATCH, url).json(body)).await
    }

    async fn send_lenient(&self, request: RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(bad_status(status));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

pub(super) fn bad_status(status: StatusCode) -> RemoteError {
    RemoteError::BadStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}
