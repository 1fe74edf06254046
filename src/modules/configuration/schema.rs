use serde::Serialize;
use std::sync::Arc;

use crate::config::Settings;

#[derive(Debug, Serialize)]
pub struct ConfigurationResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Arc<Settings>,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationError {
    pub status: &'static str,
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
