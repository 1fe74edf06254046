use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct NamedUrl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Setup form submission. The form posts booleans and numbers as strings.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub port: String,

    #[serde(default, deserialize_with = "loose_bool")]
    pub enable_auth: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub jwt_key: String,
    #[serde(default)]
    pub jwt_expiry: String,

    #[serde(default, alias = "axeosInstances")]
    pub bitaxe_instances: Vec<NamedUrl>,

    #[serde(default, deserialize_with = "loose_bool")]
    pub enable_mining_core: bool,
    #[serde(default)]
    pub mining_core_instances: Vec<NamedUrl>,

    #[serde(default, deserialize_with = "loose_bool")]
    pub enable_crypto_node: bool,
    #[serde(default)]
    pub crypto_node_type: String,
    #[serde(default)]
    pub crypto_node_name: String,
    #[serde(default)]
    pub crypto_node_algo: String,
    #[serde(default)]
    pub crypto_node_id: String,
    #[serde(default)]
    pub crypto_node_rpc_ip: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub crypto_node_rpc_port: String,
    #[serde(default)]
    pub crypto_node_rpc_auth: String,
}

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub success: bool,
    pub message: String,
}

impl BootstrapResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Bool(b)) => b,
        Some(Loose::Text(s)) => s.eq_ignore_ascii_case("true") || s == "on" || s == "1",
        Some(Loose::Number(n)) => n.as_i64() == Some(1),
        None => false,
    })
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::Number(n)) => n.to_string(),
        Some(Loose::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}
