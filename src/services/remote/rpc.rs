use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{bad_status, RemoteClient, RemoteError};
use crate::config::RpcEndpoint;

const RPC_REQUEST_ID: &str = "rig-dashboard";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObj>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObj {
    code: i64,
    message: String,
}

impl RemoteClient {
    /// JSON-RPC 2.0 call with Basic auth taken from the endpoint's `user:password`.
    pub async fn rpc_call(
        &self,
        endpoint: &RpcEndpoint,
        method: &str,
        params: Value,
    ) -> Result<Value, RemoteError> {
        let payload = RpcRequest {
            jsonrpc: "2.0",
            id: RPC_REQUEST_ID,
            method,
            params,
        };

        let mut request = self.request(Method::POST, &endpoint.url()).json(&payload);
        if let Some((username, password)) = endpoint.credentials() {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        // Nodes reject bad credentials with an empty body.
        if body.is_empty() {
            return Err(RemoteError::BadPayload(format!(
                "empty response from node (HTTP {}), check rpc credentials",
                status.as_u16()
            )));
        }

        let parsed: RpcResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(bad_status(status)),
            Err(e) => return Err(RemoteError::BadPayload(e.to_string())),
        };

        if let Some(err) = parsed.error {
            return Err(RemoteError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        if !status.is_success() {
            return Err(bad_status(status));
        }

        Ok(parsed.result.unwrap_or(Value::Null))
    }
}
