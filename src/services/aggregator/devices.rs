use serde_json::{json, Map, Value};

use super::fanout::{fan_out, FanOutOptions, PeerFailure, PeerOutcome};
use crate::config::{Peer, Settings};
use crate::services::remote::{RemoteClient, RemoteError};

/// Fetch `instanceInfo` from every configured device.
pub async fn fetch_device_info(
    remote: &RemoteClient,
    settings: &Settings,
    options: FanOutOptions,
) -> Vec<PeerOutcome<Map<String, Value>>> {
    let path = settings.api_path("instanceInfo").to_string();
    let remote = remote.clone();

    fan_out(settings.device_peers().to_vec(), options, move |peer: Peer| {
        let remote = remote.clone();
        let url = format!("{}{}", peer.url, path);
        async move {
            match remote.get_json(&url).await? {
                Value::Object(map) => Ok(map),
                other => Err(PeerFailure::from(RemoteError::BadPayload(format!(
                    "expected a JSON object, got {}",
                    json_type(&other)
                )))),
            }
        }
    })
    .await
}

/// Shape one outcome for `minerData`: the device payload tagged with its id,
/// or an error stub the dashboard renders as an offline card.
pub fn device_entry(outcome: PeerOutcome<Map<String, Value>>) -> Value {
    match outcome.result {
        Ok(mut data) => {
            data.insert("id".to_string(), Value::String(outcome.peer));
            Value::Object(data)
        }
        Err(failure) => json!({
            "id": outcome.peer,
            "hostname": outcome.peer,
            "status": "Error",
            "message": failure.message,
        }),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

