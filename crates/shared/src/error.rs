use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Failure of a remote call. The payload is kept opaque; callers only ever
/// look for a nested `body.message` and otherwise render the whole payload.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(transparent)]
#[error("remote call failed: {}", display_text(.payload))]
pub struct RemoteError {
    payload: Value,
}

impl RemoteError {
    pub fn from_payload(payload: Value) -> Self {
        Self { payload }
    }

    /// Failure before any response arrived (connect, decode, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::from_payload(json!({
            "status": 0,
            "body": { "message": message.into() },
        }))
    }

    /// Non-success HTTP status. A JSON body is kept verbatim, anything else is
    /// wrapped as `{"message": <text>}`.
    pub fn http_status(status: u16, raw_body: &str) -> Self {
        let body = serde_json::from_str::<Value>(raw_body)
            .unwrap_or_else(|_| json!({ "message": raw_body }));
        Self::from_payload(json!({ "status": status, "body": body }))
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn nested_message(&self) -> Option<&str> {
        nested_message(&self.payload)
    }

    /// Best available display text: `body.message`, else the serialized payload.
    pub fn message(&self) -> String {
        display_text(&self.payload)
    }
}

fn nested_message(payload: &Value) -> Option<&str> {
    payload
        .get("body")
        .and_then(|body| body.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
}

fn display_text(payload: &Value) -> String {
    match nested_message(payload) {
        Some(message) => message.to_string(),
        None => payload.to_string(),
    }
}
