//! Wire types for the W3C WebDriver HTTP protocol.
//!
//! Every response body is wrapped in a `{"value": ...}` envelope; errors use
//! the same envelope with `error`/`message` fields. Element references are
//! objects keyed by the W3C-defined identifier [`ELEMENT_KEY`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Key under which the remote end returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// `{"value": T}` envelope used by every WebDriver response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub value: T,
}

/// Error payload carried in the envelope of non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Body of `POST /session`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    #[serde(rename = "alwaysMatch")]
    pub always_match: Value,
}

impl NewSessionRequest {
    /// Chrome session, optionally headless, with a fixed window size so
    /// layouts stay comparable across runs.
    pub fn chrome(headless: bool) -> Self {
        let mut args = vec!["--window-size=1400,1000".to_string()];
        if headless {
            args.push("--headless=new".to_string());
        }
        Self {
            capabilities: Capabilities {
                always_match: json!({
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args },
                }),
            },
        }
    }
}

/// `value` of a successful `POST /session`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Body of the element-finding endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct FindRequest {
    pub using: &'static str,
    pub value: String,
}

/// Body of `POST .../execute/sync`.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRequest {
    pub script: String,
    pub args: Vec<Value>,
}

/// Serialises an element id as a script argument.
pub fn element_arg(id: &str) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(ELEMENT_KEY.to_string(), Value::String(id.to_string()));
    Value::Object(map)
}

/// Extracts the element id from a wire element reference.
pub fn element_id(value: &Value) -> Option<String> {
    value.get(ELEMENT_KEY)?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_session_request_carries_flag() {
        let req = NewSessionRequest::chrome(true);
        let json = serde_json::to_value(&req).unwrap();
        let args = &json["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];
        assert!(
            args.as_array()
                .unwrap()
                .iter()
                .any(|a| a == "--headless=new")
        );
        assert_eq!(json["capabilities"]["alwaysMatch"]["browserName"], "chrome");
    }

    #[test]
    fn element_reference_uses_w3c_key() {
        let arg = element_arg("abc");
        assert_eq!(element_id(&arg).as_deref(), Some("abc"));
        assert!(element_id(&json!({"ELEMENT": "legacy"})).is_none());
    }

    #[test]
    fn error_envelope_deserializes() {
        let body = r#"{"value":{"error":"no such element","message":"Unable to locate","stacktrace":""}}"#;
        let env: Envelope<WireError> = serde_json::from_str(body).unwrap();
        assert_eq!(env.value.error, "no such element");
        assert_eq!(env.value.message, "Unable to locate");
    }

    #[test]
    fn new_session_deserializes_session_id() {
        let body = r#"{"value":{"sessionId":"s-1","capabilities":{}}}"#;
        let env: Envelope<NewSession> = serde_json::from_str(body).unwrap();
        assert_eq!(env.value.session_id, "s-1");
    }
}
