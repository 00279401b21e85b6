//! Action codec
//!
//! Requests are `{"<Action>": {"<Param>": "<Value>", ...}}`, responses are
//! `{"<Action>Response": {"<Action>Result": "OK", ...fields}}`.

use crate::constants::{RESULT_OK, SOAP_NAMESPACE};
use crate::error::{HnapError, Result, ValidationFailure};
use serde::Serialize;
use serde_json::{Map, Value};

/// Quoted action URI as carried in the `SOAPAction` header
pub fn action_uri(action: &str) -> String {
    format!("\"{SOAP_NAMESPACE}/{action}\"")
}

/// Key holding the response payload of `action`
pub fn response_key(action: &str) -> String {
    format!("{action}Response")
}

/// Key holding the result marker of `action` inside its response payload
pub fn result_key(action: &str) -> String {
    format!("{action}Result")
}

/// Pretty JSON rendering used in error payloads
pub fn pretty<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
}

/// A named action and its string parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    action: String,
    params: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: Map::new(),
        }
    }

    /// Add a string parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Serialize into the wire envelope
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(&self.action, &self.params)
    }
}

/// The unwrapped result map of a successful action
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ActionResult(Map<String, Value>);

impl ActionResult {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A string field of the result, failing validation if absent or not a string
    pub fn string_field(&self, action: &str, key: &str) -> Result<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| HnapError::Validation {
                action: action.to_string(),
                failure: ValidationFailure::MissingResultKey(key.to_string()),
                payload: pretty(&self.0),
            })
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ActionResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Wrap `params` under `action` and serialize
pub fn encode(action: &str, params: &Map<String, Value>) -> Result<Vec<u8>> {
    let mut envelope = Map::with_capacity(1);
    envelope.insert(action.to_string(), Value::Object(params.clone()));
    serde_json::to_vec(&envelope).map_err(|source| HnapError::Codec {
        action: action.to_string(),
        source,
    })
}

/// Parse a response body and unwrap the result of `action`
pub fn decode(action: &str, bytes: &[u8]) -> Result<ActionResult> {
    let envelope: Map<String, Value> = serde_json::from_slice(bytes).map_err(|source| HnapError::Codec {
        action: action.to_string(),
        source,
    })?;
    unpack(action, envelope)
}

/// Validate the response envelope of `action` and return its result map
pub fn unpack(action: &str, mut envelope: Map<String, Value>) -> Result<ActionResult> {
    let invalid = |failure, payload: String| HnapError::Validation {
        action: action.to_string(),
        failure,
        payload,
    };

    if envelope.len() != 1 {
        return Err(invalid(ValidationFailure::KeyCount(envelope.len()), pretty(&envelope)));
    }

    let resp_key = response_key(action);
    let Some(unpacked) = envelope.remove(&resp_key) else {
        return Err(invalid(ValidationFailure::MissingResponseKey(resp_key), pretty(&envelope)));
    };
    let unpacked = match unpacked {
        Value::Object(map) => map,
        other => return Err(invalid(ValidationFailure::NotAnObject(resp_key), pretty(&other))),
    };

    check_result(action, &unpacked)?;
    Ok(ActionResult(unpacked))
}

/// Check that `unpacked` carries `<action>Result: "OK"`
pub fn check_result(action: &str, unpacked: &Map<String, Value>) -> Result<()> {
    let key = result_key(action);
    let failure = match unpacked.get(&key) {
        None => ValidationFailure::MissingResultKey(key),
        Some(Value::String(s)) if s == RESULT_OK => return Ok(()),
        Some(Value::String(s)) => ValidationFailure::NotOk(s.clone()),
        Some(other) => ValidationFailure::NotOk(other.to_string()),
    };
    Err(HnapError::Validation {
        action: action.to_string(),
        failure,
        payload: pretty(unpacked),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn failure_of(result: Result<ActionResult>) -> ValidationFailure {
        match result {
            Err(HnapError::Validation { failure, .. }) => failure,
            Err(other) => panic!("expected validation error, got: {other:?}"),
            Ok(r) => panic!("expected validation error, got: {r:?}"),
        }
    }

    #[test]
    fn test_action_uri_and_keys() {
        assert_eq!(action_uri("Login"), "\"http://purenetworks.com/HNAP1/Login\"");
        assert_eq!(response_key("Login"), "LoginResponse");
        assert_eq!(result_key("Login"), "LoginResult");
    }

    #[test]
    fn test_encode_wraps_single_action() {
        let bytes = ActionRequest::new("Login")
            .param("Action", "request")
            .param("Username", "admin")
            .encode()
            .unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, json!({"Login": {"Action": "request", "Username": "admin"}}));
    }

    #[test]
    fn test_decode_roundtrip_fields_unchanged() {
        let body = json!({
            "LoginResponse": {
                "LoginResult": "OK",
                "Challenge": "abc",
                "PublicKey": "def",
                "Cookie": "123"
            }
        });
        let result = decode("Login", body.to_string().as_bytes()).unwrap();
        assert_eq!(result.get("Challenge"), Some(&json!("abc")));
        assert_eq!(result.string_field("Login", "PublicKey").unwrap(), "def");
        assert_eq!(result.string_field("Login", "Cookie").unwrap(), "123");
        assert_eq!(result.as_map().len(), 4);
    }

    #[test]
    fn test_decode_malformed_is_codec_error() {
        let err = decode("Login", b"{not json").unwrap_err();
        assert!(matches!(err, HnapError::Codec { ref action, .. } if action == "Login"));

        let err = decode("Login", b"[1, 2]").unwrap_err();
        assert!(matches!(err, HnapError::Codec { .. }));
    }

    #[test]
    fn test_unpack_empty_envelope() {
        let err = unpack("Foo", Map::new()).unwrap_err();
        assert!(err.to_string().contains("invalid number of keys"), "{err}");
    }

    #[test]
    fn test_unpack_two_keys() {
        let env = envelope(json!({
            "FooResponse": {"FooResult": "OK"},
            "BarResponse": {"BarResult": "OK"}
        }));
        assert_eq!(failure_of(unpack("Foo", env)), ValidationFailure::KeyCount(2));
    }

    #[test]
    fn test_unpack_missing_response_key() {
        let env = envelope(json!({"BarResponse": {"FooResult": "OK"}}));
        assert_eq!(
            failure_of(unpack("Foo", env)),
            ValidationFailure::MissingResponseKey("FooResponse".to_string())
        );
    }

    #[test]
    fn test_unpack_missing_result_key() {
        let env = envelope(json!({"FooResponse": {"BarResult": "OK"}}));
        let err = unpack("Foo", env).unwrap_err();
        assert!(err.to_string().contains("unable to find the result key FooResult"), "{err}");
        assert!(err.to_string().contains("BarResult"), "payload should be included: {err}");
    }

    #[test]
    fn test_unpack_result_not_ok() {
        let env = envelope(json!({"FooResponse": {"FooResult": "FAILED"}}));
        assert_eq!(
            failure_of(unpack("Foo", env)),
            ValidationFailure::NotOk("FAILED".to_string())
        );
    }

    #[test]
    fn test_unpack_response_not_object() {
        let env = envelope(json!({"FooResponse": "OK"}));
        assert_eq!(
            failure_of(unpack("Foo", env)),
            ValidationFailure::NotAnObject("FooResponse".to_string())
        );
    }
}
