//! Serverless Event Envelope
//!
//! Request and response envelopes in the shape a function runtime hands
//! to the dispatcher: `httpMethod`, `headers`, `body`, `isBase64Encoded` in,
//! `statusCode`, `headers`, `isBase64Encoded`, `body` out.

use base64::engine::general_purpose::STANDARD as Base64Standard;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use super::error::{DispatchError, DispatchResult};
use crate::config::CorsConfig;

/// Inbound request envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// HTTP method; a missing method is treated as GET
    #[serde(default)]
    pub http_method: Option<String>,
    /// Request headers; null or non-string values are tolerated
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: HashMap<String, String>,
    /// Raw request body; a missing body is treated as `{}`
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub request_context: Option<RequestContext>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Runtimes send `"headers": null` or numeric header values; keep what can
/// be read as text.
fn deserialize_headers<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name, s)),
            Value::Null => None,
            other => Some((name, other.to_string())),
        })
        .collect())
}

/// Runtime-supplied request metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub request_id: Option<String>,
}

impl Event {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            http_method: Some(method.into()),
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new("GET")
    }

    pub fn options() -> Self {
        Self::new("OPTIONS")
    }

    /// POST event carrying a JSON body
    pub fn post_json(body: &Value) -> Self {
        Self::new("POST").with_body(body.to_string())
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Effective HTTP method, upper-cased
    pub fn method(&self) -> String {
        self.http_method
            .as_deref()
            .unwrap_or("GET")
            .to_ascii_uppercase()
    }

    /// Body text, base64-decoded when flagged
    pub fn body_text(&self) -> DispatchResult<Cow<'_, str>> {
        let Some(body) = self.body.as_deref() else {
            return Ok(Cow::Borrowed("{}"));
        };

        if !self.is_base64_encoded {
            return Ok(Cow::Borrowed(body));
        }

        let bytes = Base64Standard
            .decode(body)
            .map_err(|e| DispatchError::MalformedInput(format!("invalid base64 body: {}", e)))?;

        String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|e| DispatchError::MalformedInput(format!("body is not UTF-8: {}", e)))
    }

    /// Body parsed as JSON
    pub fn json_body(&self) -> DispatchResult<Value> {
        let text = self.body_text()?;
        serde_json::from_str(&text).map_err(|e| DispatchError::MalformedInput(e.to_string()))
    }
}

/// Per-invocation context
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Request id; doubles as the connection id on connect
    pub request_id: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Context with a freshly generated request id
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Use the runtime's request id when the event carries one
    pub fn for_event(event: &Event) -> Self {
        event
            .request_context
            .as_ref()
            .and_then(|ctx| ctx.request_id.as_deref())
            .filter(|id| !id.is_empty())
            .map(Self::new)
            .unwrap_or_else(Self::generate)
    }
}

/// Outbound response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub is_base64_encoded: bool,
    pub body: String,
}

impl EventResponse {
    /// JSON response with CORS origin header
    pub fn json<T: Serialize>(status_code: u16, payload: &T, cors: &CorsConfig) -> Self {
        let (status_code, body) = match serde_json::to_string(payload) {
            Ok(body) => (status_code, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                (500, r#"{"error":"internal error"}"#.to_string())
            }
        };

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            cors.allow_origin.clone(),
        );

        Self {
            status_code,
            headers,
            is_base64_encoded: false,
            body,
        }
    }

    /// CORS preflight reply with an empty body
    pub fn preflight(cors: &CorsConfig) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            cors.allow_origin.clone(),
        );
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            cors.allow_methods.join(", "),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            cors.allow_headers.join(", "),
        );
        headers.insert(
            "Access-Control-Max-Age".to_string(),
            cors.max_age_secs.to_string(),
        );

        Self {
            status_code: 200,
            headers,
            is_base64_encoded: false,
            body: String::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_method_defaults_to_get() {
        let event = Event::default();
        assert_eq!(event.method(), "GET");
        assert_eq!(Event::new("post").method(), "POST");
    }

    #[test]
    fn test_missing_body_is_empty_object() {
        let event = Event::new("POST");
        assert_eq!(event.json_body().unwrap(), json!({}));
    }

    #[test]
    fn test_base64_body_decoded() {
        let encoded = Base64Standard.encode(r#"{"type":"status"}"#);
        let event = Event {
            http_method: Some("POST".to_string()),
            body: Some(encoded),
            is_base64_encoded: true,
            ..Default::default()
        };
        assert_eq!(event.json_body().unwrap(), json!({"type": "status"}));
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let event = Event {
            body: Some("not base64!!".to_string()),
            is_base64_encoded: true,
            ..Default::default()
        };
        assert!(matches!(
            event.json_body(),
            Err(DispatchError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let event = Event::new("POST").with_body("{not json");
        assert!(matches!(
            event.json_body(),
            Err(DispatchError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_deserialize_envelope() {
        let raw = r#"{
            "httpMethod": "POST",
            "headers": {"Content-Type": "application/json"},
            "body": "{\"type\":\"connect\",\"userId\":\"alice\"}",
            "isBase64Encoded": false,
            "requestContext": {"requestId": "req-42"}
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.method(), "POST");
        assert_eq!(InvocationContext::for_event(&event).request_id, "req-42");
    }

    #[test]
    fn test_deserialize_envelope_with_nulls() {
        let raw = r#"{
            "httpMethod": "GET",
            "headers": null,
            "body": null,
            "isBase64Encoded": null,
            "requestContext": null
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();

        assert_eq!(event.method(), "GET");
        assert!(event.headers.is_empty());
        assert!(!event.is_base64_encoded);
        assert_eq!(event.json_body().unwrap(), json!({}));
    }

    #[test]
    fn test_non_string_header_values() {
        let raw = r#"{"headers": {"Content-Length": 17, "X-Trace": null, "Host": "fn.local"}}"#;
        let event: Event = serde_json::from_str(raw).unwrap();

        assert_eq!(event.headers.get("Content-Length").map(String::as_str), Some("17"));
        assert_eq!(event.headers.get("Host").map(String::as_str), Some("fn.local"));
        assert!(!event.headers.contains_key("X-Trace"));
    }

    #[test]
    fn test_context_generated_without_request_id() {
        let ctx = InvocationContext::for_event(&Event::get());
        assert!(uuid::Uuid::parse_str(&ctx.request_id).is_ok());
    }

    #[test]
    fn test_preflight_headers() {
        let response = EventResponse::preflight(&CorsConfig::default());
        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(response.header("Access-Control-Max-Age"), Some("86400"));
        assert_eq!(response.header("Content-Type"), None);
    }

    #[test]
    fn test_serialize_response_envelope() {
        let response = EventResponse::json(200, &json!({"ok": true}), &CorsConfig::default());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["isBase64Encoded"], false);
        assert_eq!(value["headers"]["Content-Type"], "application/json");
        assert_eq!(value["body"], r#"{"ok":true}"#);
    }
}
