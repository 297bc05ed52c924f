//! HTTP ⇄ Event Adapter
//!
//! Turns a plain HTTP request into the serverless event the dispatcher
//! expects, and an event response back into an HTTP response.

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD as Base64Standard;
use base64::Engine;

use crate::dispatch::{Event, EventResponse};

/// Build an event from HTTP request parts
///
/// Non-UTF-8 bodies are passed on base64-encoded, the way a function
/// runtime would.
pub fn event_from_http(method: &Method, headers: &HeaderMap, body: &Bytes) -> Event {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => (Some(text.to_string()), false),
            Err(_) => (Some(Base64Standard.encode(body)), true),
        }
    };

    Event {
        http_method: Some(method.as_str().to_string()),
        headers,
        body,
        is_base64_encoded,
        request_context: None,
    }
}

impl IntoResponse for EventResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if self.is_base64_encoded {
            match Base64Standard.decode(&self.body) {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    tracing::error!(error = %e, "Event response body is not valid base64");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        } else {
            Body::from(self.body)
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;

        let response_headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response_headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}
