//! Dispatch Route
//!
//! `ANY /` - the dispatcher served over plain HTTP. Each request is adapted
//! into an event with a fresh request id, and the event response is sent
//! back as-is (status, headers, body).

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::adapter::event_from_http;
use crate::api::state::AppState;
use crate::dispatch::{DispatchError, InvocationContext};

/// ANY /
///
/// Bodies over `max_body_bytes` are rejected as malformed input, so the
/// caller still gets the dispatcher's 400 with CORS headers.
pub async fn dispatch_http(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let ctx = InvocationContext::generate();

    let body = match axum::body::to_bytes(body, state.config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return DispatchError::MalformedInput(format!(
                "request body unreadable or over {} bytes: {}",
                state.config.max_body_bytes, e
            ))
            .into_event_response(&ctx.request_id, state.dispatcher.cors())
            .into_response();
        }
    };

    let event = event_from_http(&method, &headers, &body);

    state.dispatcher.handle(&event, &ctx).await.into_response()
}

/// Attach the configured origin to replies the dispatcher did not build
/// (timeouts and other middleware rejections).
pub async fn ensure_cors(State(state): State<Arc<AppState>>, mut response: Response) -> Response {
    if response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    {
        return response;
    }

    match HeaderValue::from_str(&state.dispatcher.cors().allow_origin) {
        Ok(origin) => {
            response
                .headers_mut()
                .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        Err(e) => tracing::warn!(error = %e, "Configured CORS origin is not a valid header value"),
    }

    response
}
