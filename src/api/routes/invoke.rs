//! Invoke Route
//!
//! `POST /invoke` - accepts a raw serverless event envelope and returns the
//! response envelope as JSON, the way a function runtime would call the
//! handler. The runtime's `requestContext.requestId` is honoured when
//! present.

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dispatch::{Event, EventResponse, InvocationContext};

/// POST /invoke
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<EventResponse>> {
    let event: Event = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid event envelope: {}", e)))?;

    let ctx = InvocationContext::for_event(&event);
    tracing::debug!(request_id = %ctx.request_id, "Invoking dispatcher");

    Ok(Json(state.dispatcher.handle(&event, &ctx).await))
}
