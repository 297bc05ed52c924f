//! Dispatch error types
//!
//! Every dispatch failure becomes a 400 event response; none of them are
//! retried and none leave state behind.

use thiserror::Error;

use super::event::EventResponse;
use super::messages::ErrorMessage;
use super::registry::RegistryError;
use crate::config::CorsConfig;

/// Body text for unsupported methods and unrecognised POST bodies
pub const UNSUPPORTED_MESSAGE: &str = "unsupported method or invalid data";

/// Body text for bodies that are not valid JSON
pub const MALFORMED_MESSAGE: &str = "malformed request body";

/// Errors that can occur while dispatching an event
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Method other than GET, POST or OPTIONS
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// POST body with unknown type or missing required fields
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Body is not valid JSON (or not decodable)
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        DispatchError::InvalidData(err.to_string())
    }
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            DispatchError::InvalidData(_) => "INVALID_DATA",
            DispatchError::MalformedInput(_) => "MALFORMED_INPUT",
        }
    }

    /// Convert into the 400 response the caller sees
    pub fn into_event_response(self, request_id: &str, cors: &CorsConfig) -> EventResponse {
        tracing::warn!(
            request_id = %request_id,
            error_code = %self.code(),
            error_message = %self,
            "Rejected event"
        );

        let error = match self {
            DispatchError::MalformedInput(_) => MALFORMED_MESSAGE,
            DispatchError::UnsupportedMethod(_) | DispatchError::InvalidData(_) => {
                UNSUPPORTED_MESSAGE
            }
        };

        EventResponse::json(
            400,
            &ErrorMessage {
                error: error.to_string(),
            },
            cors,
        )
    }
}

/// Result type alias for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;
