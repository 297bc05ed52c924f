//! Data Transfer Objects
//!
//! Response types for the API's own endpoints. Dispatcher payloads live in
//! [`crate::dispatch`].

use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy"
    pub status: String,
    /// Users currently in the connection registry
    pub connections: usize,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
