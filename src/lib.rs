//! # Courier
//!
//! Registry-backed messaging event dispatcher. Accepts serverless-style HTTP
//! events and simulates connect, disconnect, message and status operations
//! against an in-memory registry of connected users.
//!
//! There is no push transport and no persistence: a message counts as
//! "delivered" when its recipient is present in the registry at call time,
//! and a restart forgets every connection.
//!
//! ## Modules
//!
//! - [`dispatch`]: Connection registry, event envelopes and the dispatcher
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use courier::dispatch::{Dispatcher, Event, InvocationContext};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = Dispatcher::with_defaults();
//!
//!     let connect = Event::post_json(&json!({"type": "connect", "userId": "alice"}));
//!     dispatcher.handle(&connect, &InvocationContext::generate()).await;
//!
//!     let message = Event::post_json(&json!({
//!         "type": "message", "from": "bob", "to": "alice", "text": "hi"
//!     }));
//!     let response = dispatcher.handle(&message, &InvocationContext::generate()).await;
//!
//!     assert_eq!(response.body_json().unwrap()["delivered"], true);
//! }
//! ```

pub mod api;
pub mod config;
pub mod dispatch;

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{
    Config, ConfigError, CorsConfig, DispatcherConfig, LoggingConfig, ServerConfig,
};

pub use dispatch::{
    ClientEvent, ConnectionRegistry, DispatchError, Dispatcher, Event, EventResponse,
    InvocationContext, RegistryError, ServerMessage,
};
