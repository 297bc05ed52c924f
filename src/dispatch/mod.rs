//! Registry-Backed Event Dispatcher
//!
//! Simulates a messaging backend on top of serverless request/response
//! events. There is no push transport: "delivery" only means the recipient
//! is present in the connection registry at call time.
//!
//! ## Architecture
//!
//! - **ConnectionRegistry**: user id → connection id, guarded by a lock
//! - **Dispatcher**: method and body-type branching over the registry
//! - **Event / EventResponse**: the serverless envelopes
//! - **Messages**: recognised POST bodies and their replies
//!
//! ## Events
//!
//! | Method  | Body `type`  | Required fields | Reply `type`     |
//! |---------|--------------|-----------------|------------------|
//! | OPTIONS |              |                 | preflight        |
//! | GET     |              |                 | status report    |
//! | POST    | `connect`    | `userId`        | `connected`      |
//! | POST    | `disconnect` | `userId`        | `disconnected`   |
//! | POST    | `message`    | `from`, `to`    | `message_sent`   |
//! | POST    | `status`     |                 | `status_updated` |
//!
//! Anything else is answered with a 400.

mod error;
mod event;
mod handler;
mod messages;
mod registry;

pub use error::{DispatchError, DispatchResult, MALFORMED_MESSAGE, UNSUPPORTED_MESSAGE};
pub use event::{Event, EventResponse, InvocationContext, RequestContext};
pub use handler::{Dispatcher, SERVER_RUNNING};
pub use messages::{ClientEvent, ErrorMessage, ServerMessage, StatusReport};
pub use registry::{Connection, ConnectionId, ConnectionRegistry, RegistryError};
