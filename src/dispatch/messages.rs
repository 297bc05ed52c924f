//! Dispatcher Message Types
//!
//! Inbound POST bodies and the JSON payloads the dispatcher answers with.

use serde::Serialize;
use serde_json::Value;

/// A recognised POST body
///
/// Built from an already-parsed JSON value. Bodies with an unknown `type`
/// or missing required fields do not produce a `ClientEvent`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Register the user in the connection registry
    Connect { user_id: String },
    /// Drop the user from the connection registry
    Disconnect { user_id: String },
    /// Check recipient presence; nothing is actually sent
    Message {
        from: String,
        to: String,
        text: Value,
        time: Value,
    },
    /// Echo a status update
    Status { status: Value },
}

impl ClientEvent {
    /// Interpret a JSON body
    ///
    /// `userId`, `from` and `to` must be non-empty strings. `text` and `time`
    /// default to an empty string, `status` to null.
    pub fn from_body(body: &Value) -> Option<Self> {
        let kind = body.get("type")?.as_str()?;

        match kind {
            "connect" => Some(ClientEvent::Connect {
                user_id: non_empty_str(body, "userId")?,
            }),
            "disconnect" => Some(ClientEvent::Disconnect {
                user_id: non_empty_str(body, "userId")?,
            }),
            "message" => Some(ClientEvent::Message {
                from: non_empty_str(body, "from")?,
                to: non_empty_str(body, "to")?,
                text: field_or_empty(body, "text"),
                time: field_or_empty(body, "time"),
            }),
            "status" => Some(ClientEvent::Status {
                status: body.get("status").cloned().unwrap_or(Value::Null),
            }),
            _ => None,
        }
    }

    /// Name of the event type, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::Connect { .. } => "connect",
            ClientEvent::Disconnect { .. } => "disconnect",
            ClientEvent::Message { .. } => "message",
            ClientEvent::Status { .. } => "status",
        }
    }
}

fn non_empty_str(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn field_or_empty(body: &Value, key: &str) -> Value {
    body.get(key)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Replies to recognised POST bodies
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// User registered
    Connected {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "connectionId")]
        connection_id: String,
        message: String,
    },
    /// User removed (or was never there)
    Disconnected {
        #[serde(rename = "userId")]
        user_id: String,
        message: String,
    },
    /// Result of a message presence check
    MessageSent {
        from: String,
        to: String,
        text: Value,
        time: Value,
        delivered: bool,
        message: String,
    },
    /// Echoed status
    StatusUpdated { status: Value, message: String },
}

impl ServerMessage {
    pub fn connected(user_id: String, connection_id: String) -> Self {
        ServerMessage::Connected {
            user_id,
            connection_id,
            message: "connected".to_string(),
        }
    }

    pub fn disconnected(user_id: String) -> Self {
        ServerMessage::Disconnected {
            user_id,
            message: "disconnected".to_string(),
        }
    }

    pub fn message_sent(from: String, to: String, text: Value, time: Value, delivered: bool) -> Self {
        let message = if delivered {
            "delivered"
        } else {
            "recipient offline"
        };

        ServerMessage::MessageSent {
            from,
            to,
            text,
            time,
            delivered,
            message: message.to_string(),
        }
    }

    pub fn status_updated(status: Value) -> Self {
        ServerMessage::StatusUpdated {
            status,
            message: "status updated".to_string(),
        }
    }
}

/// Body of the GET status report
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: String,
    pub connections: usize,
    pub info: String,
}

/// Body of every 400 response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub error: String,
}
