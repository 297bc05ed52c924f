//! Event Dispatcher
//!
//! Branches on method, then on the POST body `type`, and answers every
//! event with exactly one response. Only connect and disconnect touch the
//! registry; everything else is a read or a plain echo.

use std::sync::Arc;

use super::error::{DispatchError, DispatchResult};
use super::event::{Event, EventResponse, InvocationContext};
use super::messages::{ClientEvent, ServerMessage, StatusReport};
use super::registry::ConnectionRegistry;
use crate::config::{CorsConfig, DispatcherConfig};

/// Status line of the GET report
pub const SERVER_RUNNING: &str = "server running";

/// Registry-backed event dispatcher
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    config: DispatcherConfig,
    cors: CorsConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, config: DispatcherConfig, cors: CorsConfig) -> Self {
        Self {
            registry,
            config,
            cors,
        }
    }

    /// Dispatcher over a fresh registry with default settings
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(ConnectionRegistry::new()),
            DispatcherConfig::default(),
            CorsConfig::default(),
        )
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn cors(&self) -> &CorsConfig {
        &self.cors
    }

    /// Handle one event
    ///
    /// Never fails: rejected events are answered with a 400 response.
    pub async fn handle(&self, event: &Event, ctx: &InvocationContext) -> EventResponse {
        match self.dispatch(event, ctx).await {
            Ok(response) => response,
            Err(e) => e.into_event_response(&ctx.request_id, &self.cors),
        }
    }

    async fn dispatch(&self, event: &Event, ctx: &InvocationContext) -> DispatchResult<EventResponse> {
        let method = event.method();
        tracing::debug!(request_id = %ctx.request_id, method = %method, "Dispatching event");

        match method.as_str() {
            "OPTIONS" => Ok(EventResponse::preflight(&self.cors)),
            "GET" => Ok(self.status_report().await),
            "POST" => {
                let body = event.json_body()?;
                let client_event = ClientEvent::from_body(&body).ok_or_else(|| {
                    DispatchError::InvalidData("unrecognised type or missing fields".to_string())
                })?;
                self.apply(client_event, ctx).await
            }
            other => Err(DispatchError::UnsupportedMethod(other.to_string())),
        }
    }

    async fn status_report(&self) -> EventResponse {
        let report = StatusReport {
            status: SERVER_RUNNING.to_string(),
            connections: self.registry.size().await,
            info: self.config.info.clone(),
        };
        EventResponse::json(200, &report, &self.cors)
    }

    async fn apply(&self, event: ClientEvent, ctx: &InvocationContext) -> DispatchResult<EventResponse> {
        tracing::debug!(request_id = %ctx.request_id, kind = event.kind(), "Applying client event");

        let reply = match event {
            ClientEvent::Connect { user_id } => {
                self.registry.set(&user_id, ctx.request_id.clone()).await?;
                ServerMessage::connected(user_id, ctx.request_id.clone())
            }
            ClientEvent::Disconnect { user_id } => {
                self.registry.remove(&user_id).await;
                ServerMessage::disconnected(user_id)
            }
            ClientEvent::Message {
                from,
                to,
                text,
                time,
            } => {
                let delivered = self.registry.contains(&to).await;
                tracing::debug!(from = %from, to = %to, delivered, "Message presence check");
                ServerMessage::message_sent(from, to, text, time, delivered)
            }
            ClientEvent::Status { status } => ServerMessage::status_updated(status),
        };

        Ok(EventResponse::json(200, &reply, &self.cors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::error::{MALFORMED_MESSAGE, UNSUPPORTED_MESSAGE};
    use serde_json::{json, Value};

    async fn send(dispatcher: &Dispatcher, event: Event) -> (u16, Value) {
        let ctx = InvocationContext::generate();
        let response = dispatcher.handle(&event, &ctx).await;
        let body = if response.body.is_empty() {
            Value::Null
        } else {
            response.body_json().unwrap()
        };
        (response.status_code, body)
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let dispatcher = Dispatcher::with_defaults();
        let response = dispatcher
            .handle(&Event::options(), &InvocationContext::generate())
            .await;

        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[tokio::test]
    async fn test_options_ignores_registry_and_body() {
        let dispatcher = Dispatcher::with_defaults();
        send(
            &dispatcher,
            Event::post_json(&json!({"type": "connect", "userId": "alice"})),
        )
        .await;

        let preflights = [
            Event::options(),
            Event::options().with_body("{garbage"),
            Event::options()
                .with_header("X-Session-Id", "s-1")
                .with_body(r#"{"type":"disconnect","userId":"alice"}"#),
        ];

        for event in preflights {
            let response = dispatcher
                .handle(&event, &InvocationContext::generate())
                .await;
            assert_eq!(response.status_code, 200);
            assert!(response.body.is_empty());
            assert_eq!(
                response.header("Access-Control-Allow-Methods"),
                Some("GET, POST, OPTIONS")
            );
        }

        assert!(dispatcher.registry().contains("alice").await);
        assert_eq!(dispatcher.registry().size().await, 1);
    }

    #[tokio::test]
    async fn test_get_status_report() {
        let dispatcher = Dispatcher::with_defaults();
        dispatcher.registry().set("alice", "c1").await.unwrap();
        dispatcher.registry().set("bob", "c2").await.unwrap();
        dispatcher.registry().set("alice", "c3").await.unwrap();

        let (status, body) = send(&dispatcher, Event::get()).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], SERVER_RUNNING);
        assert_eq!(body["connections"], 2);
        assert!(body["info"].is_string());
    }

    #[tokio::test]
    async fn test_connect_uses_request_id() {
        let dispatcher = Dispatcher::with_defaults();
        let ctx = InvocationContext::new("req-7");
        let event = Event::post_json(&json!({"type": "connect", "userId": "alice"}));

        let response = dispatcher.handle(&event, &ctx).await;
        let body = response.body_json().unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(body["type"], "connected");
        assert_eq!(body["userId"], "alice");
        assert_eq!(body["connectionId"], "req-7");
        assert_eq!(
            dispatcher.registry().get("alice").await.as_deref(),
            Some("req-7")
        );
    }

    #[tokio::test]
    async fn test_disconnect_unknown_user_succeeds() {
        let dispatcher = Dispatcher::with_defaults();
        let (status, body) = send(
            &dispatcher,
            Event::post_json(&json!({"type": "disconnect", "userId": "ghost"})),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["type"], "disconnected");
        assert_eq!(body["userId"], "ghost");
        assert_eq!(dispatcher.registry().size().await, 0);
    }

    #[tokio::test]
    async fn test_message_delivery_follows_presence() {
        let dispatcher = Dispatcher::with_defaults();
        let message = json!({"type": "message", "from": "bob", "to": "alice", "text": "hi", "time": "10:00"});

        send(
            &dispatcher,
            Event::post_json(&json!({"type": "connect", "userId": "alice"})),
        )
        .await;

        let (status, body) = send(&dispatcher, Event::post_json(&message)).await;
        assert_eq!(status, 200);
        assert_eq!(body["type"], "message_sent");
        assert_eq!(body["delivered"], true);
        assert_eq!(body["message"], "delivered");
        assert_eq!(body["text"], "hi");
        assert_eq!(body["time"], "10:00");

        let (status, _) = send(
            &dispatcher,
            Event::post_json(&json!({"type": "disconnect", "userId": "alice"})),
        )
        .await;
        assert_eq!(status, 200);

        let (_, body) = send(&dispatcher, Event::post_json(&message)).await;
        assert_eq!(body["delivered"], false);
        assert_eq!(body["message"], "recipient offline");
    }

    #[tokio::test]
    async fn test_message_does_not_touch_registry() {
        let dispatcher = Dispatcher::with_defaults();
        send(
            &dispatcher,
            Event::post_json(&json!({"type": "message", "from": "bob", "to": "alice"})),
        )
        .await;

        assert!(!dispatcher.registry().contains("bob").await);
        assert_eq!(dispatcher.registry().size().await, 0);
    }

    #[tokio::test]
    async fn test_status_echo() {
        let dispatcher = Dispatcher::with_defaults();
        let (status, body) = send(
            &dispatcher,
            Event::post_json(&json!({"type": "status", "status": "away"})),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["type"], "status_updated");
        assert_eq!(body["status"], "away");
    }

    #[tokio::test]
    async fn test_invalid_post_shapes_rejected() {
        let dispatcher = Dispatcher::with_defaults();
        let bodies = [
            json!({"type": "connect"}),
            json!({"type": "disconnect", "userId": ""}),
            json!({"type": "message", "from": "bob"}),
            json!({"type": "typing"}),
            json!({}),
        ];

        for body in bodies {
            let (status, response) = send(&dispatcher, Event::post_json(&body)).await;
            assert_eq!(status, 400, "body: {}", body);
            assert_eq!(response["error"], UNSUPPORTED_MESSAGE);
        }
        assert_eq!(dispatcher.registry().size().await, 0);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let dispatcher = Dispatcher::with_defaults();
        let (status, body) = send(&dispatcher, Event::new("DELETE")).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], UNSUPPORTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let dispatcher = Dispatcher::with_defaults();
        let (status, body) = send(&dispatcher, Event::new("POST").with_body("{oops")).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], MALFORMED_MESSAGE);
    }

    #[tokio::test]
    async fn test_custom_info_and_origin() {
        let dispatcher = Dispatcher::new(
            Arc::new(ConnectionRegistry::new()),
            DispatcherConfig {
                info: "poll over HTTP".to_string(),
            },
            CorsConfig {
                allow_origin: "https://chat.example.com".to_string(),
                ..Default::default()
            },
        );

        let response = dispatcher
            .handle(&Event::get(), &InvocationContext::generate())
            .await;
        assert_eq!(response.body_json().unwrap()["info"], "poll over HTTP");
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("https://chat.example.com")
        );
    }
}
