//! Connection Registry
//!
//! Tracks which users are currently considered connected and through which
//! connection identifier. Entries are created on `connect` and removed on
//! `disconnect`; nothing else ever evicts them.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Opaque identifier handed out on connect
pub type ConnectionId = String;

/// A single registry entry
#[derive(Debug, Clone)]
pub struct Connection {
    /// Connection identifier associated with the user
    pub connection_id: ConnectionId,
    /// When the user last connected
    pub connected_at: DateTime<Utc>,
}

/// In-memory mapping of user ids to connection ids
///
/// Shared across concurrent requests; all access goes through the lock.
/// Growth is unbounded if clients never disconnect.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Active connections: user id → Connection
    connections: RwLock<HashMap<String, Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite the connection for a user
    pub async fn set(
        &self,
        user_id: &str,
        connection_id: impl Into<ConnectionId>,
    ) -> Result<(), RegistryError> {
        if user_id.is_empty() {
            return Err(RegistryError::EmptyUserId);
        }

        let connection = Connection {
            connection_id: connection_id.into(),
            connected_at: Utc::now(),
        };
        let connection_id = connection.connection_id.clone();

        let previous = self
            .connections
            .write()
            .await
            .insert(user_id.to_string(), connection);

        match previous {
            Some(old) => tracing::info!(
                user_id = %user_id,
                connection_id = %connection_id,
                replaced = %old.connection_id,
                "User reconnected"
            ),
            None => tracing::info!(
                user_id = %user_id,
                connection_id = %connection_id,
                "User connected"
            ),
        }

        Ok(())
    }

    /// Remove a user's connection
    ///
    /// Returns true if the user was connected. Removing an unknown user is
    /// not an error.
    pub async fn remove(&self, user_id: &str) -> bool {
        let removed = self.connections.write().await.remove(user_id);

        match removed {
            Some(connection) => {
                let session_secs = (Utc::now() - connection.connected_at).num_seconds();
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %connection.connection_id,
                    session_secs,
                    "User disconnected"
                );
                true
            }
            None => {
                tracing::debug!(user_id = %user_id, "Disconnect for unknown user ignored");
                false
            }
        }
    }

    /// Look up the connection id for a user
    pub async fn get(&self, user_id: &str) -> Option<ConnectionId> {
        self.connections
            .read()
            .await
            .get(user_id)
            .map(|c| c.connection_id.clone())
    }

    /// Check whether a user is currently connected
    pub async fn contains(&self, user_id: &str) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    /// Number of connected users
    pub async fn size(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// Errors raised by the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("User id must not be empty")]
    EmptyUserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_remove() {
        let registry = ConnectionRegistry::new();

        registry.set("alice", "conn-1").await.unwrap();
        assert!(registry.contains("alice").await);
        assert_eq!(registry.get("alice").await.as_deref(), Some("conn-1"));
        assert_eq!(registry.size().await, 1);

        assert!(registry.remove("alice").await);
        assert!(!registry.contains("alice").await);
        assert_eq!(registry.get("alice").await, None);
        assert_eq!(registry.size().await, 0);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let registry = ConnectionRegistry::new();

        registry.set("alice", "conn-1").await.unwrap();
        registry.set("alice", "conn-2").await.unwrap();

        assert_eq!(registry.get("alice").await.as_deref(), Some("conn-2"));
        assert_eq!(registry.size().await, 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.set("bob", "conn-1").await.unwrap();

        assert!(!registry.remove("alice").await);
        assert_eq!(registry.size().await, 1);
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected() {
        let registry = ConnectionRegistry::new();

        let result = registry.set("", "conn-1").await;
        assert!(matches!(result, Err(RegistryError::EmptyUserId)));
        assert_eq!(registry.size().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_connects() {
        let registry = std::sync::Arc::new(ConnectionRegistry::new());

        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = std::sync::Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .set(&format!("user-{}", i), format!("conn-{}", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.size().await, 32);
    }
}
