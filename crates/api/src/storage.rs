//! Persistence port for the session token.
//!
//! The secure on-device credential store (keychain/keystore) is a platform
//! collaborator; this crate only defines the port it must satisfy. An
//! in-memory implementation ships for tests and for platforms wiring up
//! later.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::Mutex;

/// A persisted session: username plus bearer token.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub username: String,
    pub token: SecretString,
}

/// Failure in the underlying storage mechanism.
#[derive(Debug, Error)]
#[error("token storage error: {0}")]
pub struct StorageError(pub String);

/// Port to the secure on-device credential store.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Load the persisted session, if any.
    async fn load(&self) -> Result<Option<StoredSession>, StorageError>;

    /// Persist the session, replacing any previous one.
    async fn save(&self, session: &StoredSession) -> Result<(), StorageError>;

    /// Remove the persisted session.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory storage for tests.
#[derive(Debug, Default)]
pub struct InMemoryTokenStorage {
    slot: Mutex<Option<(String, String)>>,
}

#[async_trait]
impl TokenStorage for InMemoryTokenStorage {
    async fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        Ok(self.slot.lock().await.as_ref().map(|(username, token)| {
            StoredSession {
                username: username.clone(),
                token: SecretString::from(token.clone()),
            }
        }))
    }

    async fn save(&self, session: &StoredSession) -> Result<(), StorageError> {
        *self.slot.lock().await = Some((
            session.username.clone(),
            session.token.expose_secret().to_string(),
        ));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let storage = InMemoryTokenStorage::default();
        assert!(storage.load().await.expect("load").is_none());

        storage
            .save(&StoredSession {
                username: "ngocanh".to_string(),
                token: SecretString::from("tok-123".to_string()),
            })
            .await
            .expect("save");

        let loaded = storage.load().await.expect("load").expect("present");
        assert_eq!(loaded.username, "ngocanh");
        assert_eq!(loaded.token.expose_secret(), "tok-123");

        storage.clear().await.expect("clear");
        assert!(storage.load().await.expect("load").is_none());
    }
}
