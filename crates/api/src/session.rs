//! Process-wide session state.
//!
//! Replaces the usual "global auth singleton" with an explicit, cheaply
//! cloneable store that is passed to whoever needs it: the API client reads
//! the token from here, screens read the cart badge count, login/logout
//! write. The runtime is effectively single-threaded (one event loop), but
//! the store is still `Send + Sync` so background tasks (push session,
//! payment poller) can hold it.
//!
//! Writers must await [`SessionStore::set_auth`] before assuming the token
//! is persisted; the in-memory mirror and the storage write are sequenced,
//! not fire-and-forget.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::warn;

use crate::storage::{StorageError, StoredSession, TokenStorage};

/// Shared session state: bearer token, username, cart badge count.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: RwLock<Option<StoredSession>>,
    cart_count: AtomicU32,
    storage: Arc<dyn TokenStorage>,
}

impl SessionStore {
    /// Create an empty session backed by the given storage port.
    #[must_use]
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(None),
                cart_count: AtomicU32::new(0),
                storage: Arc::new(storage),
            }),
        }
    }

    /// Restore a persisted session into memory, if one exists.
    ///
    /// Called once at app start. A corrupt or unreadable store is treated
    /// as "not logged in" rather than an error the user can do nothing
    /// about.
    pub async fn restore(&self) -> bool {
        match self.inner.storage.load().await {
            Ok(Some(session)) => {
                *self.inner.state.write().await = Some(session);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Failed to restore persisted session");
                false
            }
        }
    }

    /// The current bearer token, if authenticated.
    pub async fn token(&self) -> Option<SecretString> {
        self.inner
            .state
            .read()
            .await
            .as_ref()
            .map(|s| s.token.clone())
    }

    /// The current username, if authenticated.
    pub async fn username(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .await
            .as_ref()
            .map(|s| s.username.clone())
    }

    /// Whether an authenticated session exists.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.state.read().await.is_some()
    }

    /// Store a fresh login: memory first, then the storage port.
    ///
    /// # Errors
    ///
    /// Returns the storage error if persistence fails; the in-memory session
    /// stays valid either way so the running app keeps working.
    pub async fn set_auth(
        &self,
        username: impl Into<String>,
        token: SecretString,
    ) -> Result<(), StorageError> {
        let session = StoredSession {
            username: username.into(),
            token,
        };
        *self.inner.state.write().await = Some(session.clone());
        self.inner.storage.save(&session).await
    }

    /// Log out: drop the in-memory session, reset the badge, clear storage.
    pub async fn clear(&self) {
        *self.inner.state.write().await = None;
        self.inner.cart_count.store(0, Ordering::Relaxed);
        if let Err(e) = self.inner.storage.clear().await {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Current cart badge count.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.inner.cart_count.load(Ordering::Relaxed)
    }

    /// Update the cart badge count from a confirmed server cart.
    pub fn set_cart_count(&self, count: u32) {
        self.inner.cart_count.store(count, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("cart_count", &self.cart_count())
            .finish_non_exhaustive()
    }
}
