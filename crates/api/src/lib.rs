//! Datmon API - backend gateway client.
//!
//! Everything the mobile client says to the backend goes through this crate:
//!
//! - [`ApiClient`] - reqwest-based REST client with bearer-token injection,
//!   a fixed 15 second timeout, and error normalization. Each endpoint has
//!   an explicit decode step that converts the backend's response shape
//!   variance (token field names, cart envelopes, payment-link bodies) into
//!   exactly one internal shape, failing loudly when nothing matches.
//! - [`SessionStore`] - the process-wide auth/cart-count state, passed
//!   explicitly to whoever needs it. Persistence goes through the
//!   [`TokenStorage`] port so the secure on-device store stays external.
//! - [`PushSession`] - topic-based pub/sub subscription with heartbeats and
//!   fixed-backoff reconnection, over an injected [`PushTransport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use datmon_api::{ApiClient, ApiConfig, SessionStore, storage::InMemoryTokenStorage};
//!
//! let session = SessionStore::new(InMemoryTokenStorage::default());
//! let client = ApiClient::new(&ApiConfig::from_env()?, session.clone());
//!
//! let auth = client.login("ngocanh", "hunter2").await?;
//! let cart = client.cart().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
pub mod config;
pub mod error;
pub mod push;
pub mod session;
pub mod storage;

pub use client::{ApiClient, AuthSession, CreateOrderItem, PromotionPreview, UserProfile};
pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use push::{PushEvent, PushFrame, PushSession, PushSessionConfig, PushTransport, Topic};
pub use session::SessionStore;
pub use storage::TokenStorage;
