//! Backend REST client.
//!
//! One client per process, cheaply cloneable. Every call injects the bearer
//! token from the [`SessionStore`] when a session exists, carries the fixed
//! 15 second timeout, and normalizes failures through [`ApiError`]. Decode
//! structs live next to the endpoint that uses them; nothing downstream of
//! this module ever sees the backend's shape variance.

mod auth;
mod cart;
mod catalog;
mod orders;
mod payments;
mod profile;
mod promotions;

pub use auth::AuthSession;
pub use orders::CreateOrderItem;
pub use profile::UserProfile;
pub use promotions::PromotionPreview;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::RequestBuilder;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::SessionStore;
use catalog::CacheValue;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the datmon backend REST API.
///
/// Catalog reads (categories, products) are cached; everything else goes to
/// the network every time, because carts and orders are live state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                session,
                cache,
            }),
        })
    }

    /// The session store this client reads its token from.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Resolve a path against the configured base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Validation(format!("invalid request path {path}: {e}")))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.http.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.http.post(self.url(path)?))
    }

    fn put(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.http.put(self.url(path)?))
    }

    fn delete(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.http.delete(self.url(path)?))
    }

    /// Attach the bearer token when a session exists.
    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.inner.session.token().await {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.authed(builder).await.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::remote(status.as_u16(), &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request where the response body does not matter.
    async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = self.authed(builder).await.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::remote(status.as_u16(), &body));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
