//! Login and registration.
//!
//! The backend has grown several token spellings over time: the body may
//! carry `token`, `accessToken`, `access_token`, or `jwt`, and some
//! deployments only echo the token in the `Authorization` response header.
//! The decode step here checks every known location and fails loudly when
//! none matches, so nothing downstream ever sniffs shapes.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;

/// The result of a successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub username: String,
    pub token: SecretString,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Body shape for token extraction. Every spelling the backend has used.
#[derive(Debug, Deserialize, Default)]
struct TokenBody {
    token: Option<String>,
    #[serde(rename = "accessToken")]
    access_token_camel: Option<String>,
    access_token: Option<String>,
    jwt: Option<String>,
    username: Option<String>,
}

impl TokenBody {
    fn into_token(self) -> Option<String> {
        self.token
            .or(self.access_token_camel)
            .or(self.access_token)
            .or(self.jwt)
            .filter(|t| !t.is_empty())
    }
}

impl ApiClient {
    /// Log in and store the session.
    ///
    /// On success the token and username are written to the session store
    /// (and through it to secure storage) before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are empty, the request fails, or
    /// no token can be found in the response.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ApiError> {
        self.authenticate("api/auth/login", username, password).await
    }

    /// Register a new account and store the session.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ApiClient::login`].
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthSession, ApiError> {
        self.authenticate("api/auth/register", username, password)
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Vui lòng nhập tên đăng nhập và mật khẩu".to_string(),
            ));
        }

        let builder = self
            .post(path)?
            .json(&Credentials { username, password });

        // Token extraction needs the raw response: body fields first, then
        // the Authorization header.
        let response = builder.send().await?;
        let status = response.status();

        let header_token = response
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
            .filter(|t| !t.is_empty());

        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ApiError::remote(status.as_u16(), &body));
        }

        let parsed: TokenBody = serde_json::from_str(&body).unwrap_or_default();
        let body_username = parsed.username.clone();
        let token = parsed
            .into_token()
            .or(header_token)
            .ok_or_else(|| {
                ApiError::Decode(
                    "no token in response (checked token/accessToken/access_token/jwt and the \
                     Authorization header)"
                        .to_string(),
                )
            })?;

        let session = AuthSession {
            username: body_username.unwrap_or_else(|| username.to_string()),
            token: SecretString::from(token),
        };

        self.session()
            .set_auth(session.username.clone(), session.token.clone())
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        Ok(session)
    }

    /// Log out: clear the session store and drop cached catalog reads.
    pub async fn logout(&self) {
        self.session().clear().await;
        self.inner.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_body_precedence() {
        let body: TokenBody = serde_json::from_str(
            r#"{"token": "a", "accessToken": "b", "jwt": "c"}"#,
        )
        .expect("parse");
        assert_eq!(body.into_token().as_deref(), Some("a"));
    }

    #[test]
    fn test_token_body_alternate_spellings() {
        for json in [
            r#"{"accessToken": "t"}"#,
            r#"{"access_token": "t"}"#,
            r#"{"jwt": "t"}"#,
        ] {
            let body: TokenBody = serde_json::from_str(json).expect("parse");
            assert_eq!(body.into_token().as_deref(), Some("t"), "shape: {json}");
        }
    }

    #[test]
    fn test_token_body_empty_string_does_not_count() {
        let body: TokenBody = serde_json::from_str(r#"{"token": ""}"#).expect("parse");
        assert!(body.into_token().is_none());
    }
}
