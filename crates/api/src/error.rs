//! Error taxonomy for backend calls.
//!
//! Every failure a screen can see funnels into [`ApiError`]. The variants
//! match how the UI reacts: validation errors block locally before any
//! network call, remote errors surface the server's message verbatim, and
//! network errors are retried only where a flow explicitly budgets retries
//! (the payment poller).

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caught locally before any network call (missing field, bad input).
    #[error("{0}")]
    Validation(String),

    /// The server answered with 4xx/5xx. `message` is the server's own
    /// message when one was provided, and is shown to the user verbatim.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// Timeout, connection failure, or another transport-level error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response matched none of the shapes this client knows.
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    /// The secure on-device store failed to persist the session.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Build a remote error from a status code and raw body.
    ///
    /// Prefers the server's `message`/`error` JSON field, then the raw body,
    /// then a generic fallback.
    #[must_use]
    pub fn remote(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(alias = "error")]
            message: String,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && !trimmed.starts_with('{') && !trimmed.starts_with('<'))
                    .then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("Request failed (HTTP {status})"));

        Self::Remote { status, message }
    }

    /// Whether the payment poller should treat this as transient.
    ///
    /// Both network failures and server errors count; only decode failures
    /// are permanent (the contract itself is broken).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_prefers_message_field() {
        let err = ApiError::remote(400, r#"{"message": "Số lượng không hợp lệ"}"#);
        assert_eq!(err.to_string(), "Số lượng không hợp lệ");
    }

    #[test]
    fn test_remote_accepts_error_field() {
        let err = ApiError::remote(422, r#"{"error": "Mã giảm giá đã hết hạn"}"#);
        assert_eq!(err.to_string(), "Mã giảm giá đã hết hạn");
    }

    #[test]
    fn test_remote_falls_back_to_plain_body() {
        let err = ApiError::remote(500, "upstream unavailable");
        assert_eq!(err.to_string(), "upstream unavailable");
    }

    #[test]
    fn test_remote_generic_fallback() {
        let err = ApiError::remote(502, "");
        assert_eq!(err.to_string(), "Request failed (HTTP 502)");

        // An HTML error page is not a message worth surfacing.
        let err = ApiError::remote(503, "<html>Service Unavailable</html>");
        assert_eq!(err.to_string(), "Request failed (HTTP 503)");
    }

    #[test]
    fn test_transient_partition() {
        assert!(ApiError::remote(500, "boom").is_transient());
        assert!(!ApiError::Decode("no known token field".to_string()).is_transient());
        assert!(!ApiError::Validation("missing phone".to_string()).is_transient());
    }
}
