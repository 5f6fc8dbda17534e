//! Payment-link creation for PAYOS orders.
//!
//! The backend answers with either a raw URL string or a JSON object whose
//! link lives under `url` or `paymentUrl`. Normalized here; anything else
//! is a loud decode failure.

use datmon_core::OrderId;
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;

#[derive(Debug, Deserialize)]
struct PaymentLinkBody {
    url: Option<String>,
    #[serde(rename = "paymentUrl")]
    payment_url: Option<String>,
}

/// Extract the payment URL from whichever body shape arrived.
fn extract_payment_url(body: &str) -> Result<String, ApiError> {
    let trimmed = body.trim();

    // JSON object: look for the known fields.
    if trimmed.starts_with('{') {
        let parsed: PaymentLinkBody = serde_json::from_str(trimmed)
            .map_err(|e| ApiError::Decode(format!("payment link body: {e}")))?;
        return parsed
            .url
            .or(parsed.payment_url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ApiError::Decode(
                    "payment link body had neither `url` nor `paymentUrl`".to_string(),
                )
            });
    }

    // A bare JSON string, or a raw URL in the body.
    let candidate = serde_json::from_str::<String>(trimmed)
        .unwrap_or_else(|_| trimmed.to_string());
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Ok(candidate);
    }

    Err(ApiError::Decode(format!(
        "payment link response is not a URL: {candidate:.60}"
    )))
}

impl ApiClient {
    /// Request a PAYOS payment link for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no URL.
    #[instrument(skip(self))]
    pub async fn create_payment_link(&self, order: OrderId) -> Result<String, ApiError> {
        let builder = self
            .post("api/payments/link")?
            .json(&serde_json::json!({ "orderId": order }));

        let response = self.authed(builder).await.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ApiError::remote(status.as_u16(), &body));
        }

        extract_payment_url(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_url_field() {
        let url = extract_payment_url(r#"{"url": "https://pay.payos.vn/web/abc"}"#)
            .expect("url field");
        assert_eq!(url, "https://pay.payos.vn/web/abc");
    }

    #[test]
    fn test_extract_from_payment_url_field() {
        let url = extract_payment_url(r#"{"paymentUrl": "https://pay.payos.vn/web/xyz"}"#)
            .expect("paymentUrl field");
        assert_eq!(url, "https://pay.payos.vn/web/xyz");
    }

    #[test]
    fn test_extract_from_raw_body() {
        let url = extract_payment_url("https://pay.payos.vn/web/raw").expect("raw body");
        assert_eq!(url, "https://pay.payos.vn/web/raw");
    }

    #[test]
    fn test_extract_from_json_string() {
        let url =
            extract_payment_url(r#""https://pay.payos.vn/web/quoted""#).expect("json string");
        assert_eq!(url, "https://pay.payos.vn/web/quoted");
    }

    #[test]
    fn test_extract_rejects_unknown_shapes() {
        assert!(matches!(
            extract_payment_url(r#"{"link": "https://x"}"#),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(
            extract_payment_url("not a url"),
            Err(ApiError::Decode(_))
        ));
    }
}
