//! Promotion listing and preview.
//!
//! The server is the authority on validity and on the discount amount; the
//! preview computes the discount for a cart without persisting anything.

use datmon_core::{Promotion, Vnd};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;
use super::orders::CreateOrderItem;

/// Server-computed preview of a promotion applied to a cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPreview {
    pub discount: Vnd,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest<'a> {
    code: &'a str,
    items: &'a [CreateOrderItem],
}

impl ApiClient {
    /// List currently active promotions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn promotions(&self) -> Result<Vec<Promotion>, ApiError> {
        self.send_json(self.get("api/promotions")?).await
    }

    /// Ask the server what a promotion code is worth for these items.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, invalid (server-side), or the
    /// request fails.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn preview_promotion(
        &self,
        code: &str,
        items: &[CreateOrderItem],
    ) -> Result<PromotionPreview, ApiError> {
        if code.trim().is_empty() {
            return Err(ApiError::Validation(
                "Vui lòng nhập mã giảm giá".to_string(),
            ));
        }

        let builder = self
            .post("api/promotions/preview")?
            .json(&PreviewRequest { code, items });
        self.send_json(builder).await
    }

    /// Submit a product review.
    ///
    /// # Errors
    ///
    /// Returns an error if the rating is out of range or the request fails.
    #[instrument(skip(self, comment))]
    pub async fn submit_review(
        &self,
        product: datmon_core::ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<(), ApiError> {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation(
                "Đánh giá phải từ 1 đến 5 sao".to_string(),
            ));
        }

        let builder = self.post("api/reviews")?.json(&serde_json::json!({
            "productId": product,
            "rating": rating,
            "comment": comment,
        }));
        self.send_unit(builder).await
    }
}
