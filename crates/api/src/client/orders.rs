//! Order endpoints.
//!
//! Creation takes the cart snapshot as `{productId, quantity}` pairs; the
//! backend re-prices from its own catalog and owns every status transition
//! afterwards. The client only requests the transitions it is allowed to.

use datmon_core::{IdempotencyKey, Order, OrderId, OrderStatus, ProductId};
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;
use super::cart::IDEMPOTENCY_HEADER;

/// One line of an order-creation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest<'a> {
    items: &'a [CreateOrderItem],
    payment_method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    promotion_code: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusRequest {
    status: OrderStatus,
}

impl ApiClient {
    /// Create an order from cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the item list is empty or the request fails. The
    /// server's message is preserved verbatim for display.
    #[instrument(skip(self, items, key), fields(lines = items.len(), method = %payment_method))]
    pub async fn create_order(
        &self,
        items: &[CreateOrderItem],
        payment_method: datmon_core::PaymentMethod,
        promotion_code: Option<&str>,
        key: &IdempotencyKey,
    ) -> Result<Order, ApiError> {
        if items.is_empty() {
            return Err(ApiError::Validation("Giỏ hàng đang trống".to_string()));
        }

        let builder = self
            .post("api/orders")?
            .header(IDEMPOTENCY_HEADER, key.to_string())
            .json(&CreateOrderRequest {
                items,
                payment_method: payment_method.as_str(),
                promotion_code,
            });
        self.send_json(builder).await
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.send_json(self.get(&format!("api/orders/{id}"))?).await
    }

    /// List the authenticated user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.send_json(self.get("api/orders/mine")?).await
    }

    /// List every order (shipper/admin roles only; the backend enforces).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.send_json(self.get("api/orders")?).await
    }

    /// Request cancellation of an order.
    ///
    /// The caller gates on [`OrderStatus::is_cancellable`]; the server
    /// remains authoritative and the returned order carries whatever status
    /// it actually ended in.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.send_json(self.post(&format!("api/orders/{id}/cancel"))?)
            .await
    }

    /// Request a status transition (shipper flow: `DELIVERING -> DONE`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let builder = self
            .put(&format!("api/orders/{id}/status"))?
            .json(&UpdateStatusRequest { status });
        self.send_json(builder).await
    }
}
