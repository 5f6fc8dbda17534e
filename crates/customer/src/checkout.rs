//! The order lifecycle controller.
//!
//! Converts a cart into an order and requests the few transitions the
//! customer is allowed to. Validation failures are caught before any
//! network call; order-creation failures surface the server's message
//! verbatim and are never retried automatically - the user resubmits.

use datmon_api::{ApiClient, ApiError};
use datmon_core::{IdempotencyKey, Order, PaymentMethod, ShippingProfile};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::cart::Cart;

/// Failures of the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Shipping phone or address line is missing. Refused locally; the
    /// screen prompts for shipping info instead of calling the backend.
    #[error("Vui lòng hoàn tất thông tin giao hàng trước khi đặt món")]
    ShippingIncomplete,

    /// Nothing in the cart.
    #[error("Giỏ hàng đang trống")]
    EmptyCart,

    /// The order is past the point where the customer may cancel.
    #[error("Đơn hàng ở trạng thái {0} không thể hủy")]
    NotCancellable(datmon_core::OrderStatus),

    /// The backend refused or the call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of a successful placement.
#[derive(Debug, Clone)]
pub enum Placement {
    /// COD order created in `PENDING`; the cart has been cleared.
    Cod { order: Order },
    /// Online order created; the payment page must be opened and the
    /// confirmation poller started. The cart is cleared only once payment
    /// confirms.
    PendingPayment { order: Order, payment_url: String },
}

/// Drives a cart to a placed order and handles cancellation.
#[derive(Debug, Clone)]
pub struct Checkout {
    client: ApiClient,
}

impl Checkout {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Place an order from the cart.
    ///
    /// Preconditions checked locally, in order: shipping profile complete
    /// (phone + address line), cart non-empty. Neither refusal touches the
    /// network.
    ///
    /// On COD success the cart is cleared and the badge reset; a failed
    /// clear is logged and left for the next refresh, since the order
    /// itself is already placed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ShippingIncomplete`] or
    /// [`CheckoutError::EmptyCart`] before any network call; otherwise
    /// whatever the backend said, verbatim.
    #[instrument(skip(self, cart, shipping), fields(method = %method))]
    pub async fn place_order(
        &self,
        cart: &mut Cart,
        shipping: &ShippingProfile,
        method: PaymentMethod,
    ) -> Result<Placement, CheckoutError> {
        if !shipping.is_complete() {
            return Err(CheckoutError::ShippingIncomplete);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines = cart.order_lines();
        let promotion_code = cart.promotion_code().map(str::to_string);
        let key = IdempotencyKey::generate();

        let order = self
            .client
            .create_order(&lines, method, promotion_code.as_deref(), &key)
            .await?;

        match method {
            PaymentMethod::Cod => {
                if let Err(e) = cart.clear().await {
                    warn!(error = %e, order = %order.id, "cart clear after COD placement failed");
                }
                Ok(Placement::Cod { order })
            }
            PaymentMethod::PayOs => {
                let payment_url = self.client.create_payment_link(order.id).await?;
                Ok(Placement::PendingPayment { order, payment_url })
            }
        }
    }

    /// Request cancellation.
    ///
    /// Permitted only while the status is `PENDING` or `CONFIRMED`; checked
    /// locally first, but the server stays authoritative - the returned
    /// order carries whatever status it actually ended in.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotCancellable`] before any network call
    /// for other statuses, or the backend's error.
    #[instrument(skip(self, order), fields(order = %order.id, status = %order.status))]
    pub async fn cancel(&self, order: &Order) -> Result<Order, CheckoutError> {
        if !order.status.is_cancellable() {
            return Err(CheckoutError::NotCancellable(order.status));
        }
        Ok(self.client.cancel_order(order.id).await?)
    }
}
