//! Cart endpoints.
//!
//! The server owns the cart; every mutation returns the updated cart and
//! the caller replaces its state wholesale from that response. Older
//! backend builds wrap the items as `items`, newer ones as `cartItems`;
//! both normalize to a plain `Vec<CartItem>` here.

use datmon_core::{CartItem, CartItemId, IdempotencyKey, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;

/// Header carrying the client-generated dedup key for cart adds and order
/// creation.
pub(super) const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Both envelope spellings the backend has shipped.
#[derive(Debug, Deserialize)]
struct CartEnvelope {
    items: Option<Vec<CartItem>>,
    #[serde(rename = "cartItems")]
    cart_items: Option<Vec<CartItem>>,
}

impl CartEnvelope {
    fn into_items(self) -> Result<Vec<CartItem>, ApiError> {
        self.items.or(self.cart_items).ok_or_else(|| {
            ApiError::Decode("cart response had neither `items` nor `cartItems`".to_string())
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantityRequest {
    quantity: u32,
}

impl ApiClient {
    /// Fetch the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let envelope: CartEnvelope = self.send_json(self.get("api/cart")?).await?;
        envelope.into_items()
    }

    /// Add a product to the cart and return the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if quantity is zero or the request fails.
    #[instrument(skip(self, key))]
    pub async fn add_cart_item(
        &self,
        product: ProductId,
        quantity: u32,
        key: &IdempotencyKey,
    ) -> Result<Vec<CartItem>, ApiError> {
        if quantity == 0 {
            return Err(ApiError::Validation("Số lượng phải ít nhất là 1".to_string()));
        }

        let builder = self
            .post("api/cart/items")?
            .header(IDEMPOTENCY_HEADER, key.to_string())
            .json(&AddItemRequest {
                product_id: product,
                quantity,
            });
        let envelope: CartEnvelope = self.send_json(builder).await?;
        envelope.into_items()
    }

    /// Change a line item's quantity and return the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if quantity is zero or the request fails.
    #[instrument(skip(self))]
    pub async fn set_cart_quantity(
        &self,
        item: CartItemId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, ApiError> {
        if quantity == 0 {
            return Err(ApiError::Validation("Số lượng phải ít nhất là 1".to_string()));
        }

        let builder = self
            .put(&format!("api/cart/items/{item}"))?
            .json(&SetQuantityRequest { quantity });
        let envelope: CartEnvelope = self.send_json(builder).await?;
        envelope.into_items()
    }

    /// Remove a line item and return the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, item: CartItemId) -> Result<Vec<CartItem>, ApiError> {
        let envelope: CartEnvelope = self
            .send_json(self.delete(&format!("api/cart/items/{item}"))?)
            .await?;
        envelope.into_items()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.send_unit(self.delete("api/cart")?).await
    }
}
