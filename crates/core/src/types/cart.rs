//! Cart, catalog, and shipping profile records.

use serde::{Deserialize, Serialize};

use crate::types::id::{CartItemId, CategoryId, ProductId};
use crate::types::money::Vnd;

/// A food category in the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Vnd,
    pub category_id: CategoryId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A server-side cart line item.
///
/// The unit price is a snapshot taken when the item was added. Quantity is
/// always at least 1; removing the last unit removes the item instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub unit_price: Vnd,
    pub quantity: u32,
}

impl CartItem {
    /// Line total: unit price times quantity.
    #[must_use]
    pub const fn line_total(&self) -> Vnd {
        self.unit_price.times(self.quantity)
    }
}

/// The user's one-per-account shipping record.
///
/// Order placement requires a non-empty phone and address line; the rest is
/// optional context for the shipper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShippingProfile {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_line: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub note: String,
}

impl ShippingProfile {
    /// Whether an order may proceed with this profile.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.phone.trim().is_empty() && !self.address_line.trim().is_empty()
    }
}
