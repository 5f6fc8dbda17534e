//! Order records as the backend returns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, ProductId};
use crate::types::money::Vnd;
use crate::types::status::{OrderStatus, PaymentMethod};

/// A line item frozen into an order at creation time.
///
/// The unit price is the price at order time, not the product's current
/// price; the backend snapshots it when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    /// Product name at order time, for display without a catalog lookup.
    #[serde(default)]
    pub product_name: String,
    pub unit_price: Vnd,
    pub quantity: u32,
}

impl OrderItem {
    /// Line total: unit price times quantity.
    #[must_use]
    pub const fn line_total(&self) -> Vnd {
        self.unit_price.times(self.quantity)
    }
}

/// Shipping details frozen into the order at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSnapshot {
    pub phone: String,
    pub address_line: String,
    #[serde(default)]
    pub city: String,
}

/// An order, owned by the backend.
///
/// The item list is immutable once created; the client only reads orders and
/// requests the transitions it is allowed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub total: Vnd,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub shipping: ShippingSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: ProductId::new(7),
            product_name: "Cơm tấm sườn".to_string(),
            unit_price: Vnd::new(45_000),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Vnd::new(135_000));
    }

    #[test]
    fn test_order_deserializes_from_backend_shape() {
        let json = r#"{
            "id": 12,
            "items": [
                {"productId": 7, "productName": "Phở bò", "unitPrice": 55000, "quantity": 1}
            ],
            "total": 55000,
            "paymentMethod": "COD",
            "status": "PENDING",
            "createdAt": "2025-11-02T08:30:00Z",
            "shipping": {"phone": "0901234567", "addressLine": "12 Lý Tự Trọng", "city": "Đà Nẵng"}
        }"#;
        let order: Order = serde_json::from_str(json).expect("backend order shape");
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.shipping.city, "Đà Nẵng");
    }
}
