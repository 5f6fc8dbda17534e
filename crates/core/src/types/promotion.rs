//! Promotion codes, read-only from the client's perspective.

use serde::{Deserialize, Serialize};

use crate::types::money::Vnd;

/// How a promotion discounts a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Percentage of the subtotal.
    Percentage,
    /// A fixed amount in đồng.
    Fixed,
}

/// An active promotion.
///
/// The server is the authority on validity and the computed discount; the
/// client only previews. These fields exist for listing and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub code: String,
    pub discount_kind: DiscountKind,
    /// Percent for [`DiscountKind::Percentage`], đồng for [`DiscountKind::Fixed`].
    pub discount_value: i64,
    #[serde(default)]
    pub description: String,
}

impl Promotion {
    /// Display-only estimate of the discount on a subtotal.
    ///
    /// Checkout never uses this; it asks the server to preview instead.
    #[must_use]
    pub fn estimate_discount(&self, subtotal: Vnd) -> Vnd {
        match self.discount_kind {
            DiscountKind::Percentage => {
                subtotal.percent(u32::try_from(self.discount_value.max(0)).unwrap_or(0))
            }
            DiscountKind::Fixed => Vnd::new(self.discount_value.max(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_percentage() {
        let promo = Promotion {
            code: "GIAM10".to_string(),
            discount_kind: DiscountKind::Percentage,
            discount_value: 10,
            description: String::new(),
        };
        assert_eq!(promo.estimate_discount(Vnd::new(200_000)), Vnd::new(20_000));
    }

    #[test]
    fn test_estimate_fixed() {
        let promo = Promotion {
            code: "FREESHIP".to_string(),
            discount_kind: DiscountKind::Fixed,
            discount_value: 15_000,
            description: String::new(),
        };
        assert_eq!(promo.estimate_discount(Vnd::new(200_000)), Vnd::new(15_000));
    }
}
