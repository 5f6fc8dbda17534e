//! The cart aggregate.
//!
//! The server owns the cart; this type owns the customer's view of it plus
//! the pricing context (membership rank, applied promotion). Every mutation
//! goes to the server first and replaces local state from the response - a
//! failed call leaves the aggregate exactly as it was, so the screen stays
//! re-actionable.

use datmon_api::{ApiClient, ApiError, CreateOrderItem};
use datmon_core::{CartItem, CartItemId, IdempotencyKey, MembershipRank, ProductId, Vnd};
use tracing::instrument;

/// Computed cart totals.
///
/// `total = subtotal - loyalty_discount - promo_discount`, clamped at zero
/// when the discounts overshoot the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub subtotal: Vnd,
    pub loyalty_discount: Vnd,
    pub promo_discount: Vnd,
    pub total: Vnd,
}

impl Pricing {
    /// Price a set of items under a rank and an optional promo discount.
    #[must_use]
    pub fn compute(items: &[CartItem], rank: MembershipRank, promo_discount: Vnd) -> Self {
        let subtotal: Vnd = items.iter().map(CartItem::line_total).sum();
        let loyalty_discount = rank.discount_on(subtotal);
        let total = subtotal
            .saturating_sub(loyalty_discount)
            .saturating_sub(promo_discount);

        Self {
            subtotal,
            loyalty_discount,
            promo_discount,
            total,
        }
    }
}

/// A promotion the server has previewed against the current cart.
#[derive(Debug, Clone)]
struct AppliedPromotion {
    code: String,
    discount: Vnd,
}

/// The customer's cart.
pub struct Cart {
    client: ApiClient,
    items: Vec<CartItem>,
    rank: MembershipRank,
    promotion: Option<AppliedPromotion>,
}

impl Cart {
    /// Create an empty aggregate; call [`Cart::refresh`] to load the
    /// server's cart.
    #[must_use]
    pub const fn new(client: ApiClient, rank: MembershipRank) -> Self {
        Self {
            client,
            items: Vec::new(),
            rank,
            promotion: None,
        }
    }

    /// The confirmed line items.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines; this is the cart badge number.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// The applied promotion code, if any.
    #[must_use]
    pub fn promotion_code(&self) -> Option<&str> {
        self.promotion.as_ref().map(|p| p.code.as_str())
    }

    /// Current totals.
    #[must_use]
    pub fn pricing(&self) -> Pricing {
        let promo_discount = self
            .promotion
            .as_ref()
            .map_or(Vnd::ZERO, |p| p.discount);
        Pricing::compute(&self.items, self.rank, promo_discount)
    }

    /// The cart as order-creation lines.
    #[must_use]
    pub fn order_lines(&self) -> Vec<CreateOrderItem> {
        self.items
            .iter()
            .map(|i| CreateOrderItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect()
    }

    /// Replace local state from a confirmed server cart and sync the badge.
    fn accept(&mut self, items: Vec<CartItem>) {
        self.items = items;
        self.client.session().set_cart_count(self.unit_count());
    }

    /// Re-fetch the cart from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; local state is untouched.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let items = self.client.cart().await?;
        self.accept(items);
        Ok(())
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if quantity is zero or the request fails.
    #[instrument(skip(self))]
    pub async fn add_item(&mut self, product: ProductId, quantity: u32) -> Result<(), ApiError> {
        let key = IdempotencyKey::generate();
        let items = self.client.add_cart_item(product, quantity, &key).await?;
        self.accept(items);
        Ok(())
    }

    /// Set a line's quantity. Quantity below 1 is rejected locally; the
    /// screen disables the decrement control at 1 and offers removal
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns an error if quantity is zero or the request fails.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &mut self,
        item: CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let items = self.client.set_cart_quantity(item, quantity).await?;
        self.accept(items);
        Ok(())
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, item: CartItemId) -> Result<(), ApiError> {
        let items = self.client.remove_cart_item(item).await?;
        self.accept(items);
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), ApiError> {
        self.client.clear_cart().await?;
        self.promotion = None;
        self.accept(Vec::new());
        Ok(())
    }

    /// Preview a promotion code against the current items and keep the
    /// server's discount for pricing. The server is the authority on
    /// validity and amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or the server rejects it; a
    /// previously applied promotion stays in place on failure.
    #[instrument(skip(self))]
    pub async fn apply_promotion(&mut self, code: &str) -> Result<Vnd, ApiError> {
        let preview = self
            .client
            .preview_promotion(code, &self.order_lines())
            .await?;
        self.promotion = Some(AppliedPromotion {
            code: code.to_string(),
            discount: preview.discount,
        });
        Ok(preview.discount)
    }

    /// Drop the applied promotion.
    pub fn remove_promotion(&mut self) {
        self.promotion = None;
    }
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("items", &self.items.len())
            .field("rank", &self.rank)
            .field("promotion", &self.promotion_code())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(1),
            product_id: ProductId::new(1),
            product_name: "Cơm gà xối mỡ".to_string(),
            unit_price: Vnd::new(unit_price),
            quantity,
        }
    }

    #[test]
    fn test_worked_example() {
        // One item at 100,000 x2, rank Bạc (3%), no promo.
        let pricing = Pricing::compute(&[item(100_000, 2)], MembershipRank::Bac, Vnd::ZERO);
        assert_eq!(pricing.subtotal, Vnd::new(200_000));
        assert_eq!(pricing.loyalty_discount, Vnd::new(6_000));
        assert_eq!(pricing.promo_discount, Vnd::ZERO);
        assert_eq!(pricing.total, Vnd::new(194_000));
    }

    #[test]
    fn test_total_identity() {
        let items = [item(45_000, 3), item(55_000, 1)];
        let pricing = Pricing::compute(&items, MembershipRank::Vang, Vnd::new(20_000));
        assert_eq!(
            pricing.total,
            pricing
                .subtotal
                .saturating_sub(pricing.loyalty_discount)
                .saturating_sub(pricing.promo_discount)
        );
    }

    #[test]
    fn test_total_clamps_at_zero() {
        // A fixed discount larger than the subtotal must not go negative.
        let pricing = Pricing::compute(&[item(10_000, 1)], MembershipRank::Dong, Vnd::new(50_000));
        assert_eq!(pricing.total, Vnd::ZERO);
    }

    #[test]
    fn test_empty_cart_prices_to_zero() {
        let pricing = Pricing::compute(&[], MembershipRank::KimCuong, Vnd::ZERO);
        assert_eq!(pricing.subtotal, Vnd::ZERO);
        assert_eq!(pricing.total, Vnd::ZERO);
    }
}
