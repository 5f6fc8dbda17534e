//! Core types for the datmon client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod health;
pub mod id;
pub mod money;
pub mod order;
pub mod promotion;
pub mod rank;
pub mod status;

pub use cart::{CartItem, Category, Product, ShippingProfile};
pub use health::HealthMetrics;
pub use id::*;
pub use money::Vnd;
pub use order::{Order, OrderItem, ShippingSnapshot};
pub use promotion::{DiscountKind, Promotion};
pub use rank::MembershipRank;
pub use status::{OrderStatus, PaymentMethod};
