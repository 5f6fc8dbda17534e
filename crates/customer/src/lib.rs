//! Datmon Customer - cart, checkout, and payment confirmation flows.
//!
//! These are the state machines behind the customer screens:
//!
//! - [`Cart`] - the server-confirmed cart aggregate with loyalty and
//!   promotion pricing. Mutations are never optimistic: local state is
//!   replaced only from the server's response.
//! - [`Checkout`] - converts the cart into an order. Validates shipping
//!   locally (no network call on refusal), then drives the COD or online
//!   payment path.
//! - [`PaymentAttempt`] / [`PaymentPollHandle`] - the bounded polling loop
//!   that confirms an online payment after the external payment page has
//!   been opened. Cancellable; opens the payment URL exactly once.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod payment;

pub use cart::{Cart, Pricing};
pub use checkout::{Checkout, CheckoutError, Placement};
pub use payment::{
    PaymentAttempt, PaymentOutcome, PaymentPollHandle, UrlOpener,
};
