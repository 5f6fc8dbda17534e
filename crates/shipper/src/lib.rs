//! Datmon Shipper - the delivery-role app mode.
//!
//! A shipper watches a live queue of orders in `DELIVERING` status and
//! finalizes deliveries:
//!
//! - [`FulfillmentFeed`] - the queue. Pull (screen focus, manual refresh)
//!   and push (order-change topics) both funnel into the same full
//!   re-fetch-and-replace; there is no incremental merge, so concurrent
//!   shippers can never leave the queue diverged from the server.
//! - [`actions`] - per-order actions: call the customer, open navigation,
//!   complete the delivery.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod actions;
pub mod feed;

pub use actions::{ActionError, Launcher, call_customer, navigate_to};
pub use feed::{FeedError, FulfillmentFeed};
