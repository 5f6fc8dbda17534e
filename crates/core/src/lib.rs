//! Datmon Core - Shared types library.
//!
//! This crate provides common types used across all datmon client components:
//! - `api` - Backend gateway client, session state, push channel
//! - `customer` - Cart, checkout, and payment confirmation flows
//! - `shipper` - Delivery fulfillment feed
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no timers. Everything here mirrors what the backend sends over
//! the wire, normalized to one shape at the API boundary.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, integer VND money, order statuses, membership
//!   ranks, and the wire-facing records shared by the flow crates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
