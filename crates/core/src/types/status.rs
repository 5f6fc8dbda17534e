//! Order status and payment method enums.
//!
//! The status set mirrors the backend's order lifecycle. The client never
//! invents transitions; it only reads statuses and requests the few
//! transitions it is allowed to (place, cancel, complete delivery).

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Happy path: `Pending -> Confirmed -> Paid -> Preparing -> Delivering ->
/// Done`. `Cancelled` and `Failed` are terminal and reachable from any
/// non-terminal state. The backend has historically emitted both the
/// `CANCELLED` and `CANCELED` spellings, so deserialization accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Paid,
    Preparing,
    Delivering,
    Done,
    #[serde(alias = "CANCELED")]
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Whether the order has reached a state where payment is settled.
    ///
    /// This is the "OK" set the payment poller terminates successfully on.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Paid | Self::Preparing | Self::Delivering | Self::Done
        )
    }

    /// Whether the order ended without payment.
    ///
    /// This is the "BAD" set the payment poller terminates on with failure.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed)
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed)
    }

    /// Whether the customer may still request cancellation.
    ///
    /// Policy: only before the kitchen takes the order.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Wire spelling, as the backend serializes it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Paid => "PAID",
            Self::Preparing => "PREPARING",
            Self::Delivering => "DELIVERING",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PAID" => Ok(Self::Paid),
            "PREPARING" => Ok(Self::Preparing),
            "DELIVERING" => Ok(Self::Delivering),
            "DONE" => Ok(Self::Done),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    #[serde(rename = "COD")]
    Cod,
    /// PayOS online payment; requires the confirmation poll loop.
    #[serde(rename = "PAYOS")]
    PayOs,
}

impl PaymentMethod {
    /// Wire spelling, as the backend expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::PayOs => "PAYOS",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
