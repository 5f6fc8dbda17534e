//! Membership rank derived from accumulated loyalty points.

use serde::{Deserialize, Serialize};

use crate::types::money::Vnd;

/// Loyalty rank, a step function of accumulated points.
///
/// The rank earns a recurring percentage discount on every cart:
///
/// | points    | rank      | discount |
/// |-----------|-----------|----------|
/// | 0-99      | Đồng      | 1 %      |
/// | 100-499   | Bạc       | 3 %      |
/// | 500-1999  | Vàng      | 5 %      |
/// | >= 2000   | Kim cương | 10 %     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipRank {
    Dong,
    Bac,
    Vang,
    KimCuong,
}

impl MembershipRank {
    /// Derive the rank from accumulated points.
    #[must_use]
    pub const fn from_points(points: u32) -> Self {
        match points {
            0..=99 => Self::Dong,
            100..=499 => Self::Bac,
            500..=1999 => Self::Vang,
            _ => Self::KimCuong,
        }
    }

    /// The recurring discount percentage for this rank.
    #[must_use]
    pub const fn discount_percent(self) -> u32 {
        match self {
            Self::Dong => 1,
            Self::Bac => 3,
            Self::Vang => 5,
            Self::KimCuong => 10,
        }
    }

    /// Display label, in Vietnamese as the app shows it.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dong => "Đồng",
            Self::Bac => "Bạc",
            Self::Vang => "Vàng",
            Self::KimCuong => "Kim cương",
        }
    }

    /// The loyalty discount this rank earns on a subtotal.
    #[must_use]
    pub const fn discount_on(self, subtotal: Vnd) -> Vnd {
        subtotal.percent(self.discount_percent())
    }
}

impl std::fmt::Display for MembershipRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
