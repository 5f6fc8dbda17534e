//! User profile, shipping profile, and health-metrics endpoints.

use datmon_core::{HealthMetrics, MembershipRank, ShippingProfile};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;

/// The account profile: identity, loyalty points, optional health record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub loyalty_points: u32,
    #[serde(default)]
    pub health: Option<HealthMetrics>,
}

impl UserProfile {
    /// The rank the accumulated points earn.
    #[must_use]
    pub const fn rank(&self) -> MembershipRank {
        MembershipRank::from_points(self.loyalty_points)
    }
}

impl ApiClient {
    /// Fetch the account profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.send_json(self.get("api/profile")?).await
    }
    /// Fetch the authenticated user's shipping profile.
    ///
    /// A user who never filled the form gets an empty profile, not an
    /// error; order placement checks completeness separately.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn shipping_profile(&self) -> Result<ShippingProfile, ApiError> {
        self.send_json(self.get("api/shipping-profile")?).await
    }

    /// Create or replace the shipping profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, profile))]
    pub async fn upsert_shipping_profile(
        &self,
        profile: &ShippingProfile,
    ) -> Result<ShippingProfile, ApiError> {
        self.send_json(self.put("api/shipping-profile")?.json(profile))
            .await
    }

    /// Update the profile's health metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is non-positive or the request
    /// fails.
    #[instrument(skip(self))]
    pub async fn update_health_metrics(
        &self,
        metrics: HealthMetrics,
    ) -> Result<HealthMetrics, ApiError> {
        if metrics.height_cm <= 0.0 || metrics.weight_kg <= 0.0 {
            return Err(ApiError::Validation(
                "Chiều cao và cân nặng phải lớn hơn 0".to_string(),
            ));
        }
        self.send_json(self.put("api/profile/health")?.json(&metrics))
            .await
    }
}
