//! User health metrics kept on the profile screen.

use serde::{Deserialize, Serialize};

/// Height and weight the user maintains on their profile.
///
/// The backend stores these as-is; BMI is derived client-side for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    /// Height in centimeters.
    pub height_cm: f64,
    /// Weight in kilograms.
    pub weight_kg: f64,
}

impl HealthMetrics {
    /// Body mass index, or `None` when height is not set.
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        if self.height_cm <= 0.0 {
            return None;
        }
        let height_m = self.height_cm / 100.0;
        Some(self.weight_kg / (height_m * height_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        let metrics = HealthMetrics {
            height_cm: 170.0,
            weight_kg: 65.0,
        };
        let bmi = metrics.bmi().expect("height set");
        assert!((bmi - 22.49).abs() < 0.01);
    }

    #[test]
    fn test_bmi_without_height() {
        let metrics = HealthMetrics {
            height_cm: 0.0,
            weight_kg: 65.0,
        };
        assert!(metrics.bmi().is_none());
    }
}
