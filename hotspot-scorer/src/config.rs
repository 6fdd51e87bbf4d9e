//! Query-side defaults.

use hotspot_core::TravelMode;
use serde::{Deserialize, Serialize};

use crate::error::RecommendationConfigError;

/// Tolerance used when checking that two weights sum to one.
pub(crate) const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Average speed and default budget for one travel mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Average network speed in km/h.
    pub speed_kmh: f64,
    /// Budget used when a query does not set one, in minutes.
    pub default_budget_minutes: f64,
}

/// Defaults applied to every query.
///
/// # Examples
/// ```
/// use hotspot_core::TravelMode;
/// use hotspot_scorer::RecommendationConfig;
///
/// let config = RecommendationConfig::default();
/// assert_eq!(config.profile(TravelMode::Bike).default_budget_minutes, 20.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Default popularity weight.
    pub alpha: f64,
    /// Default accessibility weight.
    pub beta: f64,
    /// Default number of results.
    pub limit: usize,
    /// Walking profile.
    pub walk: ModeProfile,
    /// Cycling profile.
    pub bike: ModeProfile,
    /// Driving profile.
    pub drive: ModeProfile,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.4,
            limit: 10,
            walk: ModeProfile {
                speed_kmh: 4.8,
                default_budget_minutes: 15.0,
            },
            bike: ModeProfile {
                speed_kmh: 15.0,
                default_budget_minutes: 20.0,
            },
            drive: ModeProfile {
                speed_kmh: 25.0,
                default_budget_minutes: 30.0,
            },
        }
    }
}

/// Whether `alpha` and `beta` are each in `0..=1` and sum to one.
pub(crate) fn weights_are_valid(alpha: f64, beta: f64) -> bool {
    (0.0..=1.0).contains(&alpha)
        && (0.0..=1.0).contains(&beta)
        && (alpha + beta - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
}

const fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl RecommendationConfig {
    /// Profile for `mode`.
    #[must_use]
    pub const fn profile(&self, mode: TravelMode) -> ModeProfile {
        match mode {
            TravelMode::Walk => self.walk,
            TravelMode::Bike => self.bike,
            TravelMode::Drive => self.drive,
        }
    }

    /// Check weights, limit and every mode profile.
    ///
    /// # Errors
    /// Returns the first [`RecommendationConfigError`] found.
    pub fn validate(&self) -> Result<(), RecommendationConfigError> {
        if !weights_are_valid(self.alpha, self.beta) {
            return Err(RecommendationConfigError::Weights {
                alpha: self.alpha,
                beta: self.beta,
            });
        }
        if self.limit == 0 {
            return Err(RecommendationConfigError::Limit);
        }
        for mode in TravelMode::ALL {
            let profile = self.profile(mode);
            if !is_positive(profile.speed_kmh) {
                return Err(RecommendationConfigError::Speed {
                    mode,
                    speed_kmh: profile.speed_kmh,
                });
            }
            if !is_positive(profile.default_budget_minutes) {
                return Err(RecommendationConfigError::Budget {
                    mode,
                    minutes: profile.default_budget_minutes,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TravelMode::Walk, 4.8, 15.0)]
    #[case(TravelMode::Bike, 15.0, 20.0)]
    #[case(TravelMode::Drive, 25.0, 30.0)]
    fn defaults_match_mode_profiles(
        #[case] mode: TravelMode,
        #[case] speed: f64,
        #[case] budget: f64,
    ) {
        let profile = RecommendationConfig::default().profile(mode);
        assert_eq!(profile.speed_kmh, speed);
        assert_eq!(profile.default_budget_minutes, budget);
    }

    #[rstest]
    #[case(0.5, 0.5, true)]
    #[case(1.0, 0.0, true)]
    #[case(0.7, 0.2, false)]
    #[case(1.2, -0.2, false)]
    #[case(f64::NAN, 0.5, false)]
    fn weight_validation(#[case] alpha: f64, #[case] beta: f64, #[case] valid: bool) {
        assert_eq!(weights_are_valid(alpha, beta), valid);
    }

    #[rstest]
    fn rejects_zero_speed() {
        let mut config = RecommendationConfig::default();
        config.drive.speed_kmh = 0.0;
        assert_eq!(
            config.validate(),
            Err(RecommendationConfigError::Speed {
                mode: TravelMode::Drive,
                speed_kmh: 0.0
            })
        );
    }

    #[rstest]
    fn partial_json_keeps_defaults() {
        let config: RecommendationConfig =
            serde_json::from_str(r#"{"alpha": 0.8, "beta": 0.2}"#).expect("parse");
        assert_eq!(config.limit, 10);
        assert_eq!(config.walk, RecommendationConfig::default().walk);
        assert!(config.validate().is_ok());
    }
}
