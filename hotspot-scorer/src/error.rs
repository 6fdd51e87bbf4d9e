//! Error types for the recommendation service.

use hotspot_core::TravelMode;
use thiserror::Error;

/// Errors raised when a [`RecommendationConfig`](crate::RecommendationConfig)
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RecommendationConfigError {
    /// Default weights were out of range or did not sum to one.
    #[error("default weights must lie in 0..=1 and sum to 1, got alpha={alpha} beta={beta}")]
    Weights {
        /// Popularity weight.
        alpha: f64,
        /// Accessibility weight.
        beta: f64,
    },
    /// The default result limit was zero.
    #[error("default result limit must be at least 1")]
    Limit,
    /// A mode speed was not positive and finite.
    #[error("{mode} speed must be positive and finite, got {speed_kmh}")]
    Speed {
        /// Offending mode.
        mode: TravelMode,
        /// Configured speed in km/h.
        speed_kmh: f64,
    },
    /// A mode's default budget was not positive and finite.
    #[error("{mode} default budget must be positive and finite, got {minutes}")]
    Budget {
        /// Offending mode.
        mode: TravelMode,
        /// Configured budget in minutes.
        minutes: f64,
    },
}

/// Caller contract violations detected before a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum QueryError {
    /// The time budget was zero, negative or not finite.
    #[error("time budget must be positive and finite, got {0} minutes")]
    Budget(f64),
    /// The weights were out of range or did not sum to one.
    #[error("alpha and beta must lie in 0..=1 and sum to 1, got alpha={alpha} beta={beta}")]
    Weights {
        /// Popularity weight.
        alpha: f64,
        /// Accessibility weight.
        beta: f64,
    },
    /// The requested result limit was zero.
    #[error("result limit must be at least 1")]
    Limit,
    /// No graph is loaded for the requested mode.
    #[error("no {0} network is loaded")]
    NoNetwork(TravelMode),
    /// The origin could not be placed on the network.
    #[error("origin ({lon}, {lat}) cannot be placed on the {mode} network")]
    Origin {
        /// Mode searched.
        mode: TravelMode,
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
}
