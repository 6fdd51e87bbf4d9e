//! Facade crate for the dining hotspot engine.
//!
//! This crate re-exports the batch pipeline from `hotspot-core` and, behind
//! the default `recommend` feature, the street networks and query service.

#![forbid(unsafe_code)]

pub use hotspot_core::{
    AnalysisReport, FinalHotspot, HotspotCollection, HotspotGeoJsonError, HotspotId,
    HotspotPipeline, HotspotStats, LocalProjection, PipelineConfig, PipelineConfigError,
    PipelineOutput, PlaceRecord, ProjectionOrigin, RawMobilityEvent, Recommendation, TravelMode,
    UserQuery,
};

#[cfg(feature = "test-support")]
pub use hotspot_core::test_support;

#[cfg(feature = "recommend")]
pub use hotspot_network::{
    AccessibilityScorer, NetworkBuildError, NetworkDefinition, NetworkSet, TransportGraph,
};

#[cfg(feature = "recommend")]
pub use hotspot_scorer::{
    QueryError, RecommendationConfig, RecommendationConfigError, RecommendationRanker,
    Recommender,
};
