//! Core domain types and batch stages for the dining hotspot engine.
//!
//! The crate turns a merged restaurant dataset and a timestamped mobility
//! dataset into a set of [`FinalHotspot`] records:
//!
//! 1. [`TemporalWeighter`] assigns each drop-off a weight from its hour and
//!    weekday.
//! 2. [`DensityClusterer`] groups projected points into density clusters,
//!    once for restaurants and once for weighted drop-offs.
//! 3. [`ZonePolygonBuilder`] turns each cluster into a buffered hull.
//! 4. [`HotspotIntersector`] intersects dining zones with hotspot areas,
//!    filters the parts and scores the survivors.
//!
//! [`HotspotPipeline`] threads an immutable configuration through all four
//! stages. The resulting collection can be written to and read from `GeoJSON`
//! via [`artefact`].

#![forbid(unsafe_code)]

pub mod artefact;
pub mod cluster;
pub mod intersect;
mod mobility;
mod model;
pub mod pipeline;
mod projection;
pub mod report;
mod temporal;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod zone;

pub use artefact::{HotspotCollection, HotspotGeoJsonError};
pub use cluster::{
    ClusterAssignment, ClusterId, ClusterLabel, ClusterValidation, ClusteringParams,
    ClusteringParamsError, ClusteringSummary, DensityClusterer,
};
pub use intersect::{
    HotspotIntersector, IntersectionDiagnostics, IntersectionOutcome, IntersectionParams,
    IntersectionParamsError, IntersectionShape,
};
pub use mobility::{MobilityAggregation, MobilityAggregationError, WeightedPoint};
pub use model::{
    FinalHotspot, HotspotId, MobilityEvent, PlaceRecord, PlaceSource, RawMobilityEvent,
    Recommendation, TravelMode, TravelModeParseError, UserQuery,
};
pub use pipeline::{
    HotspotPipeline, PipelineConfig, PipelineConfigError, PipelineDiagnostics, PipelineOutput,
};
pub use projection::{LocalProjection, ProjectionError, ProjectionOrigin};
pub use report::{AnalysisReport, HotspotStats, TopHotspot, ZoneSummary};
pub use temporal::{
    HourOfDay, HourOfDayError, TemporalBand, TemporalWeighter, TemporalWeights,
    TemporalWeightsError,
};
pub use zone::{
    DiningZone, HotspotArea, Zone, ZoneDiagnostics, ZoneParams, ZoneParamsError,
    ZonePolygonBuilder, ZoneRejection,
};
