//! Ranking of dining hotspots for a user's position, mode and time budget.
//!
//! [`Recommender`] combines a finished
//! [`HotspotCollection`](hotspot_core::HotspotCollection) with one street
//! graph per travel mode. Each query runs a single bounded search, scores the
//! reachable hotspots for accessibility, and hands them to
//! [`RecommendationRanker`], which blends popularity and accessibility with
//! per-query weights.
//!
//! # Examples
//!
//! ```
//! use geo::Coord;
//! use hotspot_core::{HotspotCollection, LocalProjection, ProjectionOrigin, TravelMode};
//! use hotspot_network::{NetworkDefinition, NetworkSet, TransportGraph};
//! use hotspot_scorer::{RecommendationConfig, Recommender};
//!
//! let projection = LocalProjection::new(ProjectionOrigin { lon: 0.0, lat: 0.0 })?;
//! let definition = NetworkDefinition::from_json_str(
//!     r#"{"nodes": [{"id": 1, "lon": 0.0, "lat": 0.0}]}"#,
//! )?;
//! let graph = TransportGraph::from_definition(&definition, TravelMode::Walk, 4.8)?;
//! let recommender = Recommender::new(
//!     HotspotCollection::new(projection, Vec::new()),
//!     [graph].into_iter().collect::<NetworkSet>(),
//!     RecommendationConfig::default(),
//! )?;
//! let query = recommender.default_query(Coord { x: 0.0, y: 0.0 }, TravelMode::Walk);
//! assert!(recommender.recommend(&query)?.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod ranker;
mod recommender;

pub use config::{ModeProfile, RecommendationConfig};
pub use error::{QueryError, RecommendationConfigError};
pub use ranker::{RankCandidate, RecommendationRanker};
pub use recommender::Recommender;
