//! The batch pipeline: weigh, cluster, zone, intersect, score.
//!
//! A [`HotspotPipeline`] owns an immutable, validated configuration and the
//! stage objects derived from it. The restaurant and mobility branches are
//! independent until the intersection stage and run on separate rayon tasks.

use geo::Coord;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artefact::HotspotCollection;
use crate::cluster::{
    ClusterValidation, ClusteringParams, ClusteringParamsError, ClusteringSummary,
    DensityClusterer,
};
use crate::intersect::{
    HotspotIntersector, IntersectionDiagnostics, IntersectionParams, IntersectionParamsError,
};
use crate::mobility::{MobilityAggregation, MobilityAggregationError};
use crate::model::{FinalHotspot, PlaceRecord, RawMobilityEvent};
use crate::projection::{LocalProjection, ProjectionError, ProjectionOrigin};
use crate::temporal::{TemporalWeighter, TemporalWeights, TemporalWeightsError};
use crate::zone::{
    DiningZone, HotspotArea, ZoneDiagnostics, ZoneParams, ZoneParamsError, ZonePolygonBuilder,
};

/// Everything the pipeline needs to know, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Temporal band weights.
    pub temporal_weights: TemporalWeights,
    /// Clustering parameters for restaurants.
    pub restaurant_clustering: ClusteringParams,
    /// Clustering parameters for drop-offs.
    pub mobility_clustering: ClusteringParams,
    /// Buffer distances.
    pub zones: ZoneParams,
    /// Fusion thresholds and popularity weighting.
    pub intersection: IntersectionParams,
    /// Drop-off binning and replication.
    pub mobility_aggregation: MobilityAggregation,
    /// Fixed projection origin; derived from the input extent when absent.
    pub projection_origin: Option<ProjectionOrigin>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temporal_weights: TemporalWeights::default(),
            restaurant_clustering: ClusteringParams::restaurants(),
            mobility_clustering: ClusteringParams::mobility(),
            zones: ZoneParams::default(),
            intersection: IntersectionParams::default(),
            mobility_aggregation: MobilityAggregation::default(),
            projection_origin: None,
        }
    }
}

/// Errors raised when loading or validating a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum PipelineConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse pipeline config: {0}")]
    Parse(#[source] serde_json::Error),
    /// The temporal table was invalid.
    #[error("invalid temporal weights: {0}")]
    TemporalWeights(#[from] TemporalWeightsError),
    /// Restaurant clustering parameters were invalid.
    #[error("invalid restaurant clustering parameters: {0}")]
    RestaurantClustering(#[source] ClusteringParamsError),
    /// Mobility clustering parameters were invalid.
    #[error("invalid mobility clustering parameters: {0}")]
    MobilityClustering(#[source] ClusteringParamsError),
    /// Buffer distances were invalid.
    #[error("invalid zone parameters: {0}")]
    Zones(#[from] ZoneParamsError),
    /// Fusion parameters were invalid.
    #[error("invalid intersection parameters: {0}")]
    Intersection(#[from] IntersectionParamsError),
    /// Aggregation settings were invalid.
    #[error("invalid mobility aggregation: {0}")]
    MobilityAggregation(#[from] MobilityAggregationError),
    /// The configured projection origin was invalid.
    #[error("invalid projection origin: {0}")]
    ProjectionOrigin(#[from] ProjectionError),
}

impl PipelineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`PipelineConfigError::Parse`] for malformed JSON and any
    /// validation error otherwise.
    pub fn from_json_str(text: &str) -> Result<Self, PipelineConfigError> {
        let config: Self = serde_json::from_str(text).map_err(PipelineConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    /// Returns the first [`PipelineConfigError`] found.
    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        self.temporal_weights.validate()?;
        self.restaurant_clustering
            .validate()
            .map_err(PipelineConfigError::RestaurantClustering)?;
        self.mobility_clustering
            .validate()
            .map_err(PipelineConfigError::MobilityClustering)?;
        self.zones.validate()?;
        self.intersection.validate()?;
        self.mobility_aggregation.validate()?;
        if let Some(origin) = self.projection_origin {
            LocalProjection::new(origin)?;
        }
        Ok(())
    }
}

/// Counters gathered across one run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Places dropped for invalid coordinates.
    pub skipped_places: usize,
    /// Events dropped for invalid coordinates.
    pub skipped_events: usize,
    /// Restaurant clustering counts.
    pub restaurant_clustering: ClusteringSummary,
    /// Mobility clustering counts, over replicated points.
    pub mobility_clustering: ClusteringSummary,
    /// Restaurant clustering quality.
    pub restaurant_validation: Option<ClusterValidation>,
    /// Mobility clustering quality.
    pub mobility_validation: Option<ClusterValidation>,
    /// Dining zone build counters.
    pub dining_zones: ZoneDiagnostics,
    /// Hotspot area build counters.
    pub hotspot_areas: ZoneDiagnostics,
    /// Fusion counters.
    pub intersections: IntersectionDiagnostics,
}

/// The immutable result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Projection used for every geometry below.
    pub projection: LocalProjection,
    /// Restaurant cluster footprints.
    pub dining_zones: Vec<DiningZone>,
    /// Drop-off cluster footprints.
    pub hotspot_areas: Vec<HotspotArea>,
    /// Accepted, scored hotspots ordered by id.
    pub hotspots: Vec<FinalHotspot>,
    /// Counters for the run.
    pub diagnostics: PipelineDiagnostics,
}

impl PipelineOutput {
    /// Hotspots paired with their projection, ready to serialise.
    #[must_use]
    pub fn collection(&self) -> HotspotCollection {
        HotspotCollection::new(self.projection, self.hotspots.clone())
    }
}

struct DiningBranch {
    zones: Vec<DiningZone>,
    skipped: usize,
    summary: ClusteringSummary,
    validation: Option<ClusterValidation>,
    diagnostics: ZoneDiagnostics,
}

struct MobilityBranch {
    areas: Vec<HotspotArea>,
    skipped: usize,
    summary: ClusteringSummary,
    validation: Option<ClusterValidation>,
    diagnostics: ZoneDiagnostics,
}

/// Runs the full hotspot identification pipeline.
///
/// # Examples
/// ```
/// use hotspot_core::{HotspotPipeline, PipelineConfig};
///
/// let pipeline = HotspotPipeline::new(PipelineConfig::default())?;
/// let output = pipeline.run(&[], &[]);
/// assert!(output.hotspots.is_empty());
/// # Ok::<(), hotspot_core::PipelineConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HotspotPipeline {
    config: PipelineConfig,
    weighter: TemporalWeighter,
    restaurants: DensityClusterer,
    mobility: DensityClusterer,
    intersector: HotspotIntersector,
    fixed_projection: Option<LocalProjection>,
    null_island: LocalProjection,
}

impl HotspotPipeline {
    /// Validate the configuration and build every stage.
    ///
    /// # Errors
    /// Returns [`PipelineConfigError`] when any section is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineConfigError> {
        config.validate()?;
        let weighter = TemporalWeighter::new(config.temporal_weights)?;
        let restaurants = DensityClusterer::new(config.restaurant_clustering)
            .map_err(PipelineConfigError::RestaurantClustering)?;
        let mobility = DensityClusterer::new(config.mobility_clustering)
            .map_err(PipelineConfigError::MobilityClustering)?;
        let intersector = HotspotIntersector::new(config.intersection)?;
        let fixed_projection = config
            .projection_origin
            .map(LocalProjection::new)
            .transpose()?;
        let null_island = LocalProjection::new(ProjectionOrigin { lon: 0.0, lat: 0.0 })?;
        Ok(Self {
            config,
            weighter,
            restaurants,
            mobility,
            intersector,
            fixed_projection,
            null_island,
        })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over pre-cleaned inputs.
    ///
    /// Malformed records, degenerate clusters and threshold rejections are
    /// counted in [`PipelineOutput::diagnostics`]; the run itself never fails.
    #[must_use]
    pub fn run(&self, places: &[PlaceRecord], events: &[RawMobilityEvent]) -> PipelineOutput {
        let projection = self.resolve_projection(places, events);
        let (dining, mobility) = rayon::join(
            || self.dining_branch(places, &projection),
            || self.mobility_branch(events, &projection),
        );
        let outcome = self.intersector.intersect(&dining.zones, &mobility.areas);
        if let Some(top) = outcome
            .hotspots
            .iter()
            .map(|h| h.popularity_score)
            .max_by(f64::total_cmp)
        {
            info!(
                "{} final hotspots; top popularity {top:.1}",
                outcome.hotspots.len()
            );
        }
        PipelineOutput {
            projection,
            diagnostics: PipelineDiagnostics {
                skipped_places: dining.skipped,
                skipped_events: mobility.skipped,
                restaurant_clustering: dining.summary,
                mobility_clustering: mobility.summary,
                restaurant_validation: dining.validation,
                mobility_validation: mobility.validation,
                dining_zones: dining.diagnostics,
                hotspot_areas: mobility.diagnostics,
                intersections: outcome.diagnostics,
            },
            dining_zones: dining.zones,
            hotspot_areas: mobility.areas,
            hotspots: outcome.hotspots,
        }
    }

    fn resolve_projection(
        &self,
        places: &[PlaceRecord],
        events: &[RawMobilityEvent],
    ) -> LocalProjection {
        if let Some(projection) = self.fixed_projection {
            return projection;
        }
        let locations = places
            .iter()
            .map(|p| p.location)
            .chain(events.iter().map(|e| e.location));
        LocalProjection::centred_on(locations).unwrap_or_else(|| {
            warn!("no valid input coordinates; projecting about (0, 0)");
            self.null_island
        })
    }

    fn dining_branch(&self, places: &[PlaceRecord], projection: &LocalProjection) -> DiningBranch {
        let mut skipped = 0;
        let projected: Vec<(Coord<f64>, Option<f64>)> = places
            .iter()
            .filter_map(|place| match projection.project(place.location) {
                Ok(location) => Some((location, place.rating)),
                Err(err) => {
                    skipped += 1;
                    debug!("skipping place {}: {err}", place.id);
                    None
                }
            })
            .collect();
        let coords: Vec<Coord<f64>> = projected.iter().map(|(c, _)| *c).collect();
        let assignment = self.restaurants.cluster(&coords);
        let summary = assignment.summary();
        let validation = ClusterValidation::compute(&coords, &assignment);
        info!(
            "restaurants: {} points, {} clusters, {} noise",
            summary.points, summary.clusters, summary.noise
        );
        let builder = ZonePolygonBuilder::new(self.config.zones.dining_buffer_m);
        let (zones, diagnostics) = builder.dining_zones(&projected, &assignment);
        info!("built {} dining zones", zones.len());
        DiningBranch {
            zones,
            skipped,
            summary,
            validation,
            diagnostics,
        }
    }

    fn mobility_branch(
        &self,
        events: &[RawMobilityEvent],
        projection: &LocalProjection,
    ) -> MobilityBranch {
        let weighted = self.weighter.weigh_all(events);
        let aggregation = &self.config.mobility_aggregation;
        let (points, skipped) = aggregation.aggregate(&weighted, projection);
        let (replicated, first_replica) = aggregation.replicate(&points);
        let replicated_assignment = self.mobility.cluster(&replicated);
        let summary = replicated_assignment.summary();
        let validation = ClusterValidation::compute(&replicated, &replicated_assignment);
        info!(
            "mobility: {} points ({} replicated), {} clusters, {} noise",
            points.len(),
            summary.points,
            summary.clusters,
            summary.noise
        );
        let assignment = replicated_assignment.select(&first_replica);
        let builder = ZonePolygonBuilder::new(self.config.zones.hotspot_buffer_m);
        let (areas, diagnostics) = builder.hotspot_areas(&points, &assignment);
        info!("built {} hotspot areas", areas.len());
        MobilityBranch {
            areas,
            skipped,
            summary,
            validation,
            diagnostics,
        }
    }
}
