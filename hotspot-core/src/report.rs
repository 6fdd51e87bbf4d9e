//! Read-only summaries of a hotspot collection and of a pipeline run.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterValidation, ClusteringSummary};
use crate::intersect::IntersectionDiagnostics;
use crate::model::{FinalHotspot, HotspotId};
use crate::pipeline::PipelineOutput;
use crate::zone::ZoneDiagnostics;

/// Number of hotspots listed in [`AnalysisReport::top_hotspots`].
pub const TOP_HOTSPOTS: usize = 10;

/// Aggregate figures over a hotspot collection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HotspotStats {
    /// Number of hotspots.
    pub count: usize,
    /// Sum of restaurant counts.
    pub total_restaurants: u64,
    /// Sum of mobility weights.
    pub total_mobility_weight: f64,
    /// Sum of intersection areas in square metres.
    pub total_area: f64,
    /// Lowest popularity score, if any hotspot exists.
    pub min_popularity: Option<f64>,
    /// Highest popularity score, if any hotspot exists.
    pub max_popularity: Option<f64>,
    /// Mean popularity score, if any hotspot exists.
    pub mean_popularity: Option<f64>,
}

impl HotspotStats {
    /// Reduce a hotspot slice.
    ///
    /// # Examples
    /// ```
    /// use hotspot_core::HotspotStats;
    ///
    /// let stats = HotspotStats::from_hotspots(&[]);
    /// assert_eq!(stats.count, 0);
    /// assert_eq!(stats.max_popularity, None);
    /// ```
    #[must_use]
    pub fn from_hotspots(hotspots: &[FinalHotspot]) -> Self {
        let popularity = || hotspots.iter().map(|h| h.popularity_score);
        let count = hotspots.len();
        Self {
            count,
            total_restaurants: hotspots.iter().map(|h| u64::from(h.restaurant_count)).sum(),
            total_mobility_weight: hotspots.iter().map(|h| h.mobility_weight).sum(),
            total_area: hotspots.iter().map(|h| h.intersection_area).sum(),
            min_popularity: popularity().min_by(f64::total_cmp),
            max_popularity: popularity().max_by(f64::total_cmp),
            mean_popularity: (count > 0).then(|| popularity().sum::<f64>() / count as f64),
        }
    }
}

/// Count and total area of one zone kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// Zones built.
    pub count: usize,
    /// Summed zone area in square metres.
    pub total_area: f64,
    /// Skips recorded while building.
    pub diagnostics: ZoneDiagnostics,
}

/// One entry of the top-hotspot table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopHotspot {
    /// Hotspot identifier.
    pub hotspot_id: HotspotId,
    /// Popularity score.
    pub popularity_score: f64,
    /// Restaurants in the source dining zone.
    pub restaurant_count: u32,
    /// Mobility weight of the source hotspot area.
    pub mobility_weight: f64,
    /// Intersection area in square metres.
    pub intersection_area: f64,
    /// WGS84 centroid longitude.
    pub centroid_lon: f64,
    /// WGS84 centroid latitude.
    pub centroid_lat: f64,
}

/// Machine-readable account of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Restaurant clustering counts.
    pub restaurant_clustering: ClusteringSummary,
    /// Mobility clustering counts.
    pub mobility_clustering: ClusteringSummary,
    /// Restaurant clustering quality, when two or more clusters exist.
    pub restaurant_validation: Option<ClusterValidation>,
    /// Mobility clustering quality, when two or more clusters exist.
    pub mobility_validation: Option<ClusterValidation>,
    /// Dining zones built.
    pub dining_zones: ZoneSummary,
    /// Hotspot areas built.
    pub hotspot_areas: ZoneSummary,
    /// Fusion counters.
    pub intersections: IntersectionDiagnostics,
    /// Final hotspot totals.
    pub stats: HotspotStats,
    /// Most popular hotspots, best first.
    pub top_hotspots: Vec<TopHotspot>,
}

impl AnalysisReport {
    /// Summarise a completed run.
    #[must_use]
    pub fn from_output(output: &PipelineOutput) -> Self {
        let diagnostics = &output.diagnostics;
        let mut ranked: Vec<&FinalHotspot> = output.hotspots.iter().collect();
        ranked.sort_by(|a, b| {
            b.popularity_score
                .total_cmp(&a.popularity_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        let top_hotspots = ranked
            .into_iter()
            .take(TOP_HOTSPOTS)
            .filter_map(|hotspot| {
                let centroid = output.projection.unproject(hotspot.centroid()?);
                Some(TopHotspot {
                    hotspot_id: hotspot.id,
                    popularity_score: hotspot.popularity_score,
                    restaurant_count: hotspot.restaurant_count,
                    mobility_weight: hotspot.mobility_weight,
                    intersection_area: hotspot.intersection_area,
                    centroid_lon: centroid.x,
                    centroid_lat: centroid.y,
                })
            })
            .collect();
        Self {
            restaurant_clustering: diagnostics.restaurant_clustering,
            mobility_clustering: diagnostics.mobility_clustering,
            restaurant_validation: diagnostics.restaurant_validation,
            mobility_validation: diagnostics.mobility_validation,
            dining_zones: ZoneSummary {
                count: output.dining_zones.len(),
                total_area: output.dining_zones.iter().map(|z| z.zone.area).sum(),
                diagnostics: diagnostics.dining_zones,
            },
            hotspot_areas: ZoneSummary {
                count: output.hotspot_areas.len(),
                total_area: output.hotspot_areas.iter().map(|z| z.zone.area).sum(),
                diagnostics: diagnostics.hotspot_areas,
            },
            intersections: diagnostics.intersections,
            stats: HotspotStats::from_hotspots(&output.hotspots),
            top_hotspots,
        }
    }
}
