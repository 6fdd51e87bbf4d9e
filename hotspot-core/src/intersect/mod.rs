//! Fuse dining zones with hotspot areas.
//!
//! Every (dining zone, hotspot area) pair is intersected. Each polygon part of
//! a non-empty intersection is evaluated on its own against the area and
//! overlap thresholds, and the survivors are scored relative to each other.

mod scoring;

use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon, Polygon};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::ClusterId;
use crate::model::FinalHotspot;
use crate::zone::{DiningZone, HotspotArea};

pub use scoring::popularity_score;

/// Thresholds and weighting for the fusion step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionParams {
    /// Minimum part area in square metres.
    pub min_area: f64,
    /// Minimum overlap ratio in `0.0..=1.0`.
    pub min_overlap: f64,
    /// Share of popularity given to restaurant density; the remainder goes to
    /// mobility weight.
    pub restaurant_weight: f64,
}

impl Default for IntersectionParams {
    fn default() -> Self {
        Self {
            min_area: 10_000.0,
            min_overlap: 0.15,
            restaurant_weight: 0.5,
        }
    }
}

/// Errors raised when validating [`IntersectionParams`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IntersectionParamsError {
    /// `min_area` was negative or not finite.
    #[error("min_area must be finite and non-negative, got {0}")]
    MinArea(f64),
    /// `min_overlap` lay outside `0.0..=1.0`.
    #[error("min_overlap must lie in 0..=1, got {0}")]
    MinOverlap(f64),
    /// `restaurant_weight` lay outside `0.0..=1.0`.
    #[error("restaurant_weight must lie in 0..=1, got {0}")]
    RestaurantWeight(f64),
}

impl IntersectionParams {
    /// Check thresholds and weighting.
    ///
    /// # Errors
    /// Returns [`IntersectionParamsError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), IntersectionParamsError> {
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(IntersectionParamsError::MinArea(self.min_area));
        }
        if !(0.0..=1.0).contains(&self.min_overlap) {
            return Err(IntersectionParamsError::MinOverlap(self.min_overlap));
        }
        if !(0.0..=1.0).contains(&self.restaurant_weight) {
            return Err(IntersectionParamsError::RestaurantWeight(
                self.restaurant_weight,
            ));
        }
        Ok(())
    }
}

/// Result of intersecting two zones, resolved once so later code only sees
/// single polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum IntersectionShape {
    /// The zones do not overlap.
    Empty,
    /// A single polygon.
    Single(Polygon<f64>),
    /// Several disjoint polygons.
    Multi(Vec<Polygon<f64>>),
}

impl From<MultiPolygon<f64>> for IntersectionShape {
    fn from(multi: MultiPolygon<f64>) -> Self {
        let mut parts: Vec<Polygon<f64>> = multi
            .into_iter()
            .filter(|part| part.unsigned_area() > 0.0)
            .collect();
        match parts.len() {
            0 => Self::Empty,
            1 => parts.pop().map_or(Self::Empty, Self::Single),
            _ => Self::Multi(parts),
        }
    }
}

impl IntersectionShape {
    /// Individual polygons, in backend order.
    #[must_use]
    pub fn into_parts(self) -> Vec<Polygon<f64>> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(polygon) => vec![polygon],
            Self::Multi(parts) => parts,
        }
    }
}

/// Counters for one fusion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntersectionDiagnostics {
    /// Zone pairs considered.
    pub pairs_evaluated: usize,
    /// Pairs with an empty intersection.
    pub disjoint: usize,
    /// Polygon parts evaluated.
    pub parts_evaluated: usize,
    /// Parts below the area threshold.
    pub rejected_area: usize,
    /// Parts meeting the area threshold but below the overlap threshold.
    pub rejected_overlap: usize,
    /// Parts accepted as hotspots.
    pub accepted: usize,
}

impl IntersectionDiagnostics {
    fn merge(self, other: Self) -> Self {
        Self {
            pairs_evaluated: self.pairs_evaluated + other.pairs_evaluated,
            disjoint: self.disjoint + other.disjoint,
            parts_evaluated: self.parts_evaluated + other.parts_evaluated,
            rejected_area: self.rejected_area + other.rejected_area,
            rejected_overlap: self.rejected_overlap + other.rejected_overlap,
            accepted: self.accepted + other.accepted,
        }
    }
}

/// Accepted, scored hotspots plus diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntersectionOutcome {
    /// Hotspots ordered by id.
    pub hotspots: Vec<FinalHotspot>,
    /// Counters for the pass.
    pub diagnostics: IntersectionDiagnostics,
}

/// A part that passed both thresholds, awaiting relative scoring.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) dining_cluster_id: ClusterId,
    pub(crate) hotspot_cluster_id: ClusterId,
    pub(crate) geometry: Polygon<f64>,
    pub(crate) area: f64,
    pub(crate) overlap_ratio: f64,
    pub(crate) restaurant_count: u32,
    pub(crate) mobility_weight: f64,
    pub(crate) avg_rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartVerdict {
    Accept,
    TooSmall,
    TooLittleOverlap,
}

/// Intersects dining zones with hotspot areas and scores the survivors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotIntersector {
    params: IntersectionParams,
}

impl HotspotIntersector {
    /// Build an intersector from validated parameters.
    ///
    /// # Errors
    /// Returns [`IntersectionParamsError`] when the parameters are invalid.
    pub fn new(params: IntersectionParams) -> Result<Self, IntersectionParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &IntersectionParams {
        &self.params
    }

    /// The smaller of the two one-sided overlap fractions, capped at one.
    #[must_use]
    pub fn overlap_ratio(part_area: f64, dining_area: f64, hotspot_area: f64) -> f64 {
        if dining_area <= 0.0 || hotspot_area <= 0.0 {
            return 0.0;
        }
        (part_area / dining_area)
            .min(part_area / hotspot_area)
            .min(1.0)
    }

    fn verdict(&self, part_area: f64, overlap_ratio: f64) -> PartVerdict {
        if part_area < self.params.min_area {
            PartVerdict::TooSmall
        } else if overlap_ratio < self.params.min_overlap {
            PartVerdict::TooLittleOverlap
        } else {
            PartVerdict::Accept
        }
    }

    /// Fuse every pair and score the accepted parts.
    ///
    /// Hotspot ids follow (dining cluster id, hotspot cluster id, part index)
    /// order. An empty acceptance set short-circuits to an empty outcome.
    #[must_use]
    pub fn intersect(&self, dining: &[DiningZone], hotspots: &[HotspotArea]) -> IntersectionOutcome {
        let mut dining: Vec<&DiningZone> = dining.iter().collect();
        dining.sort_by_key(|zone| zone.zone.cluster_id);
        let mut areas: Vec<&HotspotArea> = hotspots.iter().collect();
        areas.sort_by_key(|area| area.zone.cluster_id);

        let per_zone: Vec<(Vec<Candidate>, IntersectionDiagnostics)> = dining
            .par_iter()
            .map(|zone| self.fuse_zone(zone, &areas))
            .collect();
        let (candidates, diagnostics) = per_zone.into_iter().fold(
            (Vec::new(), IntersectionDiagnostics::default()),
            |(mut all, totals), (found, diagnostics)| {
                all.extend(found);
                (all, totals.merge(diagnostics))
            },
        );

        info!(
            "intersections: {} pairs, {} disjoint, {} parts, {} too small, {} low overlap, {} accepted",
            diagnostics.pairs_evaluated,
            diagnostics.disjoint,
            diagnostics.parts_evaluated,
            diagnostics.rejected_area,
            diagnostics.rejected_overlap,
            diagnostics.accepted
        );
        if candidates.is_empty() {
            warn!("no intersection passed the area and overlap thresholds");
            return IntersectionOutcome {
                hotspots: Vec::new(),
                diagnostics,
            };
        }
        IntersectionOutcome {
            hotspots: scoring::score(candidates, self.params.restaurant_weight),
            diagnostics,
        }
    }

    fn fuse_zone(
        &self,
        dining: &DiningZone,
        areas: &[&HotspotArea],
    ) -> (Vec<Candidate>, IntersectionDiagnostics) {
        let mut diagnostics = IntersectionDiagnostics::default();
        let mut accepted = Vec::new();
        let dining_rect = dining.zone.polygon.bounding_rect();
        for area in areas {
            diagnostics.pairs_evaluated += 1;
            let boxes_meet = match (dining_rect, area.zone.polygon.bounding_rect()) {
                (Some(a), Some(b)) => a.intersects(&b),
                _ => false,
            };
            let shape = if boxes_meet {
                IntersectionShape::from(dining.zone.polygon.intersection(&area.zone.polygon))
            } else {
                IntersectionShape::Empty
            };
            if shape == IntersectionShape::Empty {
                diagnostics.disjoint += 1;
                continue;
            }
            for part in shape.into_parts() {
                diagnostics.parts_evaluated += 1;
                let part_area = part.unsigned_area();
                let overlap = Self::overlap_ratio(part_area, dining.zone.area, area.zone.area);
                match self.verdict(part_area, overlap) {
                    PartVerdict::TooSmall => diagnostics.rejected_area += 1,
                    PartVerdict::TooLittleOverlap => diagnostics.rejected_overlap += 1,
                    PartVerdict::Accept => {
                        diagnostics.accepted += 1;
                        accepted.push(Candidate {
                            dining_cluster_id: dining.zone.cluster_id,
                            hotspot_cluster_id: area.zone.cluster_id,
                            geometry: part,
                            area: part_area,
                            overlap_ratio: overlap,
                            restaurant_count: dining.restaurant_count,
                            mobility_weight: area.mobility_weight,
                            avg_rating: dining.avg_rating,
                        });
                    }
                }
                debug!(
                    "dining {} x hotspot {}: part area {part_area:.1}, overlap {overlap:.3}",
                    dining.zone.cluster_id, area.zone.cluster_id
                );
            }
        }
        (accepted, diagnostics)
    }
}
