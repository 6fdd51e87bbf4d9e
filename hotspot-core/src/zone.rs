//! Buffered convex-hull footprints for clusters.

use std::collections::BTreeSet;

use geo::{Area, Buffer, ConvexHull, Coord, MultiPoint, Point, Polygon, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::{ClusterAssignment, ClusterId};
use crate::mobility::WeightedPoint;

/// Hulls with less area than this are treated as collinear.
const COLLINEAR_AREA_EPSILON: f64 = 1e-6;

/// Buffer distances per zone kind, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneParams {
    /// Buffer around restaurant hulls.
    pub dining_buffer_m: f64,
    /// Buffer around drop-off hulls. Larger, since drop-offs land near
    /// rather than at venues.
    pub hotspot_buffer_m: f64,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            dining_buffer_m: 100.0,
            hotspot_buffer_m: 150.0,
        }
    }
}

/// Errors raised when validating [`ZoneParams`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ZoneParamsError {
    /// A buffer distance was zero, negative or not finite.
    #[error("{field} must be finite and positive, got {value}")]
    Buffer {
        /// Offending field name.
        field: &'static str,
        /// Rejected distance.
        value: f64,
    },
}

impl ZoneParams {
    /// Check both buffers are positive.
    ///
    /// # Errors
    /// Returns [`ZoneParamsError::Buffer`] for the first invalid distance.
    pub fn validate(&self) -> Result<(), ZoneParamsError> {
        for (field, value) in [
            ("dining_buffer_m", self.dining_buffer_m),
            ("hotspot_buffer_m", self.hotspot_buffer_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ZoneParamsError::Buffer { field, value });
            }
        }
        Ok(())
    }
}

/// A valid polygon footprint for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    /// Source cluster.
    pub cluster_id: ClusterId,
    /// Projected footprint.
    pub polygon: Polygon<f64>,
    /// Footprint area in square metres; always positive.
    pub area: f64,
}

/// Footprint of a restaurant cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct DiningZone {
    /// Geometry and source cluster.
    pub zone: Zone,
    /// Restaurants in the cluster.
    pub restaurant_count: u32,
    /// Mean rating over members that carry one.
    pub avg_rating: Option<f64>,
}

/// Footprint of a drop-off cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotArea {
    /// Geometry and source cluster.
    pub zone: Zone,
    /// Summed temporal weight of the cluster.
    pub mobility_weight: f64,
    /// Raw events folded into the cluster.
    pub event_count: u32,
}

/// Why a cluster produced no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ZoneRejection {
    /// Fewer than three distinct points.
    #[error("cluster has {distinct} distinct points; at least 3 are required")]
    Degenerate {
        /// Distinct points found.
        distinct: usize,
    },
    /// The buffered hull was empty or invalid.
    #[error("buffered hull is empty or invalid")]
    InvalidGeometry,
}

/// Counters for one zoning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneDiagnostics {
    /// Zones produced.
    pub built: usize,
    /// Clusters with fewer than three distinct points.
    pub skipped_degenerate: usize,
    /// Clusters whose buffered hull was not a valid polygon.
    pub skipped_invalid: usize,
}

impl ZoneDiagnostics {
    fn record(&mut self, outcome: Result<(), ZoneRejection>) {
        match outcome {
            Ok(()) => self.built += 1,
            Err(ZoneRejection::Degenerate { .. }) => self.skipped_degenerate += 1,
            Err(ZoneRejection::InvalidGeometry) => self.skipped_invalid += 1,
        }
    }
}

/// Builds buffered hull polygons around clusters.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use hotspot_core::{ClusterId, ZonePolygonBuilder};
///
/// let builder = ZonePolygonBuilder::new(10.0);
/// let zone = builder.build(
///     ClusterId(0),
///     &[
///         Coord { x: 0.0, y: 0.0 },
///         Coord { x: 100.0, y: 0.0 },
///         Coord { x: 0.0, y: 100.0 },
///     ],
/// )?;
/// assert!(zone.area > 5_000.0);
/// # Ok::<(), hotspot_core::ZoneRejection>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonePolygonBuilder {
    buffer_m: f64,
}

impl ZonePolygonBuilder {
    /// Builder expanding hulls by `buffer_m` metres.
    #[must_use]
    pub const fn new(buffer_m: f64) -> Self {
        Self { buffer_m }
    }

    /// Buffer distance in metres.
    #[must_use]
    pub const fn buffer_m(&self) -> f64 {
        self.buffer_m
    }

    /// Build the zone for one cluster's projected points.
    ///
    /// # Errors
    /// Returns [`ZoneRejection`] when the cluster has fewer than three
    /// distinct points or the buffered hull is not a valid polygon.
    pub fn build(&self, cluster_id: ClusterId, points: &[Coord<f64>]) -> Result<Zone, ZoneRejection> {
        let distinct = points
            .iter()
            .map(|c| (c.x.to_bits(), c.y.to_bits()))
            .collect::<BTreeSet<_>>()
            .len();
        if distinct < 3 {
            return Err(ZoneRejection::Degenerate { distinct });
        }

        let hull = MultiPoint::from(points.iter().copied().map(Point::from).collect::<Vec<_>>())
            .convex_hull();
        let buffered = if hull.unsigned_area() > COLLINEAR_AREA_EPSILON {
            hull.buffer(self.buffer_m)
        } else {
            hull.exterior().buffer(self.buffer_m)
        };
        let polygon = buffered
            .into_iter()
            .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
            .ok_or(ZoneRejection::InvalidGeometry)?;
        let area = polygon.unsigned_area();
        if !area.is_finite() || area <= 0.0 || !polygon.is_valid() {
            return Err(ZoneRejection::InvalidGeometry);
        }
        Ok(Zone {
            cluster_id,
            polygon,
            area,
        })
    }

    /// Build one dining zone per restaurant cluster.
    ///
    /// `places` holds each restaurant's projected location and rating, in the
    /// order the assignment labels them.
    #[must_use]
    pub fn dining_zones(
        &self,
        places: &[(Coord<f64>, Option<f64>)],
        assignment: &ClusterAssignment,
    ) -> (Vec<DiningZone>, ZoneDiagnostics) {
        self.build_all(places, |(location, _)| *location, assignment, |zone, members| {
            let ratings: Vec<f64> = members.iter().filter_map(|(_, rating)| *rating).collect();
            let avg_rating = (!ratings.is_empty())
                .then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);
            DiningZone {
                zone,
                restaurant_count: u32::try_from(members.len()).unwrap_or(u32::MAX),
                avg_rating,
            }
        })
    }

    /// Build one hotspot area per drop-off cluster.
    #[must_use]
    pub fn hotspot_areas(
        &self,
        points: &[WeightedPoint],
        assignment: &ClusterAssignment,
    ) -> (Vec<HotspotArea>, ZoneDiagnostics) {
        self.build_all(points, |point| point.location, assignment, |zone, members| {
            HotspotArea {
                zone,
                mobility_weight: members.iter().map(|point| point.weight).sum(),
                event_count: members
                    .iter()
                    .fold(0_u32, |acc, point| acc.saturating_add(point.event_count)),
            }
        })
    }

    fn build_all<T, Z>(
        &self,
        items: &[T],
        location: impl Fn(&T) -> Coord<f64>,
        assignment: &ClusterAssignment,
        make: impl Fn(Zone, &[&T]) -> Z,
    ) -> (Vec<Z>, ZoneDiagnostics) {
        let mut diagnostics = ZoneDiagnostics::default();
        let mut zones = Vec::new();
        for (cluster_id, indices) in assignment.groups() {
            let members: Vec<&T> = indices.iter().filter_map(|&i| items.get(i)).collect();
            let coords: Vec<Coord<f64>> = members.iter().map(|item| location(item)).collect();
            match self.build(cluster_id, &coords) {
                Ok(zone) => {
                    diagnostics.record(Ok(()));
                    zones.push(make(zone, &members));
                }
                Err(rejection) => {
                    debug!("cluster {cluster_id} skipped: {rejection}");
                    diagnostics.record(Err(rejection));
                }
            }
        }
        if diagnostics.skipped_degenerate + diagnostics.skipped_invalid > 0 {
            warn!(
                "skipped {} degenerate and {} invalid clusters",
                diagnostics.skipped_degenerate, diagnostics.skipped_invalid
            );
        }
        (zones, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::blob;
    use rstest::rstest;

    fn square(side: f64) -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: side, y: 0.0 },
            Coord { x: side, y: side },
            Coord { x: 0.0, y: side },
        ]
    }

    #[rstest]
    fn buffer_grows_the_hull() {
        let zone = ZonePolygonBuilder::new(50.0)
            .build(ClusterId(0), &square(100.0))
            .expect("square builds");
        // Square plus four side strips plus a full disc at the corners.
        let expected = 100.0 * 100.0 + 4.0 * 100.0 * 50.0 + std::f64::consts::PI * 50.0 * 50.0;
        assert!((zone.area - expected).abs() / expected < 0.01, "area {}", zone.area);
    }

    #[rstest]
    #[case(vec![Coord { x: 0.0, y: 0.0 }; 10], 1)]
    #[case(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }], 2)]
    fn fewer_than_three_distinct_points_is_degenerate(
        #[case] points: Vec<Coord<f64>>,
        #[case] distinct: usize,
    ) {
        assert_eq!(
            ZonePolygonBuilder::new(10.0).build(ClusterId(0), &points),
            Err(ZoneRejection::Degenerate { distinct })
        );
    }

    #[rstest]
    fn collinear_points_still_produce_area() {
        let points = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 50.0, y: 0.0 },
            Coord { x: 100.0, y: 0.0 },
        ];
        let zone = ZonePolygonBuilder::new(10.0)
            .build(ClusterId(2), &points)
            .expect("collinear points build");
        assert!(zone.area > 100.0 * 20.0 * 0.99);
        assert_eq!(zone.cluster_id, ClusterId(2));
    }

    #[rstest]
    fn dining_zones_count_members_and_average_ratings() {
        let places: Vec<(Coord<f64>, Option<f64>)> = blob(Coord { x: 0.0, y: 0.0 }, 6, 40.0)
            .into_iter()
            .zip([Some(4.0), None, Some(3.0), Some(5.0), None, None])
            .chain([(Coord { x: 9_000.0, y: 0.0 }, Some(1.0))])
            .collect();
        let assignment = ClusterAssignment::from_raw(&[0, 0, 0, 0, 0, 0, -1]);
        let (zones, diagnostics) = ZonePolygonBuilder::new(100.0).dining_zones(&places, &assignment);
        assert_eq!(diagnostics.built, 1);
        let zone = zones.first().expect("one zone");
        assert_eq!(zone.restaurant_count, 6);
        assert_eq!(zone.avg_rating, Some(4.0));
    }

    #[rstest]
    fn hotspot_areas_sum_weights_and_count_skips() {
        let mut points: Vec<WeightedPoint> = blob(Coord { x: 0.0, y: 0.0 }, 5, 60.0)
            .into_iter()
            .map(|location| WeightedPoint {
                location,
                weight: 1.5,
                event_count: 2,
            })
            .collect();
        points.push(WeightedPoint {
            location: Coord { x: 500.0, y: 500.0 },
            weight: 1.0,
            event_count: 1,
        });
        let assignment = ClusterAssignment::from_raw(&[0, 0, 0, 0, 0, 1]);
        let (areas, diagnostics) = ZonePolygonBuilder::new(150.0).hotspot_areas(&points, &assignment);
        assert_eq!(
            diagnostics,
            ZoneDiagnostics {
                built: 1,
                skipped_degenerate: 1,
                skipped_invalid: 0,
            }
        );
        let area = areas.first().expect("one area");
        assert!((area.mobility_weight - 7.5).abs() < 1e-9);
        assert_eq!(area.event_count, 10);
    }

    #[rstest]
    #[case(ZoneParams { dining_buffer_m: 0.0, ..ZoneParams::default() })]
    #[case(ZoneParams { hotspot_buffer_m: f64::INFINITY, ..ZoneParams::default() })]
    fn rejects_bad_buffers(#[case] params: ZoneParams) {
        assert!(params.validate().is_err());
    }
}
