//! Turn weighted drop-offs into clustering input.
//!
//! Drop-offs can optionally be binned into H3 cells first. Weights enter the
//! clustering by replication: a point is repeated in proportion to its rounded
//! weight, capped so one heavy cell cannot dominate.

use std::collections::BTreeMap;

use geo::Coord;
use h3o::{LatLng, Resolution};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MobilityEvent;
use crate::projection::LocalProjection;

/// A projected drop-off location carrying summed weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    /// Projected position.
    pub location: Coord<f64>,
    /// Summed temporal weight.
    pub weight: f64,
    /// Events folded into this point.
    pub event_count: u32,
}

/// How drop-offs are aggregated and replicated before clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityAggregation {
    /// H3 resolution to bin events at; `None` clusters raw events.
    pub h3_resolution: Option<u8>,
    /// Upper bound on copies of a single point in the clustering input.
    pub max_replicas: usize,
}

impl Default for MobilityAggregation {
    fn default() -> Self {
        Self {
            h3_resolution: None,
            max_replicas: 16,
        }
    }
}

/// Errors raised when validating [`MobilityAggregation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MobilityAggregationError {
    /// The H3 resolution was outside `0..=15`.
    #[error("h3 resolution {0} is outside 0..=15")]
    Resolution(u8),
    /// `max_replicas` was zero.
    #[error("max_replicas must be at least 1")]
    MaxReplicas,
}

impl MobilityAggregation {
    /// Check the settings are usable.
    ///
    /// # Errors
    /// Returns [`MobilityAggregationError`] for an invalid resolution or a
    /// zero replica cap.
    pub fn validate(&self) -> Result<(), MobilityAggregationError> {
        if let Some(raw) = self.h3_resolution {
            Resolution::try_from(raw).map_err(|_| MobilityAggregationError::Resolution(raw))?;
        }
        if self.max_replicas == 0 {
            return Err(MobilityAggregationError::MaxReplicas);
        }
        Ok(())
    }

    /// Project events, binning them into H3 cells when configured.
    ///
    /// Events that cannot be projected are dropped and counted in the second
    /// element of the result.
    #[must_use]
    pub fn aggregate(
        &self,
        events: &[MobilityEvent],
        projection: &LocalProjection,
    ) -> (Vec<WeightedPoint>, usize) {
        let resolution = self
            .h3_resolution
            .and_then(|raw| Resolution::try_from(raw).ok());
        let Some(resolution) = resolution else {
            return project_each(events, projection);
        };

        let mut skipped = 0_usize;
        let mut cells: BTreeMap<u64, CellAccumulator> = BTreeMap::new();
        for event in events {
            let location = event.location();
            let Ok(lat_lng) = LatLng::new(location.y, location.x) else {
                skipped += 1;
                continue;
            };
            let cell = u64::from(lat_lng.to_cell(resolution));
            cells.entry(cell).or_default().add(location, event.weight());
        }
        let mut points = Vec::with_capacity(cells.len());
        for accumulator in cells.into_values() {
            match projection.project(accumulator.mean()) {
                Ok(projected) => points.push(WeightedPoint {
                    location: projected,
                    weight: accumulator.weight,
                    event_count: accumulator.count,
                }),
                Err(_) => {
                    skipped += usize::try_from(accumulator.count).unwrap_or(usize::MAX);
                }
            }
        }
        debug!(
            "binned {} events into {} cells at resolution {resolution}",
            events.len(),
            points.len()
        );
        (points, skipped)
    }

    /// Expand points into the replicated clustering input.
    ///
    /// Returns the replicated coordinates and, for each input point, the
    /// index of its first replica.
    #[must_use]
    pub fn replicate(&self, points: &[WeightedPoint]) -> (Vec<Coord<f64>>, Vec<usize>) {
        let mut coords = Vec::with_capacity(points.len());
        let mut first_replica = Vec::with_capacity(points.len());
        for point in points {
            first_replica.push(coords.len());
            let copies = replica_count(point.weight, self.max_replicas);
            coords.extend(std::iter::repeat_n(point.location, copies));
        }
        (coords, first_replica)
    }
}

fn replica_count(weight: f64, cap: usize) -> usize {
    let rounded = weight.round();
    if !rounded.is_finite() || rounded < 1.0 {
        return 1;
    }
    let cap_f = cap as f64;
    if rounded >= cap_f {
        cap
    } else {
        (1..cap)
            .find(|n| (*n as f64) >= rounded)
            .unwrap_or(cap)
    }
}

fn project_each(
    events: &[MobilityEvent],
    projection: &LocalProjection,
) -> (Vec<WeightedPoint>, usize) {
    let mut skipped = 0_usize;
    let points = events
        .iter()
        .filter_map(|event| match projection.project(event.location()) {
            Ok(location) => Some(WeightedPoint {
                location,
                weight: event.weight(),
                event_count: 1,
            }),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();
    (points, skipped)
}

#[derive(Debug, Default)]
struct CellAccumulator {
    lon_sum: f64,
    lat_sum: f64,
    weight: f64,
    count: u32,
}

impl CellAccumulator {
    fn add(&mut self, location: Coord<f64>, weight: f64) {
        self.lon_sum += location.x;
        self.lat_sum += location.y;
        self.weight += weight;
        self.count = self.count.saturating_add(1);
    }

    fn mean(&self) -> Coord<f64> {
        let n = f64::from(self.count.max(1));
        Coord {
            x: self.lon_sum / n,
            y: self.lat_sum / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{manhattan_projection, saturday_dinner_events};
    use rstest::rstest;

    #[rstest]
    #[case(0.3, 1)]
    #[case(1.5, 2)]
    #[case(4.4, 4)]
    #[case(250.0, 16)]
    #[case(f64::NAN, 1)]
    fn replica_counts_round_and_clamp(#[case] weight: f64, #[case] expected: usize) {
        assert_eq!(replica_count(weight, 16), expected);
    }

    #[rstest]
    fn replicate_records_first_replica() {
        let aggregation = MobilityAggregation::default();
        let points = [
            WeightedPoint {
                location: Coord { x: 0.0, y: 0.0 },
                weight: 3.0,
                event_count: 1,
            },
            WeightedPoint {
                location: Coord { x: 5.0, y: 5.0 },
                weight: 0.3,
                event_count: 1,
            },
        ];
        let (coords, first) = aggregation.replicate(&points);
        assert_eq!(coords.len(), 4);
        assert_eq!(first, vec![0, 3]);
    }

    #[rstest]
    fn rejects_bad_resolution() {
        let aggregation = MobilityAggregation {
            h3_resolution: Some(16),
            ..MobilityAggregation::default()
        };
        assert_eq!(
            aggregation.validate(),
            Err(MobilityAggregationError::Resolution(16))
        );
    }

    #[rstest]
    fn h3_binning_sums_weights() {
        let projection = manhattan_projection();
        let events = saturday_dinner_events(
            Coord {
                x: -73.9855,
                y: 40.7580,
            },
            12,
            0.00001,
        );
        let aggregation = MobilityAggregation {
            h3_resolution: Some(7),
            ..MobilityAggregation::default()
        };
        let (points, skipped) = aggregation.aggregate(&events, &projection);
        assert_eq!(skipped, 0);
        let total: u32 = points.iter().map(|p| p.event_count).sum();
        assert_eq!(total, 12);
        let weight: f64 = points.iter().map(|p| p.weight).sum();
        assert!((weight - 18.0).abs() < 1e-9);
    }

    #[rstest]
    fn raw_events_project_one_to_one() {
        let projection = manhattan_projection();
        let events = saturday_dinner_events(
            Coord {
                x: -73.9855,
                y: 40.7580,
            },
            5,
            0.001,
        );
        let (points, skipped) = MobilityAggregation::default().aggregate(&events, &projection);
        assert_eq!((points.len(), skipped), (5, 0));
    }
}
