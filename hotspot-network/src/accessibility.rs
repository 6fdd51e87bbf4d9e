//! Accessibility of hotspots from a query origin.

use geo::Coord;
use hotspot_core::HotspotId;
use log::debug;
use thiserror::Error;

use crate::graph::TransportGraph;

/// Errors raised before an accessibility search starts.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AccessibilityError {
    /// The time budget was zero, negative or not finite.
    #[error("time budget must be positive and finite, got {0}")]
    Budget(f64),
    /// The origin could not be snapped to the graph.
    #[error("origin ({lon}, {lat}) cannot be placed on the network")]
    Origin {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
}

/// A hotspot pinned to its nearest graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnappedTarget {
    /// Hotspot identifier.
    pub hotspot_id: HotspotId,
    /// Index of the nearest node.
    pub node: usize,
}

/// Travel time and accessibility of one reachable hotspot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accessibility {
    /// Hotspot identifier.
    pub hotspot_id: HotspotId,
    /// Shortest network travel time in minutes.
    pub travel_time_minutes: f64,
    /// Unused share of the budget, `0.0..=100.0`.
    pub score: f64,
}

/// Percentage of `budget` left after travelling for `travel_time` minutes.
///
/// Exactly 100 at zero travel time and exactly 0 at the budget.
///
/// # Examples
/// ```
/// use hotspot_network::accessibility_score;
///
/// assert_eq!(accessibility_score(0.0, 15.0), 100.0);
/// assert_eq!(accessibility_score(15.0, 15.0), 0.0);
/// assert_eq!(accessibility_score(7.5, 15.0), 50.0);
/// ```
#[must_use]
pub fn accessibility_score(travel_time: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    (100.0 * (1.0 - travel_time / budget)).clamp(0.0, 100.0)
}

/// Scores hotspots by how quickly they can be reached on one graph.
#[derive(Debug, Clone, Copy)]
pub struct AccessibilityScorer<'g> {
    graph: &'g TransportGraph,
}

impl<'g> AccessibilityScorer<'g> {
    /// Score against `graph`.
    #[must_use]
    pub const fn new(graph: &'g TransportGraph) -> Self {
        Self { graph }
    }

    /// Graph in use.
    #[must_use]
    pub const fn graph(&self) -> &'g TransportGraph {
        self.graph
    }

    /// Pin each hotspot centroid (WGS84) to its nearest node. Centroids that
    /// cannot be snapped are dropped.
    #[must_use]
    pub fn snap<I>(&self, centroids: I) -> Vec<SnappedTarget>
    where
        I: IntoIterator<Item = (HotspotId, Coord<f64>)>,
    {
        centroids
            .into_iter()
            .filter_map(|(hotspot_id, centroid)| {
                self.graph
                    .nearest_node(centroid)
                    .map(|node| SnappedTarget { hotspot_id, node })
            })
            .collect()
    }

    /// Run one bounded search from `origin` and score every target reached
    /// within `budget_minutes`.
    ///
    /// Targets beyond the budget or in another component are left out rather
    /// than scored zero. Output follows target order.
    ///
    /// # Errors
    /// Returns [`AccessibilityError`] when the budget is not positive or the
    /// origin cannot be snapped.
    pub fn score(
        &self,
        origin: Coord<f64>,
        budget_minutes: f64,
        targets: &[SnappedTarget],
    ) -> Result<Vec<Accessibility>, AccessibilityError> {
        if !(budget_minutes.is_finite() && budget_minutes > 0.0) {
            return Err(AccessibilityError::Budget(budget_minutes));
        }
        let source = self
            .graph
            .nearest_node(origin)
            .ok_or(AccessibilityError::Origin {
                lon: origin.x,
                lat: origin.y,
            })?;
        let reached = self.graph.travel_times_within(source, budget_minutes);
        let scored: Vec<Accessibility> = targets
            .iter()
            .filter_map(|target| {
                let travel_time_minutes = reached.time_to(target.node)?;
                Some(Accessibility {
                    hotspot_id: target.hotspot_id,
                    travel_time_minutes,
                    score: accessibility_score(travel_time_minutes, budget_minutes),
                })
            })
            .collect();
        debug!(
            "{} of {} hotspots reachable within {budget_minutes} min by {}",
            scored.len(),
            targets.len(),
            self.graph.mode()
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EdgeDefinition, NetworkDefinition, NodeDefinition};
    use hotspot_core::TravelMode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn line() -> TransportGraph {
        // Three nodes 400 m apart on foot at 4.8 km/h: five minutes per hop.
        let definition = NetworkDefinition {
            nodes: vec![
                NodeDefinition { id: 1, lon: 0.0, lat: 0.0 },
                NodeDefinition { id: 2, lon: 0.004, lat: 0.0 },
                NodeDefinition { id: 3, lon: 0.008, lat: 0.0 },
                NodeDefinition { id: 4, lon: 1.0, lat: 1.0 },
            ],
            edges: vec![
                EdgeDefinition { from: 1, to: 2, length_m: 400.0, bidirectional: true },
                EdgeDefinition { from: 2, to: 3, length_m: 400.0, bidirectional: true },
            ],
        };
        TransportGraph::from_definition(&definition, TravelMode::Walk, 4.8).expect("valid")
    }

    #[rstest]
    #[case(0.0, 100.0)]
    #[case(5.0, 50.0)]
    #[case(10.0, 0.0)]
    #[case(12.0, 0.0)]
    fn score_is_linear_in_remaining_budget(#[case] time: f64, #[case] expected: f64) {
        assert!((accessibility_score(time, 10.0) - expected).abs() < 1e-12);
    }

    #[rstest]
    fn scores_reachable_targets_only(line: TransportGraph) {
        let scorer = AccessibilityScorer::new(&line);
        let targets = scorer.snap([
            (HotspotId(0), Coord { x: 0.0, y: 0.0 }),
            (HotspotId(1), Coord { x: 0.004, y: 0.0 }),
            (HotspotId(2), Coord { x: 0.008, y: 0.0 }),
            (HotspotId(3), Coord { x: 1.0, y: 1.0 }),
        ]);
        let scored = scorer
            .score(Coord { x: 0.0, y: 0.0 }, 6.0, &targets)
            .expect("valid query");
        let ids: Vec<HotspotId> = scored.iter().map(|a| a.hotspot_id).collect();
        assert_eq!(ids, vec![HotspotId(0), HotspotId(1)]);
        assert_eq!(scored.first().map(|a| a.score), Some(100.0));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-3.0)]
    #[case::infinite(f64::INFINITY)]
    fn rejects_bad_budget(line: TransportGraph, #[case] budget: f64) {
        let scorer = AccessibilityScorer::new(&line);
        assert!(matches!(
            scorer.score(Coord { x: 0.0, y: 0.0 }, budget, &[]),
            Err(AccessibilityError::Budget(_))
        ));
    }

    #[rstest]
    fn rejects_unplaceable_origin(line: TransportGraph) {
        let scorer = AccessibilityScorer::new(&line);
        assert!(matches!(
            scorer.score(Coord { x: 200.0, y: 0.0 }, 10.0, &[]),
            Err(AccessibilityError::Origin { .. })
        ));
    }
}
