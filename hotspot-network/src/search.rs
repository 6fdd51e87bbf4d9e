//! Single-source shortest travel times with an explicit cutoff.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;
use ordered_float::OrderedFloat;

use crate::graph::TransportGraph;

/// Nodes reached from one source within a time budget.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReachableSet {
    times: Vec<Option<f64>>,
    settled: usize,
}

impl ReachableSet {
    /// Shortest travel time to `node`, or `None` when it lies beyond the
    /// cutoff or in another component.
    #[must_use]
    pub fn time_to(&self, node: usize) -> Option<f64> {
        self.times.get(node).copied().flatten()
    }

    /// Number of nodes settled by the search.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.settled
    }
}

impl TransportGraph {
    /// Dijkstra from `source`, never expanding past `cutoff_minutes`.
    ///
    /// Arcs whose head would be reached later than the cutoff are not
    /// relaxed, so the search touches only the isochrone around the source.
    /// An out-of-range source or a negative cutoff yields an empty set.
    ///
    /// # Examples
    /// ```
    /// use hotspot_core::TravelMode;
    /// use hotspot_network::{NetworkDefinition, TransportGraph};
    ///
    /// let text = r#"{
    ///     "nodes": [{"id": 1, "lon": 0.0, "lat": 0.0}, {"id": 2, "lon": 0.01, "lat": 0.0}],
    ///     "edges": [{"from": 1, "to": 2, "length_m": 1000.0}]
    /// }"#;
    /// let definition = NetworkDefinition::from_json_str(text).expect("valid JSON");
    /// let graph = TransportGraph::from_definition(&definition, TravelMode::Drive, 60.0)
    ///     .expect("valid network");
    /// let reached = graph.travel_times_within(0, 5.0);
    /// assert_eq!(reached.time_to(1), Some(1.0));
    /// assert_eq!(graph.travel_times_within(0, 0.5).time_to(1), None);
    /// ```
    #[must_use]
    pub fn travel_times_within(&self, source: usize, cutoff_minutes: f64) -> ReachableSet {
        let mut times: Vec<Option<f64>> = vec![None; self.node_count()];
        if cutoff_minutes.is_nan() || cutoff_minutes < 0.0 {
            return ReachableSet { times, settled: 0 };
        }
        let Some(start) = times.get_mut(source) else {
            return ReachableSet { times, settled: 0 };
        };
        *start = Some(0.0);

        let mut heap = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), source)));
        let mut settled = 0;
        while let Some(Reverse((OrderedFloat(elapsed), node))) = heap.pop() {
            if times
                .get(node)
                .copied()
                .flatten()
                .is_some_and(|best| elapsed > best)
            {
                continue;
            }
            settled += 1;
            for link in self.adjacency.get(node).into_iter().flatten() {
                let arrival = elapsed + link.minutes;
                if arrival > cutoff_minutes {
                    continue;
                }
                let Some(slot) = times.get_mut(link.to) else {
                    continue;
                };
                if slot.is_none_or(|best| arrival < best) {
                    *slot = Some(arrival);
                    heap.push(Reverse((OrderedFloat(arrival), link.to)));
                }
            }
        }
        debug!(
            "{} search from node {source}: {settled} nodes within {cutoff_minutes} min",
            self.mode()
        );
        ReachableSet { times, settled }
    }
}
