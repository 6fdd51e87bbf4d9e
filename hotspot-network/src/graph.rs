//! Time-annotated street graph for one travel mode.
//!
//! Nodes keep their input order; a node's position is its index everywhere in
//! this crate. Edge weights are traversal minutes at the mode's average speed.

use std::collections::HashMap;

use geo::Coord;
use hotspot_core::{LocalProjection, TravelMode};
use log::info;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use thiserror::Error;

use crate::definition::NetworkDefinition;

type IndexedNode = GeomWithData<[f64; 2], usize>;

/// Errors raised while building a [`TransportGraph`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkBuildError {
    /// The definition contained no nodes.
    #[error("network has no nodes")]
    Empty,
    /// The average speed was not a positive finite number.
    #[error("average speed for {mode} must be positive and finite, got {speed_kmh}")]
    Speed {
        /// Mode being built.
        mode: TravelMode,
        /// Offending speed in km/h.
        speed_kmh: f64,
    },
    /// Two nodes shared an identifier.
    #[error("node id {id} appears more than once")]
    DuplicateNode {
        /// Repeated identifier.
        id: u64,
    },
    /// A node position was not a valid WGS84 point.
    #[error("node {id} has invalid coordinates")]
    InvalidCoordinate {
        /// Node identifier.
        id: u64,
    },
    /// An edge referenced a node that does not exist.
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode {
        /// Position of the edge in the definition.
        edge: usize,
        /// Missing node identifier.
        node: u64,
    },
    /// An edge length was negative or not finite.
    #[error("edge {edge} has invalid length {length_m}")]
    EdgeLength {
        /// Position of the edge in the definition.
        edge: usize,
        /// Offending length in metres.
        length_m: f64,
    },
}

/// Outgoing edge stored in the adjacency list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Link {
    pub(crate) to: usize,
    pub(crate) minutes: f64,
}

/// Directed, time-weighted graph for a single [`TravelMode`].
#[derive(Debug, Clone)]
pub struct TransportGraph {
    mode: TravelMode,
    speed_kmh: f64,
    ids: Vec<u64>,
    positions: Vec<Coord<f64>>,
    pub(crate) adjacency: Vec<Vec<Link>>,
    projection: LocalProjection,
    index: RTree<IndexedNode>,
}

/// Minutes needed to cover `length_m` metres at `speed_kmh`.
///
/// # Examples
/// ```
/// use hotspot_network::travel_minutes;
///
/// assert_eq!(travel_minutes(1_000.0, 60.0), 1.0);
/// ```
#[must_use]
pub fn travel_minutes(length_m: f64, speed_kmh: f64) -> f64 {
    length_m / (speed_kmh * 1_000.0 / 60.0)
}

impl TransportGraph {
    /// Build the graph for `mode` at an average speed of `speed_kmh`.
    ///
    /// # Errors
    /// Returns [`NetworkBuildError`] when the definition is empty, repeats a
    /// node id, places a node off the globe, references a missing node, carries
    /// or carries a negative length. A non-positive speed is rejected too.
    pub fn from_definition(
        definition: &NetworkDefinition,
        mode: TravelMode,
        speed_kmh: f64,
    ) -> Result<Self, NetworkBuildError> {
        if !(speed_kmh.is_finite() && speed_kmh > 0.0) {
            return Err(NetworkBuildError::Speed { mode, speed_kmh });
        }
        if definition.nodes.is_empty() {
            return Err(NetworkBuildError::Empty);
        }

        let positions: Vec<Coord<f64>> = definition
            .nodes
            .iter()
            .map(|node| Coord {
                x: node.lon,
                y: node.lat,
            })
            .collect();
        let projection = LocalProjection::centred_on(positions.iter().copied()).ok_or_else(|| {
            definition
                .nodes
                .first()
                .map_or(NetworkBuildError::Empty, |node| {
                    NetworkBuildError::InvalidCoordinate { id: node.id }
                })
        })?;

        let mut lookup: HashMap<u64, usize> = HashMap::with_capacity(definition.nodes.len());
        let mut indexed = Vec::with_capacity(definition.nodes.len());
        for (index, node) in definition.nodes.iter().enumerate() {
            if lookup.insert(node.id, index).is_some() {
                return Err(NetworkBuildError::DuplicateNode { id: node.id });
            }
            let planar = projection
                .project(Coord {
                    x: node.lon,
                    y: node.lat,
                })
                .map_err(|_| NetworkBuildError::InvalidCoordinate { id: node.id })?;
            indexed.push(IndexedNode::new([planar.x, planar.y], index));
        }

        let mut adjacency: Vec<Vec<Link>> = vec![Vec::new(); definition.nodes.len()];
        for (position, edge) in definition.edges.iter().enumerate() {
            if !(edge.length_m.is_finite() && edge.length_m >= 0.0) {
                return Err(NetworkBuildError::EdgeLength {
                    edge: position,
                    length_m: edge.length_m,
                });
            }
            let resolve = |node: u64| {
                lookup
                    .get(&node)
                    .copied()
                    .ok_or(NetworkBuildError::UnknownNode {
                        edge: position,
                        node,
                    })
            };
            let from = resolve(edge.from)?;
            let to = resolve(edge.to)?;
            let minutes = travel_minutes(edge.length_m, speed_kmh);
            if let Some(out) = adjacency.get_mut(from) {
                out.push(Link { to, minutes });
            }
            if edge.bidirectional
                && let Some(out) = adjacency.get_mut(to)
            {
                out.push(Link { to: from, minutes });
            }
        }

        info!(
            "{mode} network: {} nodes, {} links at {speed_kmh} km/h",
            positions.len(),
            adjacency.iter().map(Vec::len).sum::<usize>()
        );
        Ok(Self {
            mode,
            speed_kmh,
            ids: definition.nodes.iter().map(|node| node.id).collect(),
            positions,
            adjacency,
            projection,
            index: RTree::bulk_load(indexed),
        })
    }

    /// Travel mode the weights were computed for.
    #[must_use]
    pub const fn mode(&self) -> TravelMode {
        self.mode
    }

    /// Average speed in km/h.
    #[must_use]
    pub const fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Caller identifier of the node at `index`.
    #[must_use]
    pub fn node_id(&self, index: usize) -> Option<u64> {
        self.ids.get(index).copied()
    }

    /// WGS84 position of the node at `index`.
    #[must_use]
    pub fn node_position(&self, index: usize) -> Option<Coord<f64>> {
        self.positions.get(index).copied()
    }

    /// Index of the node nearest to a WGS84 point.
    ///
    /// Distances are measured in the graph's local metric plane. Equidistant
    /// nodes resolve to the lowest index. Returns `None` for points that
    /// cannot be projected.
    #[must_use]
    pub fn nearest_node(&self, lon_lat: Coord<f64>) -> Option<usize> {
        let planar = self.projection.project(lon_lat).ok()?;
        let mut candidates = self
            .index
            .nearest_neighbor_iter_with_distance_2(&[planar.x, planar.y]);
        let (first, best) = candidates.next()?;
        let tied = candidates
            .take_while(|(_, distance)| *distance <= best)
            .map(|(node, _)| node.data);
        Some(tied.fold(first.data, usize::min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EdgeDefinition, NodeDefinition};
    use rstest::{fixture, rstest};

    fn node(id: u64, lon: f64, lat: f64) -> NodeDefinition {
        NodeDefinition { id, lon, lat }
    }

    fn edge(from: u64, to: u64, length_m: f64) -> EdgeDefinition {
        EdgeDefinition {
            from,
            to,
            length_m,
            bidirectional: true,
        }
    }

    #[fixture]
    fn square() -> NetworkDefinition {
        NetworkDefinition {
            nodes: vec![
                node(10, -73.990, 40.750),
                node(20, -73.980, 40.750),
                node(30, -73.980, 40.760),
                node(40, -73.990, 40.760),
            ],
            edges: vec![edge(10, 20, 840.0), edge(20, 30, 1_110.0), edge(30, 40, 840.0)],
        }
    }

    #[rstest]
    #[case(1_000.0, 60.0, 1.0)]
    #[case(4_800.0, 4.8, 60.0)]
    #[case(0.0, 15.0, 0.0)]
    fn minutes_follow_speed(#[case] length: f64, #[case] speed: f64, #[case] expected: f64) {
        assert!((travel_minutes(length, speed) - expected).abs() < 1e-12);
    }

    #[rstest]
    fn builds_bidirectional_arcs(square: NetworkDefinition) {
        let graph = TransportGraph::from_definition(&square, TravelMode::Walk, 4.8).expect("valid");
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.adjacency.iter().map(Vec::len).sum::<usize>(), 6);
        assert_eq!(graph.node_id(2), Some(30));
    }

    #[rstest]
    fn one_way_edges_only_go_forward(mut square: NetworkDefinition) {
        for edge in &mut square.edges {
            edge.bidirectional = false;
        }
        let graph = TransportGraph::from_definition(&square, TravelMode::Drive, 25.0).expect("valid");
        assert_eq!(graph.adjacency.iter().map(Vec::len).sum::<usize>(), 3);
        assert!(graph.adjacency.get(3).is_some_and(Vec::is_empty));
    }

    #[rstest]
    fn snaps_to_nearest_node(square: NetworkDefinition) {
        let graph = TransportGraph::from_definition(&square, TravelMode::Walk, 4.8).expect("valid");
        let near_third = Coord {
            x: -73.9801,
            y: 40.7599,
        };
        assert_eq!(graph.nearest_node(near_third), Some(2));
    }

    #[rstest]
    fn equidistant_nodes_snap_to_lowest_index() {
        let definition = NetworkDefinition {
            nodes: vec![node(7, 0.01, 0.0), node(3, -0.01, 0.0)],
            edges: Vec::new(),
        };
        let graph = TransportGraph::from_definition(&definition, TravelMode::Walk, 4.8).expect("valid");
        assert_eq!(graph.nearest_node(Coord { x: 0.0, y: 0.0 }), Some(0));
    }

    #[rstest]
    fn invalid_points_do_not_snap(square: NetworkDefinition) {
        let graph = TransportGraph::from_definition(&square, TravelMode::Walk, 4.8).expect("valid");
        assert_eq!(graph.nearest_node(Coord { x: f64::NAN, y: 0.0 }), None);
    }

    #[rstest]
    #[case::zero_speed(0.0)]
    #[case::negative_speed(-4.0)]
    #[case::nan_speed(f64::NAN)]
    fn rejects_bad_speed(square: NetworkDefinition, #[case] speed: f64) {
        assert!(matches!(
            TransportGraph::from_definition(&square, TravelMode::Bike, speed),
            Err(NetworkBuildError::Speed { .. })
        ));
    }

    #[rstest]
    fn rejects_unknown_node(mut square: NetworkDefinition) {
        square.edges.push(edge(40, 99, 10.0));
        assert_eq!(
            TransportGraph::from_definition(&square, TravelMode::Walk, 4.8).err(),
            Some(NetworkBuildError::UnknownNode { edge: 3, node: 99 })
        );
    }

    #[rstest]
    fn rejects_negative_length(mut square: NetworkDefinition) {
        square.edges.push(edge(10, 30, -1.0));
        assert!(matches!(
            TransportGraph::from_definition(&square, TravelMode::Walk, 4.8),
            Err(NetworkBuildError::EdgeLength { edge: 3, .. })
        ));
    }

    #[rstest]
    fn rejects_duplicate_ids(mut square: NetworkDefinition) {
        square.nodes.push(node(10, -73.0, 40.0));
        assert_eq!(
            TransportGraph::from_definition(&square, TravelMode::Walk, 4.8).err(),
            Some(NetworkBuildError::DuplicateNode { id: 10 })
        );
    }

    #[rstest]
    fn rejects_empty_network() {
        assert_eq!(
            TransportGraph::from_definition(&NetworkDefinition::default(), TravelMode::Walk, 4.8)
                .err(),
            Some(NetworkBuildError::Empty)
        );
    }
}
