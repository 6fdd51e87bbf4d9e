//! Shared corridor fixture for the recommendation suites.

use geo::Coord;
use hotspot_core::test_support::{manhattan_projection, square_hotspot};
use hotspot_core::{HotspotCollection, TravelMode};
use hotspot_network::{EdgeDefinition, NetworkDefinition, NodeDefinition, TransportGraph};
use hotspot_scorer::{RecommendationConfig, Recommender};

/// Spacing between corridor nodes in metres; five minutes on foot.
pub const BLOCK_M: f64 = 400.0;

/// Build a straight walking corridor with one node per hotspot, spaced
/// [`BLOCK_M`] apart, and place hotspot `k` on node `k` with the given
/// popularity.
#[must_use]
pub fn corridor(popularity: &[f64]) -> Recommender {
    let projection = manhattan_projection();
    let offsets: Vec<f64> = (0_u32..)
        .take(popularity.len().max(1))
        .map(|k| f64::from(k) * BLOCK_M)
        .collect();
    let nodes = offsets
        .iter()
        .zip(1_u64..)
        .map(|(offset, id)| {
            let wgs = projection.unproject(Coord { x: *offset, y: 0.0 });
            NodeDefinition {
                id,
                lon: wgs.x,
                lat: wgs.y,
            }
        })
        .collect::<Vec<_>>();
    let edges = nodes
        .windows(2)
        .filter_map(|pair| match pair {
            [a, b] => Some(EdgeDefinition {
                from: a.id,
                to: b.id,
                length_m: BLOCK_M,
                bidirectional: true,
            }),
            _ => None,
        })
        .collect();
    let graph = TransportGraph::from_definition(
        &NetworkDefinition { nodes, edges },
        TravelMode::Walk,
        4.8,
    )
    .expect("corridor network is valid");
    let hotspots = popularity
        .iter()
        .zip(&offsets)
        .zip(0_u32..)
        .map(|((score, offset), id)| square_hotspot(id, Coord { x: *offset, y: 0.0 }, 60.0, *score))
        .collect();
    Recommender::new(
        HotspotCollection::new(projection, hotspots),
        [graph].into_iter().collect(),
        RecommendationConfig::default(),
    )
    .expect("default config is valid")
}

/// WGS84 position of corridor node `k`.
#[must_use]
pub fn corridor_point(k: u32) -> Coord<f64> {
    manhattan_projection().unproject(Coord {
        x: f64::from(k) * BLOCK_M,
        y: 0.0,
    })
}
