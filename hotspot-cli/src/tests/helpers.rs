//! Temporary workspaces and small datasets shared by the CLI unit tests.

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use hotspot_core::HotspotCollection;
use hotspot_core::test_support::{manhattan_projection, square_hotspot};
use hotspot_network::{EdgeDefinition, NetworkDefinition, NodeDefinition};
use serde::Serialize;
use tempfile::TempDir;

/// Spacing of corridor nodes in metres: five minutes at walking speed.
pub(super) const BLOCK_M: f64 = 400.0;

pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture");
}

pub(super) fn write_json_file<T: Serialize>(path: &Utf8Path, value: &T) {
    let payload = serde_json::to_string_pretty(value).expect("serialise fixture");
    write_utf8(path, payload.as_bytes());
}

fn corridor_point(k: u32) -> Coord<f64> {
    manhattan_projection().unproject(Coord {
        x: f64::from(k) * BLOCK_M,
        y: 0.0,
    })
}

/// A straight, two-way corridor of `nodes` nodes along the projected x axis.
pub(super) fn corridor_network(nodes: u32) -> NetworkDefinition {
    let nodes: Vec<NodeDefinition> = (0..nodes)
        .map(|k| {
            let position = corridor_point(k);
            NodeDefinition {
                id: u64::from(k) + 100,
                lon: position.x,
                lat: position.y,
            }
        })
        .collect();
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
    NetworkDefinition { nodes, edges }
}

/// Hotspot `k` sits on corridor node `k` with the given popularity.
pub(super) fn corridor_collection(popularity: &[f64]) -> HotspotCollection {
    let hotspots = popularity
        .iter()
        .zip(0_u32..)
        .map(|(score, k)| {
            square_hotspot(
                k,
                Coord {
                    x: f64::from(k) * BLOCK_M,
                    y: 0.0,
                },
                60.0,
                *score,
            )
        })
        .collect();
    HotspotCollection::new(manhattan_projection(), hotspots)
}

/// WGS84 origin at corridor node `k` as `(lat, lon)`.
pub(super) fn corridor_lat_lon(k: u32) -> (f64, f64) {
    let position = corridor_point(k);
    (position.y, position.x)
}

pub(super) fn write_collection(path: &Utf8Path, collection: &HotspotCollection) {
    let text = collection.to_geojson_string().expect("encode hotspots");
    write_utf8(path, text.as_bytes());
}
