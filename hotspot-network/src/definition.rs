//! Serialisable description of a street network.

use serde::{Deserialize, Serialize};

/// A graph vertex in WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Caller-assigned identifier, unique within the network.
    pub id: u64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

/// A street segment between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    /// Identifier of the start node.
    pub from: u64,
    /// Identifier of the end node.
    pub to: u64,
    /// Segment length in metres.
    pub length_m: f64,
    /// Whether the segment can be travelled in both directions.
    #[serde(default = "bidirectional_default")]
    pub bidirectional: bool,
}

const fn bidirectional_default() -> bool {
    true
}

/// Nodes and edges of one street network, as stored on disk.
///
/// # Examples
/// ```
/// use hotspot_network::NetworkDefinition;
///
/// let text = r#"{
///     "nodes": [{"id": 1, "lon": -73.98, "lat": 40.75}, {"id": 2, "lon": -73.97, "lat": 40.75}],
///     "edges": [{"from": 1, "to": 2, "length_m": 840.0}]
/// }"#;
/// let network = NetworkDefinition::from_json_str(text)?;
/// assert!(network.edges.iter().all(|edge| edge.bidirectional));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkDefinition {
    /// Graph vertices.
    pub nodes: Vec<NodeDefinition>,
    /// Graph edges.
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

impl NetworkDefinition {
    /// Parse a JSON network definition.
    ///
    /// # Errors
    /// Returns the `serde_json` error when the text is not a valid definition.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
