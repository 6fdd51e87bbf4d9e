//! At most one graph per travel mode.

use std::collections::BTreeMap;

use hotspot_core::TravelMode;

use crate::graph::TransportGraph;

/// Graphs keyed by their travel mode.
#[derive(Debug, Clone, Default)]
pub struct NetworkSet {
    graphs: BTreeMap<TravelMode, TransportGraph>,
}

impl NetworkSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `graph`, returning the graph it replaces for the same mode.
    pub fn insert(&mut self, graph: TransportGraph) -> Option<TransportGraph> {
        self.graphs.insert(graph.mode(), graph)
    }

    /// Graph for `mode`, if loaded.
    #[must_use]
    pub fn get(&self, mode: TravelMode) -> Option<&TransportGraph> {
        self.graphs.get(&mode)
    }

    /// Loaded modes in declaration order.
    pub fn modes(&self) -> impl Iterator<Item = TravelMode> + '_ {
        self.graphs.keys().copied()
    }

    /// Every loaded graph.
    pub fn iter(&self) -> impl Iterator<Item = &TransportGraph> {
        self.graphs.values()
    }

    /// Whether no graph is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl<'a> IntoIterator for &'a NetworkSet {
    type Item = &'a TransportGraph;
    type IntoIter = std::collections::btree_map::Values<'a, TravelMode, TransportGraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.graphs.values()
    }
}

impl FromIterator<TransportGraph> for NetworkSet {
    fn from_iter<I: IntoIterator<Item = TransportGraph>>(iter: I) -> Self {
        let mut set = Self::new();
        for graph in iter {
            set.insert(graph);
        }
        set
    }
}
