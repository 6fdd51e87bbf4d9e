//! Street networks and accessibility scoring for hotspot recommendations.
//!
//! A [`NetworkDefinition`] is loaded once and turned into one
//! [`TransportGraph`] per [`TravelMode`](hotspot_core::TravelMode), with edge
//! weights in minutes. [`AccessibilityScorer`] snaps a query origin to the
//! nearest node, runs a single cutoff-bounded shortest-path search and scores
//! every hotspot reached inside the budget. Graphs are immutable once built,
//! so any number of queries may share them.

#![forbid(unsafe_code)]

mod accessibility;
mod definition;
mod graph;
mod search;
mod set;

pub use accessibility::{
    Accessibility, AccessibilityError, AccessibilityScorer, SnappedTarget, accessibility_score,
};
pub use definition::{EdgeDefinition, NetworkDefinition, NodeDefinition};
pub use graph::{NetworkBuildError, TransportGraph, travel_minutes};
pub use search::ReachableSet;
pub use set::NetworkSet;
