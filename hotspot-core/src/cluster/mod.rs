//! Density-based clustering of projected points.
//!
//! [`DensityClusterer`] wraps HDBSCAN with Euclidean distance. The same
//! routine serves restaurants and weighted drop-offs; each caller supplies its
//! own [`ClusteringParams`].

mod validation;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use geo::Coord;
use hdbscan::{Hdbscan, HdbscanHyperParams};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use validation::ClusterValidation;

/// Canonical cluster identifier, dense from zero within one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label assigned to a single input point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    /// Point lies in a low-density region.
    Noise,
    /// Point belongs to the given cluster.
    Cluster(ClusterId),
}

impl ClusterLabel {
    /// Cluster id, or `None` for noise.
    #[must_use]
    pub const fn cluster(self) -> Option<ClusterId> {
        match self {
            Self::Noise => None,
            Self::Cluster(id) => Some(id),
        }
    }
}

/// Tuning knobs for one clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringParams {
    /// Smallest group reported as a cluster.
    pub min_cluster_size: usize,
    /// Neighbourhood size used to estimate core distances.
    pub min_samples: usize,
    /// Clusters closer than this many metres are merged.
    pub selection_epsilon: f64,
}

/// Errors raised when validating [`ClusteringParams`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ClusteringParamsError {
    /// `min_cluster_size` was below two.
    #[error("min_cluster_size must be at least 2, got {0}")]
    MinClusterSize(usize),
    /// `min_samples` was zero.
    #[error("min_samples must be at least 1")]
    MinSamples,
    /// `selection_epsilon` was negative or not finite.
    #[error("selection_epsilon must be finite and non-negative, got {0}")]
    SelectionEpsilon(f64),
}

impl ClusteringParams {
    /// Defaults for restaurant locations: dense, small footprint.
    #[must_use]
    pub const fn restaurants() -> Self {
        Self {
            min_cluster_size: 30,
            min_samples: 10,
            selection_epsilon: 200.0,
        }
    }

    /// Defaults for weighted drop-offs: sparser, wider footprint.
    #[must_use]
    pub const fn mobility() -> Self {
        Self {
            min_cluster_size: 50,
            min_samples: 15,
            selection_epsilon: 200.0,
        }
    }

    /// Check the parameters are usable.
    ///
    /// # Errors
    /// Returns [`ClusteringParamsError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ClusteringParamsError> {
        if self.min_cluster_size < 2 {
            return Err(ClusteringParamsError::MinClusterSize(self.min_cluster_size));
        }
        if self.min_samples == 0 {
            return Err(ClusteringParamsError::MinSamples);
        }
        if !self.selection_epsilon.is_finite() || self.selection_epsilon < 0.0 {
            return Err(ClusteringParamsError::SelectionEpsilon(
                self.selection_epsilon,
            ));
        }
        Ok(())
    }
}

/// Point counts describing an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusteringSummary {
    /// Points clustered.
    pub points: usize,
    /// Distinct clusters found.
    pub clusters: usize,
    /// Points labelled noise.
    pub noise: usize,
    /// `noise / points`, or zero for empty input.
    pub noise_ratio: f64,
}

/// One label per input point, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterAssignment {
    labels: Vec<ClusterLabel>,
}

impl ClusterAssignment {
    /// Every point labelled noise.
    #[must_use]
    pub fn all_noise(len: usize) -> Self {
        Self {
            labels: vec![ClusterLabel::Noise; len],
        }
    }

    /// Canonicalise raw backend labels: negatives become noise and the rest
    /// are renumbered `0..k` in order of first appearance.
    #[must_use]
    pub fn from_raw(raw: &[i32]) -> Self {
        let mut mapping: HashMap<i32, ClusterId> = HashMap::new();
        let labels = raw
            .iter()
            .map(|&label| {
                if label < 0 {
                    return ClusterLabel::Noise;
                }
                let next = ClusterId(u32::try_from(mapping.len()).unwrap_or(u32::MAX));
                ClusterLabel::Cluster(*mapping.entry(label).or_insert(next))
            })
            .collect();
        Self { labels }
    }

    /// Labels in input order.
    #[must_use]
    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    /// Label of the point at `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<ClusterLabel> {
        self.labels.get(index).copied()
    }

    /// Number of labelled points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no points were labelled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Member indices per cluster, ordered by cluster id.
    #[must_use]
    pub fn groups(&self) -> BTreeMap<ClusterId, Vec<usize>> {
        let mut groups: BTreeMap<ClusterId, Vec<usize>> = BTreeMap::new();
        for (index, label) in self.labels.iter().enumerate() {
            if let ClusterLabel::Cluster(id) = label {
                groups.entry(*id).or_default().push(index);
            }
        }
        groups
    }

    /// Count points, clusters and noise.
    #[must_use]
    pub fn summary(&self) -> ClusteringSummary {
        let noise = self
            .labels
            .iter()
            .filter(|label| matches!(label, ClusterLabel::Noise))
            .count();
        let clusters = self
            .labels
            .iter()
            .filter_map(|label| label.cluster())
            .collect::<BTreeSet<_>>()
            .len();
        let points = self.labels.len();
        ClusteringSummary {
            points,
            clusters,
            noise,
            noise_ratio: if points == 0 {
                0.0
            } else {
                noise as f64 / points as f64
            },
        }
    }

    /// Select the label of the first replica of each original point.
    ///
    /// `first_replica[i]` is the position of point `i`'s first copy in the
    /// clustered sequence. Positions outside the assignment map to noise.
    #[must_use]
    pub fn select(&self, first_replica: &[usize]) -> Self {
        let raw: Vec<ClusterLabel> = first_replica
            .iter()
            .map(|&index| self.label(index).unwrap_or(ClusterLabel::Noise))
            .collect();
        // Re-canonicalise so ids stay dense after dropping replicas.
        let mut mapping: HashMap<ClusterId, ClusterId> = HashMap::new();
        let labels = raw
            .into_iter()
            .map(|label| match label {
                ClusterLabel::Noise => ClusterLabel::Noise,
                ClusterLabel::Cluster(id) => {
                    let next = ClusterId(u32::try_from(mapping.len()).unwrap_or(u32::MAX));
                    ClusterLabel::Cluster(*mapping.entry(id).or_insert(next))
                }
            })
            .collect();
        Self { labels }
    }
}

/// Groups projected points into density-connected clusters.
///
/// Identical points and parameters always produce identical labels: the
/// backend is deterministic for a fixed input order, and ids are renumbered by
/// first appearance rather than by backend tree order.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use hotspot_core::{ClusterLabel, ClusteringParams, DensityClusterer};
///
/// let clusterer = DensityClusterer::new(ClusteringParams {
///     min_cluster_size: 5,
///     min_samples: 3,
///     selection_epsilon: 0.0,
/// })?;
/// let few = [Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }];
/// let assignment = clusterer.cluster(&few);
/// assert!(assignment.labels().iter().all(|l| *l == ClusterLabel::Noise));
/// # Ok::<(), hotspot_core::ClusteringParamsError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityClusterer {
    params: ClusteringParams,
}

impl DensityClusterer {
    /// Build a clusterer from validated parameters.
    ///
    /// # Errors
    /// Returns [`ClusteringParamsError`] when the parameters are invalid.
    pub fn new(params: ClusteringParams) -> Result<Self, ClusteringParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &ClusteringParams {
        &self.params
    }

    /// Label every point. Degenerate input yields all noise.
    #[must_use]
    pub fn cluster(&self, points: &[Coord<f64>]) -> ClusterAssignment {
        let floor = self.params.min_cluster_size.max(self.params.min_samples);
        if points.len() < floor {
            debug!(
                "{} points is below the clustering floor of {floor}; all noise",
                points.len()
            );
            return ClusterAssignment::all_noise(points.len());
        }

        let data: Vec<Vec<f64>> = points.iter().map(|c| vec![c.x, c.y]).collect();
        let hyper_params = HdbscanHyperParams::builder()
            .min_cluster_size(self.params.min_cluster_size)
            .min_samples(self.params.min_samples)
            .epsilon(self.params.selection_epsilon)
            .build();
        match Hdbscan::new(&data, hyper_params).cluster() {
            Ok(raw) if raw.len() == points.len() => ClusterAssignment::from_raw(&raw),
            Ok(raw) => {
                warn!(
                    "clustering backend returned {} labels for {} points; treating all as noise",
                    raw.len(),
                    points.len()
                );
                ClusterAssignment::all_noise(points.len())
            }
            Err(err) => {
                warn!("clustering backend failed: {err:?}; treating all points as noise");
                ClusterAssignment::all_noise(points.len())
            }
        }
    }
}
