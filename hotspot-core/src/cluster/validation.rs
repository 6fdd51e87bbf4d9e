//! Cohesion and separation metrics over non-noise points.
//!
//! Diagnostic only: the pipeline logs these but never gates on them.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

use super::{ClusterAssignment, ClusterId};

/// Cap on points used for the quadratic silhouette computation.
const SILHOUETTE_SAMPLE_CAP: usize = 2_000;

/// Internal validation indices for a clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterValidation {
    /// Mean silhouette coefficient in `-1.0..=1.0`; higher is better.
    pub silhouette: f64,
    /// Davies-Bouldin index; lower is better.
    pub davies_bouldin: f64,
}

impl ClusterValidation {
    /// Compute both indices. Returns `None` with fewer than two clusters.
    ///
    /// The silhouette is estimated on an evenly strided sample when more than
    /// 2000 points are clustered.
    #[must_use]
    pub fn compute(points: &[Coord<f64>], assignment: &ClusterAssignment) -> Option<Self> {
        let members: Vec<(Coord<f64>, ClusterId)> = points
            .iter()
            .zip(assignment.labels())
            .filter_map(|(point, label)| label.cluster().map(|id| (*point, id)))
            .collect();
        let groups = group(&members);
        if groups.len() < 2 {
            return None;
        }
        let stride = members.len().div_ceil(SILHOUETTE_SAMPLE_CAP).max(1);
        let sample: Vec<(Coord<f64>, ClusterId)> =
            members.iter().copied().step_by(stride).collect();
        Some(Self {
            silhouette: silhouette(&sample),
            davies_bouldin: davies_bouldin(&groups),
        })
    }
}

fn group(members: &[(Coord<f64>, ClusterId)]) -> BTreeMap<ClusterId, Vec<Coord<f64>>> {
    let mut groups: BTreeMap<ClusterId, Vec<Coord<f64>>> = BTreeMap::new();
    for (point, id) in members {
        groups.entry(*id).or_default().push(*point);
    }
    groups
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn silhouette(sample: &[(Coord<f64>, ClusterId)]) -> f64 {
    let groups = group(sample);
    let scores: Vec<f64> = sample
        .iter()
        .map(|(point, own)| {
            let own_size = groups.get(own).map_or(0, Vec::len);
            if own_size < 2 {
                return 0.0;
            }
            let mut intra = 0.0;
            let mut nearest_other = f64::INFINITY;
            for (id, others) in &groups {
                let total: f64 = others.iter().map(|other| distance(*point, *other)).sum();
                if id == own {
                    intra = total / (own_size - 1) as f64;
                } else if !others.is_empty() {
                    nearest_other = nearest_other.min(total / others.len() as f64);
                }
            }
            let spread = intra.max(nearest_other);
            if spread > 0.0 {
                (nearest_other - intra) / spread
            } else {
                0.0
            }
        })
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

fn centroid(points: &[Coord<f64>]) -> Coord<f64> {
    let n = points.len().max(1) as f64;
    let sum = points
        .iter()
        .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| acc + *c);
    Coord {
        x: sum.x / n,
        y: sum.y / n,
    }
}

fn davies_bouldin(groups: &BTreeMap<ClusterId, Vec<Coord<f64>>>) -> f64 {
    let stats: Vec<(Coord<f64>, f64)> = groups
        .values()
        .map(|points| {
            let c = centroid(points);
            let scatter = points.iter().map(|p| distance(*p, c)).sum::<f64>()
                / points.len().max(1) as f64;
            (c, scatter)
        })
        .collect();
    let worst: Vec<f64> = stats
        .iter()
        .enumerate()
        .map(|(i, (ci, si))| {
            stats
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (cj, sj))| {
                    let separation = distance(*ci, *cj);
                    if separation > 0.0 {
                        (si + sj) / separation
                    } else {
                        f64::INFINITY
                    }
                })
                .fold(0.0, f64::max)
        })
        .collect();
    worst.iter().sum::<f64>() / worst.len().max(1) as f64
}
