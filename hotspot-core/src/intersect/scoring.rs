//! Relative popularity scoring of accepted intersections.

use crate::model::{FinalHotspot, HotspotId};

use super::Candidate;

/// `100 * (λ·restaurant + (1 − λ)·mobility)`, clamped to `0.0..=100.0`.
#[must_use]
pub fn popularity_score(restaurant_score: f64, mobility_score: f64, restaurant_weight: f64) -> f64 {
    let blended =
        restaurant_weight * restaurant_score + (1.0 - restaurant_weight) * mobility_score;
    (100.0 * blended).clamp(0.0, 100.0)
}

fn normalise(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(super) fn score(candidates: Vec<Candidate>, restaurant_weight: f64) -> Vec<FinalHotspot> {
    let max_restaurants = candidates
        .iter()
        .map(|c| c.restaurant_count)
        .max()
        .unwrap_or(0);
    let max_weight = candidates
        .iter()
        .map(|c| c.mobility_weight)
        .fold(0.0, f64::max);

    candidates
        .into_iter()
        .enumerate()
        .map(|(position, candidate)| {
            let restaurant_score = normalise(
                f64::from(candidate.restaurant_count),
                f64::from(max_restaurants),
            );
            let mobility_score = normalise(candidate.mobility_weight, max_weight);
            FinalHotspot {
                id: HotspotId(u32::try_from(position).unwrap_or(u32::MAX)),
                dining_cluster_id: candidate.dining_cluster_id,
                hotspot_cluster_id: candidate.hotspot_cluster_id,
                geometry: candidate.geometry,
                intersection_area: candidate.area,
                overlap_ratio: candidate.overlap_ratio,
                restaurant_count: candidate.restaurant_count,
                mobility_weight: candidate.mobility_weight,
                restaurant_score,
                mobility_score,
                popularity_score: popularity_score(
                    restaurant_score,
                    mobility_score,
                    restaurant_weight,
                ),
                avg_rating: candidate.avg_rating,
            }
        })
        .collect()
}
