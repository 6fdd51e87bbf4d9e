//! Blending popularity with accessibility into a ranked list.

use std::cmp::Ordering;

use geo::Coord;
use hotspot_core::{HotspotId, Recommendation};

use crate::config::weights_are_valid;
use crate::error::QueryError;

/// A reachable hotspot awaiting ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankCandidate {
    /// Hotspot identifier.
    pub hotspot_id: HotspotId,
    /// WGS84 centroid.
    pub centroid: Coord<f64>,
    /// Shortest network travel time in minutes.
    pub travel_time_minutes: f64,
    /// Popularity score, `0.0..=100.0`.
    pub popularity_score: f64,
    /// Accessibility score, `0.0..=100.0`.
    pub accessibility_score: f64,
}

/// Orders candidates by `alpha * popularity + beta * accessibility`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationRanker {
    alpha: f64,
    beta: f64,
}

impl RecommendationRanker {
    /// Build a ranker.
    ///
    /// # Errors
    /// Returns [`QueryError::Weights`] unless both weights lie in `0..=1` and
    /// sum to one.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, QueryError> {
        if weights_are_valid(alpha, beta) {
            Ok(Self { alpha, beta })
        } else {
            Err(QueryError::Weights { alpha, beta })
        }
    }

    /// Popularity weight.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Accessibility weight.
    #[must_use]
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Weighted score of one candidate.
    #[must_use]
    pub fn final_score(&self, candidate: &RankCandidate) -> f64 {
        self.alpha * candidate.popularity_score + self.beta * candidate.accessibility_score
    }

    /// Sort every candidate, then keep the best `limit`.
    ///
    /// Ties fall back to higher popularity, then shorter travel time, then
    /// lower hotspot id, so input order never affects the result.
    #[must_use]
    pub fn rank(&self, candidates: &[RankCandidate], limit: usize) -> Vec<Recommendation> {
        let mut scored: Vec<(f64, &RankCandidate)> = candidates
            .iter()
            .map(|candidate| (self.final_score(candidate), candidate))
            .collect();
        scored.sort_by(|(a_score, a), (b_score, b)| compare(*a_score, a, *b_score, b));
        scored.truncate(limit);
        scored
            .into_iter()
            .zip(1_u32..)
            .map(|((final_score, candidate), rank)| Recommendation {
                rank,
                hotspot_id: candidate.hotspot_id,
                centroid: candidate.centroid,
                travel_time_minutes: candidate.travel_time_minutes,
                popularity_score: candidate.popularity_score,
                accessibility_score: candidate.accessibility_score,
                final_score,
            })
            .collect()
    }
}

fn compare(a_score: f64, a: &RankCandidate, b_score: f64, b: &RankCandidate) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| b.popularity_score.total_cmp(&a.popularity_score))
        .then_with(|| a.travel_time_minutes.total_cmp(&b.travel_time_minutes))
        .then_with(|| a.hotspot_id.cmp(&b.hotspot_id))
}
