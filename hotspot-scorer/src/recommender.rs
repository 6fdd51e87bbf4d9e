//! Read-only query service over a completed hotspot collection.

use std::collections::BTreeMap;

use geo::Coord;
use hotspot_core::{
    FinalHotspot, HotspotCollection, HotspotId, HotspotStats, Recommendation, TravelMode, UserQuery,
};
use hotspot_network::{AccessibilityError, AccessibilityScorer, NetworkSet, SnappedTarget};
use log::{info, warn};

use crate::config::RecommendationConfig;
use crate::error::{QueryError, RecommendationConfigError};
use crate::ranker::{RankCandidate, RecommendationRanker};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HotspotEntry {
    centroid: Coord<f64>,
    popularity_score: f64,
}

/// Answers recommendation and statistics queries.
///
/// Everything is computed up front and never mutated, so one instance can
/// serve concurrent queries through a shared reference.
#[derive(Debug, Clone)]
pub struct Recommender {
    hotspots: Vec<FinalHotspot>,
    entries: BTreeMap<HotspotId, HotspotEntry>,
    networks: NetworkSet,
    targets: BTreeMap<TravelMode, Vec<SnappedTarget>>,
    config: RecommendationConfig,
}

impl Recommender {
    /// Index `collection` against every graph in `networks`.
    ///
    /// Hotspot centroids are converted to WGS84 and snapped to their nearest
    /// node once per graph.
    ///
    /// # Errors
    /// Returns [`RecommendationConfigError`] when `config` is invalid.
    pub fn new(
        collection: HotspotCollection,
        networks: NetworkSet,
        config: RecommendationConfig,
    ) -> Result<Self, RecommendationConfigError> {
        config.validate()?;
        let HotspotCollection {
            projection,
            hotspots,
        } = collection;

        let entries: BTreeMap<HotspotId, HotspotEntry> = hotspots
            .iter()
            .filter_map(|hotspot| {
                let Some(centroid) = hotspot.centroid() else {
                    warn!("hotspot {} has no centroid and cannot be recommended", hotspot.id);
                    return None;
                };
                Some((
                    hotspot.id,
                    HotspotEntry {
                        centroid: projection.unproject(centroid),
                        popularity_score: hotspot.popularity_score,
                    },
                ))
            })
            .collect();

        let targets = networks
            .iter()
            .map(|graph| {
                let snapped = AccessibilityScorer::new(graph)
                    .snap(entries.iter().map(|(id, entry)| (*id, entry.centroid)));
                info!(
                    "{}: snapped {} of {} hotspots",
                    graph.mode(),
                    snapped.len(),
                    entries.len()
                );
                (graph.mode(), snapped)
            })
            .collect();

        Ok(Self {
            hotspots,
            entries,
            networks,
            targets,
            config,
        })
    }

    /// Defaults in use.
    #[must_use]
    pub const fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Hotspots served, ordered by id.
    #[must_use]
    pub fn hotspots(&self) -> &[FinalHotspot] {
        &self.hotspots
    }

    /// A query for `mode` using that mode's default budget.
    #[must_use]
    pub const fn default_query(&self, origin: Coord<f64>, mode: TravelMode) -> UserQuery {
        UserQuery::new(
            origin,
            mode,
            self.config.profile(mode).default_budget_minutes,
        )
    }

    /// Rank hotspots reachable from the query origin.
    ///
    /// An empty list is a valid answer when nothing is reachable within the
    /// budget.
    ///
    /// # Errors
    /// Returns [`QueryError`] for an invalid budget, invalid weights or limit,
    /// a mode with no loaded network, or an origin that cannot be snapped.
    /// Validation happens before any search.
    pub fn recommend(&self, query: &UserQuery) -> Result<Vec<Recommendation>, QueryError> {
        let budget = query.time_budget_minutes;
        if !(budget.is_finite() && budget > 0.0) {
            return Err(QueryError::Budget(budget));
        }
        let (alpha, beta) = self.resolve_weights(query);
        let ranker = RecommendationRanker::new(alpha, beta)?;
        let limit = query.limit.unwrap_or(self.config.limit);
        if limit == 0 {
            return Err(QueryError::Limit);
        }
        let graph = self
            .networks
            .get(query.mode)
            .ok_or(QueryError::NoNetwork(query.mode))?;
        let targets = self.targets.get(&query.mode).map_or(&[][..], Vec::as_slice);

        let reached = AccessibilityScorer::new(graph)
            .score(query.origin, budget, targets)
            .map_err(|err| match err {
                AccessibilityError::Budget(minutes) => QueryError::Budget(minutes),
                AccessibilityError::Origin { lon, lat } => QueryError::Origin {
                    mode: query.mode,
                    lon,
                    lat,
                },
            })?;
        let candidates: Vec<RankCandidate> = reached
            .iter()
            .filter_map(|access| {
                let entry = self.entries.get(&access.hotspot_id)?;
                Some(RankCandidate {
                    hotspot_id: access.hotspot_id,
                    centroid: entry.centroid,
                    travel_time_minutes: access.travel_time_minutes,
                    popularity_score: entry.popularity_score,
                    accessibility_score: access.score,
                })
            })
            .collect();
        let ranked = ranker.rank(&candidates, limit);
        info!(
            "{} query within {budget} min: {} reachable, {} returned",
            query.mode,
            candidates.len(),
            ranked.len()
        );
        Ok(ranked)
    }

    /// Totals and popularity extrema over every hotspot.
    #[must_use]
    pub fn stats(&self) -> HotspotStats {
        HotspotStats::from_hotspots(&self.hotspots)
    }

    /// Query weights, completing a lone override with its complement.
    fn resolve_weights(&self, query: &UserQuery) -> (f64, f64) {
        match (query.alpha, query.beta) {
            (Some(alpha), Some(beta)) => (alpha, beta),
            (Some(alpha), None) => (alpha, 1.0 - alpha),
            (None, Some(beta)) => (1.0 - beta, beta),
            (None, None) => (self.config.alpha, self.config.beta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn recommender_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Recommender>();
    }
}
