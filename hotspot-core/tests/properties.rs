//! Property-based checks for the batch stages.
//!
//! Invariants:
//! - every hour and weekday maps to a positive, finite weight bounded by the
//!   off-peak floor and the weekend-dinner ceiling;
//! - clustering the same points twice yields the same labels;
//! - every accepted hotspot clears both area and overlap thresholds;
//! - popularity scores stay inside `0..=100`.

use chrono::Weekday;
use geo::{Coord, Polygon, Rect};
use hotspot_core::{
    ClusterId, ClusteringParams, DensityClusterer, DiningZone, HotspotArea, HotspotIntersector,
    HourOfDay, IntersectionParams, TemporalWeighter, TemporalWeights, Zone,
};
use proptest::prelude::*;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday() -> impl Strategy<Value = Weekday> {
    proptest::sample::select(WEEK.to_vec())
}

fn rect(min_x: f64, min_y: f64, width: f64, height: f64) -> Polygon<f64> {
    Rect::new(
        Coord { x: min_x, y: min_y },
        Coord {
            x: min_x + width,
            y: min_y + height,
        },
    )
    .to_polygon()
}

fn zone(cluster: u32, polygon: Polygon<f64>) -> Zone {
    use geo::Area;
    let area = polygon.unsigned_area();
    Zone {
        cluster_id: ClusterId(cluster),
        polygon,
        area,
    }
}

/// Rectangles on a 2 km square with sides between 50 m and 600 m.
fn rectangles(max: usize) -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (0.0..2_000.0_f64, 0.0..2_000.0_f64, 50.0..600.0_f64, 50.0..600.0_f64),
        1..max,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Default weights are positive, finite and sit between floor and ceiling.
    #[test]
    fn weights_are_bounded(hour in 0_u8..24, day in weekday()) {
        let weights = TemporalWeights::default();
        let weighter = TemporalWeighter::new(weights).expect("defaults are valid");
        let hour = HourOfDay::try_from(hour).expect("hour in range");
        let weight = weighter.weight(hour, day);
        prop_assert!(weight.is_finite());
        prop_assert!(weight > 0.0);
        prop_assert!(weight >= weights.off_peak);
        prop_assert!(weight <= weights.weekend_dinner);
    }

    /// Clustering is a pure function of its input.
    #[test]
    fn clustering_is_deterministic(
        raw in prop::collection::vec((0.0..1_000.0_f64, 0.0..1_000.0_f64), 0..80)
    ) {
        let points: Vec<Coord<f64>> = raw.into_iter().map(|(x, y)| Coord { x, y }).collect();
        let params = ClusteringParams {
            min_cluster_size: 5,
            min_samples: 3,
            selection_epsilon: 50.0,
        };
        let clusterer = DensityClusterer::new(params).expect("valid params");
        let first = clusterer.cluster(&points);
        let second = clusterer.cluster(&points);
        prop_assert_eq!(first.len(), points.len());
        prop_assert_eq!(first, second);
    }

    /// Accepted hotspots satisfy both thresholds and carry bounded scores.
    #[test]
    fn accepted_hotspots_respect_thresholds(
        dining in rectangles(6),
        areas in rectangles(6),
        restaurants in prop::collection::vec(1_u32..200, 6),
        weights in prop::collection::vec(0.5..5_000.0_f64, 6),
    ) {
        let dining: Vec<DiningZone> = dining
            .into_iter()
            .zip(&restaurants)
            .zip(0_u32..)
            .map(|(((x, y, w, h), count), id)| DiningZone {
                zone: zone(id, rect(x, y, w, h)),
                restaurant_count: *count,
                avg_rating: None,
            })
            .collect();
        let areas: Vec<HotspotArea> = areas
            .into_iter()
            .zip(&weights)
            .zip(0_u32..)
            .map(|(((x, y, w, h), weight), id)| HotspotArea {
                zone: zone(id, rect(x, y, w, h)),
                mobility_weight: *weight,
                event_count: 1,
            })
            .collect();
        let params = IntersectionParams::default();
        let intersector = HotspotIntersector::new(params).expect("defaults are valid");
        let outcome = intersector.intersect(&dining, &areas);

        prop_assert_eq!(outcome.hotspots.len(), outcome.diagnostics.accepted);
        for (position, hotspot) in outcome.hotspots.iter().enumerate() {
            prop_assert_eq!(usize::try_from(hotspot.id.0).ok(), Some(position));
            prop_assert!(hotspot.intersection_area >= params.min_area);
            prop_assert!(hotspot.overlap_ratio >= params.min_overlap);
            prop_assert!(hotspot.overlap_ratio <= 1.0);
            prop_assert!((0.0..=100.0).contains(&hotspot.popularity_score));
            prop_assert!((0.0..=1.0).contains(&hotspot.restaurant_score));
            prop_assert!((0.0..=1.0).contains(&hotspot.mobility_score));
        }
    }

    /// The blend never leaves the percentage range, even for wild inputs.
    #[test]
    fn popularity_is_clamped(
        restaurant in -2.0..3.0_f64,
        mobility in -2.0..3.0_f64,
        lambda in 0.0..=1.0_f64,
    ) {
        let score = hotspot_core::intersect::popularity_score(restaurant, mobility, lambda);
        prop_assert!((0.0..=100.0).contains(&score));
    }
}
