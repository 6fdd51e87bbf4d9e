//! Deterministic fixtures shared by unit and behaviour tests.
//!
//! Nothing here is random: point sets are laid out on a golden-angle spiral so
//! every run sees the same coordinates.

use chrono::{NaiveDate, NaiveDateTime};
use geo::{Coord, Polygon, Rect};

use crate::cluster::ClusterId;
use crate::model::{FinalHotspot, HotspotId, MobilityEvent, PlaceRecord, RawMobilityEvent};
use crate::projection::{LocalProjection, ProjectionOrigin};
use crate::temporal::TemporalBand;
use crate::zone::{DiningZone, HotspotArea, Zone};

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Times Square, used as the origin of [`manhattan_projection`].
pub const TIMES_SQUARE: Coord<f64> = Coord {
    x: -73.9855,
    y: 40.7580,
};

/// Union Square, roughly 3 km south of [`TIMES_SQUARE`].
pub const UNION_SQUARE: Coord<f64> = Coord {
    x: -73.9903,
    y: 40.7359,
};

/// `n` distinct points evenly filling a disc of `radius` around `centre`.
#[must_use]
pub fn blob(centre: Coord<f64>, n: usize, radius: f64) -> Vec<Coord<f64>> {
    let count = n.max(1) as f64;
    (0..n)
        .map(|k| {
            let step = k as f64;
            let r = radius * ((step + 0.5) / count).sqrt();
            let theta = step * GOLDEN_ANGLE;
            Coord {
                x: centre.x + r * theta.cos(),
                y: centre.y + r * theta.sin(),
            }
        })
        .collect()
}

/// Projection centred on Times Square.
#[must_use]
#[expect(clippy::expect_used, reason = "the fixture origin is a valid WGS84 point")]
pub fn manhattan_projection() -> LocalProjection {
    LocalProjection::new(ProjectionOrigin {
        lon: TIMES_SQUARE.x,
        lat: TIMES_SQUARE.y,
    })
    .expect("fixture origin is valid")
}

/// 19:30 on Saturday 16 March 2024.
#[must_use]
pub fn saturday_evening() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 16)
        .and_then(|date| date.and_hms_opt(19, 30, 0))
        .unwrap_or_default()
}

/// `n` weekend-dinner events within `spread_deg` degrees of `centre`.
#[must_use]
pub fn saturday_dinner_events(
    centre: Coord<f64>,
    n: usize,
    spread_deg: f64,
) -> Vec<MobilityEvent> {
    blob(centre, n, spread_deg)
        .into_iter()
        .map(|location| {
            MobilityEvent::new(location, saturday_evening(), TemporalBand::WeekendDinner, 1.5)
        })
        .collect()
}

/// WGS84 points spread over a disc of `radius_m` metres around `centre`.
#[must_use]
pub fn district(centre: Coord<f64>, n: usize, radius_m: f64) -> Vec<Coord<f64>> {
    let projection = manhattan_projection();
    let Ok(origin) = projection.project(centre) else {
        return Vec::new();
    };
    blob(origin, n, radius_m)
        .into_iter()
        .map(|point| projection.unproject(point))
        .collect()
}

/// Two dining districts with Saturday-evening drop-offs around each, plus a
/// handful of isolated restaurants and rides.
#[must_use]
pub fn synthetic_city() -> (Vec<PlaceRecord>, Vec<RawMobilityEvent>) {
    let mut places = Vec::new();
    let mut events = Vec::new();
    let mut ratings = [3.0, 3.5, 4.0, 4.5, 5.0].into_iter().cycle();
    for (centre, restaurants) in [(TIMES_SQUARE, 60), (UNION_SQUARE, 40)] {
        for (location, rating) in district(centre, restaurants, 150.0)
            .into_iter()
            .zip(&mut ratings)
        {
            let id = places.len() as u64;
            places.push(PlaceRecord::new(id, format!("place-{id}"), location).with_rating(rating));
        }
        for location in district(centre, 120, 250.0) {
            events.push(RawMobilityEvent::new(location, saturday_evening()));
        }
    }
    let outskirts = Coord {
        x: -73.9442,
        y: 40.6782,
    };
    for location in district(outskirts, 3, 2_000.0) {
        let id = places.len() as u64;
        places.push(PlaceRecord::new(id, format!("place-{id}"), location));
        events.push(RawMobilityEvent::new(location, saturday_evening()));
    }
    (places, events)
}

/// Axis-aligned rectangle as a polygon.
#[must_use]
pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }).to_polygon()
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

/// Dining zone over `polygon` with `restaurants` members and no ratings.
#[must_use]
pub fn dining_zone(cluster: u32, polygon: Polygon<f64>, restaurants: u32) -> DiningZone {
    DiningZone {
        zone: zone(cluster, polygon),
        restaurant_count: restaurants,
        avg_rating: None,
    }
}

/// Hotspot area over `polygon` carrying `weight`.
#[must_use]
pub fn hotspot_area(cluster: u32, polygon: Polygon<f64>, weight: f64) -> HotspotArea {
    HotspotArea {
        zone: zone(cluster, polygon),
        mobility_weight: weight,
        event_count: 0,
    }
}

/// A square hotspot of side `side` metres centred on `centre` in the
/// projected plane, with the given popularity.
#[must_use]
pub fn square_hotspot(id: u32, centre: Coord<f64>, side: f64, popularity: f64) -> FinalHotspot {
    let half = side / 2.0;
    let geometry = rect(centre.x - half, centre.y - half, centre.x + half, centre.y + half);
    FinalHotspot {
        id: HotspotId(id),
        dining_cluster_id: ClusterId(id),
        hotspot_cluster_id: ClusterId(id),
        geometry,
        intersection_area: side * side,
        overlap_ratio: 0.5,
        restaurant_count: 10,
        mobility_weight: 100.0,
        restaurant_score: popularity / 100.0,
        mobility_score: popularity / 100.0,
        popularity_score: popularity,
        avg_rating: Some(4.0),
    }
}
