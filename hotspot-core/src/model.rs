//! Records flowing through the hotspot pipeline and the query surface.
//!
//! Input records use WGS84 coordinates with `x = longitude` and
//! `y = latitude`. Zone and hotspot geometry is held in the metric plane of
//! the run's [`LocalProjection`](crate::LocalProjection).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use geo::{Centroid, Coord, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ClusterId;
use crate::temporal::TemporalBand;

/// Where a place record was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    /// Google Places export.
    GooglePlaces,
    /// OpenStreetMap amenity extract.
    OpenStreetMap,
    /// Any other provenance.
    #[default]
    #[serde(other)]
    Other,
}

/// A restaurant from the merged, deduplicated place dataset.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use hotspot_core::{PlaceRecord, PlaceSource};
///
/// let place = PlaceRecord::new(7, "Katz's", Coord { x: -73.987, y: 40.722 })
///     .with_rating(4.5)
///     .with_source(PlaceSource::GooglePlaces);
/// assert_eq!(place.rating, Some(4.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Unique identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// WGS84 position.
    pub location: Coord<f64>,
    /// Average user rating, when the source provides one.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Free-form cuisine tag.
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Provenance of the record.
    #[serde(default)]
    pub source: PlaceSource,
}

impl PlaceRecord {
    /// Construct a place without rating, cuisine or provenance.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            rating: None,
            cuisine: None,
            source: PlaceSource::Other,
        }
    }

    /// Attach a rating.
    #[must_use]
    pub const fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Attach a cuisine tag.
    #[must_use]
    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    /// Attach a provenance source.
    #[must_use]
    pub const fn with_source(mut self, source: PlaceSource) -> Self {
        self.source = source;
        self
    }
}

/// A drop-off as delivered by the ingestion layer, before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMobilityEvent {
    /// WGS84 drop-off position.
    pub location: Coord<f64>,
    /// Local drop-off time.
    pub timestamp: NaiveDateTime,
}

impl RawMobilityEvent {
    /// Construct a raw event.
    #[must_use]
    pub const fn new(location: Coord<f64>, timestamp: NaiveDateTime) -> Self {
        Self {
            location,
            timestamp,
        }
    }
}

/// A drop-off carrying its temporal weight.
///
/// Only [`TemporalWeighter`](crate::TemporalWeighter) creates these, so the
/// weight is assigned exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct MobilityEvent {
    location: Coord<f64>,
    timestamp: NaiveDateTime,
    band: TemporalBand,
    weight: f64,
}

impl MobilityEvent {
    pub(crate) const fn new(
        location: Coord<f64>,
        timestamp: NaiveDateTime,
        band: TemporalBand,
        weight: f64,
    ) -> Self {
        Self {
            location,
            timestamp,
            band,
            weight,
        }
    }

    /// WGS84 drop-off position.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Local drop-off time.
    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Temporal band the event fell into.
    #[must_use]
    pub const fn band(&self) -> TemporalBand {
        self.band
    }

    /// Weight assigned by the temporal weighter.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// Stable identifier of a [`FinalHotspot`] within one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotspotId(pub u32);

impl fmt::Display for HotspotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

/// The intersection of one dining zone with one hotspot area that passed
/// the area and overlap filters.
///
/// Geometry is in the projected plane. Scores are relative to the run that
/// produced them: `restaurant_score` and `mobility_score` are normalised by
/// the run's maxima, and `popularity_score` lies in `0.0..=100.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalHotspot {
    /// Position in the accepted hotspot list.
    pub id: HotspotId,
    /// Restaurant cluster the dining zone came from.
    pub dining_cluster_id: ClusterId,
    /// Mobility cluster the hotspot area came from.
    pub hotspot_cluster_id: ClusterId,
    /// Intersection polygon.
    pub geometry: Polygon<f64>,
    /// Area of `geometry` in square metres.
    pub intersection_area: f64,
    /// Smaller of the two one-sided overlap fractions.
    pub overlap_ratio: f64,
    /// Restaurants in the source dining zone.
    pub restaurant_count: u32,
    /// Summed temporal weight of the source hotspot area.
    pub mobility_weight: f64,
    /// `restaurant_count` over the run maximum.
    pub restaurant_score: f64,
    /// `mobility_weight` over the run maximum.
    pub mobility_score: f64,
    /// Weighted blend of the two scores, scaled to `0.0..=100.0`.
    pub popularity_score: f64,
    /// Mean rating of the source dining zone.
    pub avg_rating: Option<f64>,
}

impl FinalHotspot {
    /// Geometric centroid in the projected plane.
    #[must_use]
    pub fn centroid(&self) -> Option<Coord<f64>> {
        self.geometry.centroid().map(|point| point.0)
    }
}

/// Ways a user can travel to a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    /// On foot.
    Walk,
    /// By bicycle.
    Bike,
    /// By car or taxi.
    Drive,
}

impl TravelMode {
    /// Every supported mode, in declaration order.
    pub const ALL: [Self; 3] = [Self::Walk, Self::Bike, Self::Drive];

    /// Lower-case name used on the command line and in files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Bike => "bike",
            Self::Drive => "drive",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`TravelMode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown travel mode {0:?}; expected walk, bike or drive")]
pub struct TravelModeParseError(pub String);

impl FromStr for TravelMode {
    type Err = TravelModeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "walk" | "walking" => Ok(Self::Walk),
            "bike" | "cycle" | "bicycle" => Ok(Self::Bike),
            "drive" | "driving" | "car" => Ok(Self::Drive),
            _ => Err(TravelModeParseError(value.to_owned())),
        }
    }
}

/// A single recommendation request.
///
/// `alpha` weights popularity and `beta` accessibility. When only one is
/// supplied the other is its complement; when neither is supplied the
/// service defaults apply.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use hotspot_core::{TravelMode, UserQuery};
///
/// let query = UserQuery::new(Coord { x: -73.98, y: 40.75 }, TravelMode::Walk, 15.0)
///     .with_weights(0.7, 0.3)
///     .with_limit(5);
/// assert_eq!(query.limit, Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuery {
    /// WGS84 origin.
    pub origin: Coord<f64>,
    /// Travel mode to evaluate.
    pub mode: TravelMode,
    /// Travel-time budget in minutes.
    pub time_budget_minutes: f64,
    /// Popularity weight override.
    #[serde(default)]
    pub alpha: Option<f64>,
    /// Accessibility weight override.
    #[serde(default)]
    pub beta: Option<f64>,
    /// Maximum number of results.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl UserQuery {
    /// Construct a query using default weights and limit.
    #[must_use]
    pub const fn new(origin: Coord<f64>, mode: TravelMode, time_budget_minutes: f64) -> Self {
        Self {
            origin,
            mode,
            time_budget_minutes,
            alpha: None,
            beta: None,
            limit: None,
        }
    }

    /// Override both ranking weights.
    #[must_use]
    pub const fn with_weights(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = Some(alpha);
        self.beta = Some(beta);
        self
    }

    /// Override the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A ranked hotspot for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position in the ranked list.
    pub rank: u32,
    /// Recommended hotspot.
    pub hotspot_id: HotspotId,
    /// WGS84 centroid of the hotspot.
    pub centroid: Coord<f64>,
    /// Shortest network travel time from the origin.
    pub travel_time_minutes: f64,
    /// Popularity of the hotspot, `0.0..=100.0`.
    pub popularity_score: f64,
    /// Unused share of the time budget, `0.0..=100.0`.
    pub accessibility_score: f64,
    /// `alpha * popularity + beta * accessibility`.
    pub final_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("walk", TravelMode::Walk)]
    #[case(" Drive ", TravelMode::Drive)]
    #[case("bicycle", TravelMode::Bike)]
    fn travel_mode_parses_aliases(#[case] raw: &str, #[case] expected: TravelMode) {
        assert_eq!(raw.parse::<TravelMode>(), Ok(expected));
    }

    #[rstest]
    fn travel_mode_rejects_unknown() {
        let err = "teleport".parse::<TravelMode>().expect_err("unknown mode");
        assert_eq!(err, TravelModeParseError("teleport".into()));
    }

    #[rstest]
    fn place_source_falls_back_to_other() {
        let source: PlaceSource =
            serde_json::from_str("\"yelp\"").expect("unknown sources deserialize");
        assert_eq!(source, PlaceSource::Other);
    }

    #[rstest]
    fn place_record_defaults_optional_fields() {
        let json = r#"{"id":3,"name":"Diner","location":{"x":-73.9,"y":40.7}}"#;
        let place: PlaceRecord = serde_json::from_str(json).expect("minimal place");
        assert_eq!(place.rating, None);
        assert_eq!(place.source, PlaceSource::Other);
    }
}
