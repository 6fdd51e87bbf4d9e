//! `GeoJSON` codec for the final hotspot collection.
//!
//! Geometry is written in WGS84. The projection origin travels as a
//! `projection` foreign member so a reader can restore the metric geometry the
//! scores were computed on.

use geo::Polygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, feature};
use serde_json::Number;
use thiserror::Error;

use crate::cluster::ClusterId;
use crate::model::{FinalHotspot, HotspotId};
use crate::projection::{LocalProjection, ProjectionError, ProjectionOrigin};

const PROJECTION_MEMBER: &str = "projection";

/// Errors raised while encoding or decoding a hotspot collection.
#[derive(Debug, Error)]
pub enum HotspotGeoJsonError {
    /// The text was not valid `GeoJSON`.
    #[error("invalid GeoJSON: {0}")]
    Parse(#[source] Box<geojson::Error>),
    /// The document was not a feature collection.
    #[error("expected a FeatureCollection")]
    NotFeatureCollection,
    /// The `projection` foreign member was missing or malformed.
    #[error("missing or malformed `projection` member")]
    MissingProjection,
    /// The recorded origin was not a valid WGS84 point.
    #[error("invalid projection origin: {0}")]
    Projection(#[from] ProjectionError),
    /// A feature had no geometry.
    #[error("feature {index} has no geometry")]
    MissingGeometry {
        /// Position of the feature.
        index: usize,
    },
    /// A feature's geometry was not a polygon.
    #[error("feature {index} geometry is not a polygon: {source}")]
    Geometry {
        /// Position of the feature.
        index: usize,
        /// Conversion failure.
        #[source]
        source: Box<geojson::Error>,
    },
    /// A required property was absent or had the wrong type.
    #[error("feature {index} has a missing or invalid `{name}` property")]
    Property {
        /// Position of the feature.
        index: usize,
        /// Property name.
        name: &'static str,
    },
    /// Serialising the collection failed.
    #[error("failed to serialise GeoJSON: {0}")]
    Serialise(#[source] serde_json::Error),
}

/// The hotspots of one run together with the projection they live in.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotCollection {
    /// Projection of every hotspot geometry.
    pub projection: LocalProjection,
    /// Hotspots ordered by id.
    pub hotspots: Vec<FinalHotspot>,
}

impl HotspotCollection {
    /// Wrap hotspots with their projection.
    #[must_use]
    pub const fn new(projection: LocalProjection, hotspots: Vec<FinalHotspot>) -> Self {
        Self {
            projection,
            hotspots,
        }
    }

    /// Build the WGS84 feature collection.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .hotspots
            .iter()
            .map(|hotspot| {
                let wgs84 = self.projection.unproject_polygon(&hotspot.geometry);
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&wgs84))),
                    id: Some(feature::Id::Number(Number::from(hotspot.id.0))),
                    properties: Some(properties(hotspot)),
                    foreign_members: None,
                }
            })
            .collect();
        let origin = self.projection.origin();
        let mut members = JsonObject::new();
        members.insert(
            PROJECTION_MEMBER.to_owned(),
            serde_json::json!({ "lon": origin.lon, "lat": origin.lat }),
        );
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(members),
        }
    }

    /// Pretty-printed `GeoJSON` text.
    ///
    /// # Errors
    /// Returns [`HotspotGeoJsonError::Serialise`] if serialisation fails.
    pub fn to_geojson_string(&self) -> Result<String, HotspotGeoJsonError> {
        serde_json::to_string_pretty(&self.to_feature_collection())
            .map_err(HotspotGeoJsonError::Serialise)
    }

    /// Parse text produced by [`Self::to_geojson_string`].
    ///
    /// Geometry is projected back with the recorded origin, so areas and
    /// centroids match the originals up to floating-point rounding.
    ///
    /// # Errors
    /// Returns [`HotspotGeoJsonError`] describing the first malformed part.
    pub fn from_geojson_str(text: &str) -> Result<Self, HotspotGeoJsonError> {
        let parsed = text
            .parse::<GeoJson>()
            .map_err(|err| HotspotGeoJsonError::Parse(Box::new(err)))?;
        let GeoJson::FeatureCollection(collection) = parsed else {
            return Err(HotspotGeoJsonError::NotFeatureCollection);
        };
        let origin: ProjectionOrigin = collection
            .foreign_members
            .as_ref()
            .and_then(|members| members.get(PROJECTION_MEMBER))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .ok_or(HotspotGeoJsonError::MissingProjection)?;
        let projection = LocalProjection::new(origin)?;

        let hotspots = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| decode_feature(index, feature, &projection))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(projection, hotspots))
    }
}

fn properties(hotspot: &FinalHotspot) -> JsonObject {
    let mut props = JsonObject::new();
    let mut put = |name: &str, value: JsonValue| {
        props.insert(name.to_owned(), value);
    };
    put("hotspot_id", JsonValue::from(hotspot.id.0));
    put("dining_cluster_id", JsonValue::from(hotspot.dining_cluster_id.0));
    put("hotspot_cluster_id", JsonValue::from(hotspot.hotspot_cluster_id.0));
    put("restaurant_count", JsonValue::from(hotspot.restaurant_count));
    put("mobility_weight", JsonValue::from(hotspot.mobility_weight));
    put("intersection_area", JsonValue::from(hotspot.intersection_area));
    put("overlap_ratio", JsonValue::from(hotspot.overlap_ratio));
    put("restaurant_score", JsonValue::from(hotspot.restaurant_score));
    put("mobility_score", JsonValue::from(hotspot.mobility_score));
    put("popularity_score", JsonValue::from(hotspot.popularity_score));
    put(
        "avg_rating",
        hotspot.avg_rating.map_or(JsonValue::Null, JsonValue::from),
    );
    props
}

fn decode_feature(
    index: usize,
    feature: Feature,
    projection: &LocalProjection,
) -> Result<FinalHotspot, HotspotGeoJsonError> {
    let geometry = feature
        .geometry
        .ok_or(HotspotGeoJsonError::MissingGeometry { index })?;
    let wgs84 = Polygon::<f64>::try_from(geometry.value).map_err(|err| {
        HotspotGeoJsonError::Geometry {
            index,
            source: Box::new(err),
        }
    })?;
    let props = feature.properties.unwrap_or_default();
    let number = |name: &'static str| {
        props
            .get(name)
            .and_then(JsonValue::as_f64)
            .ok_or(HotspotGeoJsonError::Property { index, name })
    };
    let count = |name: &'static str| {
        props
            .get(name)
            .and_then(JsonValue::as_u64)
            .and_then(|value| u32::try_from(value).ok())
            .ok_or(HotspotGeoJsonError::Property { index, name })
    };

    Ok(FinalHotspot {
        id: HotspotId(count("hotspot_id")?),
        dining_cluster_id: ClusterId(count("dining_cluster_id")?),
        hotspot_cluster_id: ClusterId(count("hotspot_cluster_id")?),
        geometry: projection.project_polygon(&wgs84)?,
        intersection_area: number("intersection_area")?,
        overlap_ratio: number("overlap_ratio")?,
        restaurant_count: count("restaurant_count")?,
        mobility_weight: number("mobility_weight")?,
        restaurant_score: number("restaurant_score")?,
        mobility_score: number("mobility_score")?,
        popularity_score: number("popularity_score")?,
        avg_rating: props.get("avg_rating").and_then(JsonValue::as_f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{manhattan_projection, square_hotspot};
    use geo::{Area, Coord};
    use rstest::{fixture, rstest};

    #[fixture]
    fn collection() -> HotspotCollection {
        HotspotCollection::new(
            manhattan_projection(),
            vec![
                square_hotspot(0, Coord { x: 0.0, y: 0.0 }, 200.0, 80.0),
                square_hotspot(1, Coord { x: 1_500.0, y: -900.0 }, 150.0, 35.5),
            ],
        )
    }

    #[rstest]
    fn writes_required_properties(collection: HotspotCollection) {
        let features = collection.to_feature_collection();
        let props = features
            .features
            .first()
            .and_then(|f| f.properties.clone())
            .expect("properties");
        for name in [
            "restaurant_count",
            "mobility_weight",
            "restaurant_score",
            "mobility_score",
            "popularity_score",
        ] {
            assert!(props.contains_key(name), "missing {name}");
        }
    }

    #[rstest]
    fn round_trip_preserves_scores_and_geometry(collection: HotspotCollection) {
        let text = collection.to_geojson_string().expect("serialise");
        let parsed = HotspotCollection::from_geojson_str(&text).expect("parse");
        assert_eq!(parsed.projection.origin(), collection.projection.origin());
        assert_eq!(parsed.hotspots.len(), collection.hotspots.len());
        for (before, after) in collection.hotspots.iter().zip(&parsed.hotspots) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.popularity_score, after.popularity_score);
            assert_eq!(before.restaurant_score, after.restaurant_score);
            assert_eq!(before.avg_rating, after.avg_rating);
            let drift = (before.geometry.unsigned_area() - after.geometry.unsigned_area()).abs();
            assert!(drift < 1e-3, "area drift {drift}");
        }
    }

    #[rstest]
    fn rejects_missing_projection() {
        let text = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(matches!(
            HotspotCollection::from_geojson_str(text),
            Err(HotspotGeoJsonError::MissingProjection)
        ));
    }

    #[rstest]
    fn rejects_missing_property(collection: HotspotCollection) {
        let mut features = collection.to_feature_collection();
        if let Some(props) = features
            .features
            .first_mut()
            .and_then(|f| f.properties.as_mut())
        {
            props.remove("popularity_score");
        }
        let text = serde_json::to_string(&features).expect("serialise");
        assert!(matches!(
            HotspotCollection::from_geojson_str(&text),
            Err(HotspotGeoJsonError::Property {
                index: 0,
                name: "popularity_score"
            })
        ));
    }

    #[rstest]
    fn rejects_other_documents() {
        let text = r#"{"type":"Point","coordinates":[0.0,0.0]}"#;
        assert!(matches!(
            HotspotCollection::from_geojson_str(text),
            Err(HotspotGeoJsonError::NotFeatureCollection)
        ));
    }
}
