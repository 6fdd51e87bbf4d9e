//! Local equirectangular projection between WGS84 and a metric plane.
//!
//! Clustering and buffering work in metres. The transform is linear in both
//! axes, so [`LocalProjection::unproject`] is an exact inverse.

use geo::{Coord, MapCoords, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Origin of a [`LocalProjection`], in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOrigin {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

/// Errors raised when a coordinate cannot be projected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    /// Longitude or latitude was NaN or infinite.
    #[error("coordinate ({lon}, {lat}) is not finite")]
    NonFinite {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
    /// Longitude or latitude lay outside the WGS84 range.
    #[error("coordinate ({lon}, {lat}) is outside the WGS84 range")]
    OutOfRange {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
}

/// Equirectangular projection about a fixed origin.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use hotspot_core::{LocalProjection, ProjectionOrigin};
///
/// let projection = LocalProjection::new(ProjectionOrigin { lon: -73.98, lat: 40.75 })?;
/// let point = projection.project(Coord { x: -73.98, y: 40.75 })?;
/// assert_eq!(point, Coord { x: 0.0, y: 0.0 });
/// # Ok::<(), hotspot_core::ProjectionError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: ProjectionOrigin,
    metres_per_degree_x: f64,
    metres_per_degree_y: f64,
}

impl LocalProjection {
    /// Build a projection centred on `origin`.
    ///
    /// # Errors
    /// Returns [`ProjectionError`] when the origin is not a valid WGS84 point
    /// or sits on a pole.
    pub fn new(origin: ProjectionOrigin) -> Result<Self, ProjectionError> {
        validate(origin.lon, origin.lat)?;
        if origin.lat.abs() >= 89.0 {
            return Err(ProjectionError::OutOfRange {
                lon: origin.lon,
                lat: origin.lat,
            });
        }
        let metres_per_degree_y = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        Ok(Self {
            origin,
            metres_per_degree_x: metres_per_degree_y * origin.lat.to_radians().cos(),
            metres_per_degree_y,
        })
    }

    /// Projection centred on the bounding-box midpoint of `points`.
    ///
    /// Invalid coordinates are ignored. Returns `None` when no valid point
    /// remains.
    #[must_use]
    pub fn centred_on<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let (min, max) = points
            .into_iter()
            .filter(|c| validate(c.x, c.y).is_ok())
            .fold(None::<(Coord<f64>, Coord<f64>)>, |acc, c| match acc {
                None => Some((c, c)),
                Some((lo, hi)) => Some((
                    Coord {
                        x: lo.x.min(c.x),
                        y: lo.y.min(c.y),
                    },
                    Coord {
                        x: hi.x.max(c.x),
                        y: hi.y.max(c.y),
                    },
                )),
            })?;
        Self::new(ProjectionOrigin {
            lon: f64::midpoint(min.x, max.x),
            lat: f64::midpoint(min.y, max.y),
        })
        .ok()
    }

    /// The WGS84 origin.
    #[must_use]
    pub const fn origin(&self) -> ProjectionOrigin {
        self.origin
    }

    /// Project a WGS84 coordinate (`x = lon`, `y = lat`) to metres.
    ///
    /// # Errors
    /// Returns [`ProjectionError`] for non-finite or out-of-range input.
    pub fn project(&self, lon_lat: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        validate(lon_lat.x, lon_lat.y)?;
        Ok(Coord {
            x: (lon_lat.x - self.origin.lon) * self.metres_per_degree_x,
            y: (lon_lat.y - self.origin.lat) * self.metres_per_degree_y,
        })
    }

    /// Map a projected coordinate back to WGS84.
    #[must_use]
    pub fn unproject(&self, point: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.lon + point.x / self.metres_per_degree_x,
            y: self.origin.lat + point.y / self.metres_per_degree_y,
        }
    }

    /// Map a projected polygon back to WGS84.
    #[must_use]
    pub fn unproject_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.unproject(c))
    }

    /// Project a WGS84 polygon.
    ///
    /// # Errors
    /// Returns the first [`ProjectionError`] among the polygon's vertices.
    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>, ProjectionError> {
        polygon.try_map_coords(|c| self.project(c))
    }
}

fn validate(lon: f64, lat: f64) -> Result<(), ProjectionError> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(ProjectionError::NonFinite { lon, lat });
    }
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(ProjectionError::OutOfRange { lon, lat });
    }
    Ok(())
}
