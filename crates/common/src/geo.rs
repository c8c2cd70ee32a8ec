//! Geographic primitives for radius search.

use std::fmt;

use crate::{AppError, AppResult};

/// Mean Earth radius used by every distance computation, in Rust and in SQL.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS-84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    pub lat: f64,
    /// Longitude in degrees, `-180..=180`.
    pub lng: f64,
}

/// Lat/lng envelope around a point.
///
/// `lng` is `None` when the envelope wraps a pole or the antimeridian, in which
/// case only the latitude band is a usable prefilter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum and maximum latitude.
    pub lat: (f64, f64),
    /// Minimum and maximum longitude.
    pub lng: Option<(f64, f64)>,
}

impl GeoPoint {
    /// Create a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> AppResult<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(AppError::InvalidQuery(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::InvalidQuery(format!(
                "latitude {lat} out of range"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::InvalidQuery(format!(
                "longitude {lng} out of range"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Parse a `"lat,lng"` string.
    pub fn parse(location: &str) -> AppResult<Self> {
        let (lat, lng) = location.split_once(',').ok_or_else(|| {
            AppError::InvalidQuery(format!("location must be \"lat,lng\": {location}"))
        })?;

        let parse = |s: &str| {
            s.trim().parse::<f64>().map_err(|_| {
                AppError::InvalidQuery(format!("location must be \"lat,lng\": {location}"))
            })
        };

        Self::new(parse(lat)?, parse(lng)?)
    }

    /// Haversine great-circle distance in meters.
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_METERS * c
    }

    /// Envelope containing every point within `radius_m` meters.
    #[must_use]
    pub fn bounding_box(&self, radius_m: f64) -> BoundingBox {
        let angular = (radius_m / EARTH_RADIUS_METERS).to_degrees();
        let min_lat = self.lat - angular;
        let max_lat = self.lat + angular;

        if min_lat <= -90.0 || max_lat >= 90.0 {
            return BoundingBox {
                lat: (min_lat.max(-90.0), max_lat.min(90.0)),
                lng: None,
            };
        }

        let lng_delta = (angular.to_radians().sin() / self.lat.to_radians().cos())
            .asin()
            .to_degrees();
        let min_lng = self.lng - lng_delta;
        let max_lng = self.lng + lng_delta;

        let lng = if min_lng < -180.0 || max_lng > 180.0 || lng_delta.is_nan() {
            None
        } else {
            Some((min_lng, max_lng))
        };

        BoundingBox {
            lat: (min_lat, max_lat),
            lng,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}
