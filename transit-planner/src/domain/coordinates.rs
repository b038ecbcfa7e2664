//! Geographic coordinates and great-circle helpers.

use std::fmt;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// Meters per degree of latitude (and of longitude at the equator), on the
/// same mean Earth radius the haversine distance uses.
pub const METERS_PER_DEGREE: f64 = 111_195.08;

/// Error returned when a latitude or longitude is out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates ({lat}, {lng}): {reason}")]
pub struct InvalidCoordinates {
    pub lat: f64,
    pub lng: f64,
    reason: &'static str,
}

/// A WGS84 position.
///
/// `Coordinates::new` guarantees `-90 <= lat <= 90` and `-180 <= lng <= 180`.
/// Values produced by deserialization are checked with [`Coordinates::validate`]
/// when the network is loaded into the station index.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinates> {
        let coordinates = Self { lat, lng };
        coordinates.validate()?;
        Ok(coordinates)
    }

    /// Check the latitude/longitude invariants.
    pub fn validate(&self) -> Result<(), InvalidCoordinates> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(self.invalid("must be finite"));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(self.invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(self.invalid("longitude must be within [-180, 180]"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &'static str) -> InvalidCoordinates {
        InvalidCoordinates {
            lat: self.lat,
            lng: self.lng,
            reason,
        }
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        self.to_point().haversine_distance(&other.to_point())
    }

    /// The `[lng, lat]` pair used as an R-tree point.
    pub fn as_xy(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    fn to_point(self) -> Point {
        Point::new(self.lng, self.lat)
    }

    /// Round both components to `decimals` places, returned as scaled integers.
    ///
    /// Identical inputs always produce identical output, which makes the
    /// result usable as a hash key.
    pub fn rounded(&self, decimals: u32) -> (i64, i64) {
        let scale = 10f64.powi(decimals as i32);
        (
            (self.lat * scale).round() as i64,
            (self.lng * scale).round() as i64,
        )
    }
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Convert a north-south distance in meters to degrees of latitude.
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Convert an east-west distance in meters to degrees of longitude at `lat`.
///
/// Near the poles the cosine is clamped so the result stays finite.
pub fn meters_to_lng_degrees(meters: f64, lat: f64) -> f64 {
    let cos_lat = lat.to_radians().cos().abs().max(1e-6);
    meters / (METERS_PER_DEGREE * cos_lat)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn coordinates() -> impl Strategy<Value = Coordinates> {
        (-89.0f64..89.0, -179.0f64..179.0).prop_map(|(lat, lng)| Coordinates { lat, lng })
    }

    proptest! {
        #[test]
        fn valid_ranges_always_construct(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            prop_assert!(Coordinates::new(lat, lng).is_ok());
        }

        #[test]
        fn triangle_inequality(a in coordinates(), b in coordinates(), c in coordinates()) {
            let ab = a.distance_to(&b);
            let bc = b.distance_to(&c);
            let ac = a.distance_to(&c);
            prop_assert!(ac <= ab + bc + 1e-3);
        }

        /// A box built from the degree conversions always contains the circle.
        #[test]
        fn bounding_box_covers_radius(p in coordinates(), meters in 1.0f64..10_000.0) {
            let north = Coordinates { lat: p.lat + meters_to_lat_degrees(meters), lng: p.lng };
            let east = Coordinates { lat: p.lat, lng: p.lng + meters_to_lng_degrees(meters, p.lat) };
            prop_assert!(p.distance_to(&north) >= meters * 0.99);
            prop_assert!(p.distance_to(&east) >= meters * 0.99);
        }
    }
}
