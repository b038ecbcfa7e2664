//! R-tree node wrapping a station.
//!
//! The tree is keyed on raw `[lng, lat]` degrees. It is only used as a coarse
//! bounding-box filter; exact distances are always recomputed with the
//! haversine formula afterwards.

use std::sync::Arc;

use rstar::{AABB, PointDistance, RTreeObject};

use crate::domain::{Coordinates, Station, meters_to_lat_degrees, meters_to_lng_degrees};

#[derive(Debug, Clone)]
pub(crate) struct StationNode {
    pub station: Arc<Station>,
    point: [f64; 2],
}

impl StationNode {
    pub fn new(station: Arc<Station>) -> Self {
        let point = station.coordinates.as_xy();
        Self { station, point }
    }
}

impl RTreeObject for StationNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Bounding box in degrees around `center` covering a radius in meters.
///
/// Longitude extent is scaled by `cos(lat)`.
pub(crate) fn bounding_box(center: &Coordinates, radius_m: f64) -> AABB<[f64; 2]> {
    let dlat = meters_to_lat_degrees(radius_m);
    let dlng = meters_to_lng_degrees(radius_m, center.lat);
    AABB::from_corners(
        [center.lng - dlng, center.lat - dlat],
        [center.lng + dlng, center.lat + dlat],
    )
}
