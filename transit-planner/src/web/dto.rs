//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinates, Ride, Route, Segment, Station, Walk};
use crate::stations::NearbyStation;

/// Request to plan routes between two stations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRoutesRequest {
    /// Station the trip starts at or near
    pub origin_station_id: String,

    /// Station the trip ends at or near
    pub destination_station_id: String,

    /// Exact start position (defaults to the origin station)
    pub origin: Option<Coordinates>,

    /// Exact end position (defaults to the destination station)
    pub destination: Option<Coordinates>,
}

/// Response with planned routes, best first.
#[derive(Debug, Serialize)]
pub struct PlanRoutesResponse {
    pub routes: Vec<RouteResult>,
}

/// A planned route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub id: String,
    pub segments: Vec<SegmentResult>,

    /// Total duration in seconds
    pub total_duration: u32,

    /// Station-to-station hops ridden
    pub total_stops: usize,

    pub transfers: usize,
    pub is_direct_walk: bool,
}

/// A segment in a route (either a walk or a ride).
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SegmentResult {
    Walk(WalkResult),
    Transit(TransitResult),
}

/// A walk segment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkResult {
    /// Duration in seconds
    pub duration: u32,

    /// Distance in meters
    pub walking_distance: u32,
}

/// A ride on one line.
#[derive(Debug, Serialize)]
pub struct TransitResult {
    pub line: LineResult,
    pub stations: Vec<StationResult>,

    /// Duration in seconds, boarding and interchange included
    pub duration: u32,
}

/// Line summary.
#[derive(Debug, Serialize)]
pub struct LineResult {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Station summary.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
}

/// Request for stations near a point.
#[derive(Debug, Deserialize)]
pub struct NearbyStationsRequest {
    pub lat: f64,
    pub lng: f64,

    /// Maximum number of results
    pub count: Option<usize>,

    /// Search radius in meters
    pub radius: Option<f64>,
}

/// Response with nearby stations, nearest first.
#[derive(Debug, Serialize)]
pub struct NearbyStationsResponse {
    pub stations: Vec<NearbyStationResult>,
}

/// A station near the requested point.
#[derive(Debug, Serialize)]
pub struct NearbyStationResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,

    /// Distance in meters
    pub distance: u32,

    /// Ids of the lines serving the station
    pub lines: Vec<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Conversion implementations

impl RouteResult {
    pub fn from_route(route: &Route) -> Self {
        Self {
            id: route.id.clone(),
            segments: route.segments().iter().map(SegmentResult::from_segment).collect(),
            total_duration: route.total_duration(),
            total_stops: route.total_stops(),
            transfers: route.transfers(),
            is_direct_walk: route.is_direct_walk(),
        }
    }
}

impl SegmentResult {
    pub fn from_segment(segment: &Segment) -> Self {
        match segment {
            Segment::Walk(walk) => SegmentResult::Walk(WalkResult::from_walk(walk)),
            Segment::Transit(ride) => SegmentResult::Transit(TransitResult::from_ride(ride)),
        }
    }
}

impl WalkResult {
    pub fn from_walk(walk: &Walk) -> Self {
        Self {
            duration: walk.duration,
            walking_distance: walk.distance,
        }
    }
}

impl TransitResult {
    pub fn from_ride(ride: &Ride) -> Self {
        Self {
            line: LineResult {
                id: ride.line.id.to_string(),
                name: ride.line.name.clone(),
                color: ride.line.color.clone(),
            },
            stations: ride.stations.iter().map(StationResult::from_station).collect(),
            duration: ride.duration,
        }
    }
}

impl StationResult {
    pub fn from_station(station: &Station) -> Self {
        Self {
            id: station.id.to_string(),
            name: station.name.clone(),
        }
    }
}

impl NearbyStationResult {
    pub fn from_nearby(nearby: &NearbyStation, lines: Vec<String>) -> Self {
        Self {
            id: nearby.station.id.to_string(),
            name: nearby.station.name.clone(),
            lat: nearby.station.coordinates.lat,
            lng: nearby.station.coordinates.lng,
            distance: nearby.distance.round() as u32,
            lines,
        }
    }
}
