//! Domain types for the route planner.
//!
//! This module contains the network model (stations, lines), geographic
//! coordinates and the route model returned to callers. Types enforce their
//! invariants at construction time.

mod coordinates;
mod error;
mod network;
mod route;

pub use coordinates::{
    Coordinates, InvalidCoordinates, METERS_PER_DEGREE, meters_to_lat_degrees,
    meters_to_lng_degrees,
};
pub use error::NetworkError;
pub use network::{LineId, Station, StationId, TransitLine};
pub use route::{Ride, Route, Segment, Walk, jaccard};

#[cfg(test)]
pub(crate) use route::test_support;
