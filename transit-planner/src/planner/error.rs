//! Planner error types.

use crate::domain::{Coordinates, InvalidCoordinates, LineId, StationId};

/// Errors from planning a single query.
///
/// None of these reach callers of `find_best_routes`: a failed query
/// degrades to `None`, a malformed candidate path is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// Station id is not in the network and no coordinates were given
    #[error("unknown station: {0}")]
    UnknownStation(StationId),

    /// Request coordinates are out of range
    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    /// No station within the maximum walking distance of a point
    #[error("no station within {max_walk_m} m of {point:?}")]
    NoStationNearby { point: Coordinates, max_walk_m: f64 },

    /// A transit edge references a line the graph does not hold
    #[error("line {0} is not part of the query graph")]
    UnknownLine(LineId),

    /// A transit edge's positions do not fit its line
    #[error("line {line} has no stations between positions {from} and {to}")]
    InvalidRide {
        line: LineId,
        from: usize,
        to: usize,
    },
}
