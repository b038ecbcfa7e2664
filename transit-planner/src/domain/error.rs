//! Domain error types.
//!
//! These errors describe a malformed network catalog. They are raised only
//! while the station index is being initialized, never while answering a
//! request.

use super::{InvalidCoordinates, LineId, StationId};

/// Upstream data errors found while loading the network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// A line has no stations
    #[error("line {0} has no stations")]
    EmptyLine(LineId),

    /// Two lines share the same id
    #[error("duplicate line id {0}")]
    DuplicateLine(LineId),

    /// The same station id is defined with different names or positions
    #[error("station {0} is defined inconsistently across lines")]
    ConflictingStation(StationId),

    /// A station has out-of-range coordinates
    #[error("station {station}: {source}")]
    InvalidCoordinates {
        station: StationId,
        #[source]
        source: InvalidCoordinates,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    #[test]
    fn error_display() {
        let err = NetworkError::EmptyLine(LineId::new("blue"));
        assert_eq!(err.to_string(), "line blue has no stations");

        let err = NetworkError::DuplicateLine(LineId::new("blue"));
        assert_eq!(err.to_string(), "duplicate line id blue");

        let err = NetworkError::ConflictingStation(StationId::new("A"));
        assert_eq!(
            err.to_string(),
            "station A is defined inconsistently across lines"
        );

        let source = Coordinates::new(0.0, 200.0).unwrap_err();
        let err = NetworkError::InvalidCoordinates {
            station: StationId::new("A"),
            source,
        };
        assert!(err.to_string().starts_with("station A: invalid coordinates"));
    }
}
