//! Small synthetic networks for planner tests.
//!
//! All positions are offsets in meters from a reference point in Montreal.

use crate::domain::{
    Coordinates, LineId, Station, TransitLine, meters_to_lat_degrees, meters_to_lng_degrees,
};
use crate::stations::StationIndex;

const BASE_LAT: f64 = 45.5;
const BASE_LNG: f64 = -73.6;

/// A point `east` meters east and `north` meters north of the reference.
pub fn at(east: f64, north: f64) -> Coordinates {
    let lat = BASE_LAT + meters_to_lat_degrees(north);
    let lng = BASE_LNG + meters_to_lng_degrees(east, BASE_LAT);
    Coordinates::new(lat, lng).unwrap()
}

/// A point `meters` east of the reference.
pub fn east(meters: f64) -> Coordinates {
    at(meters, 0.0)
}

pub fn line(id: &str, frequency: u32, stations: &[(&str, Coordinates)]) -> TransitLine {
    TransitLine {
        id: LineId::new(id),
        name: format!("Line {id}"),
        color: "#0072ce".into(),
        stations: stations
            .iter()
            .map(|(sid, coords)| Station::new(sid, format!("Station {sid}"), *coords))
            .collect(),
        frequency,
        schedule: None,
        ticket_cost: 3.75,
    }
}

pub fn index(lines: Vec<TransitLine>) -> StationIndex {
    StationIndex::from_lines(lines).unwrap()
}

/// Line L: S0..S4 along the parallel, 1 km apart.
pub fn straight_line() -> StationIndex {
    let stations: Vec<(String, Coordinates)> = (0..5)
        .map(|i| (format!("S{i}"), east(i as f64 * 1000.0)))
        .collect();
    let refs: Vec<(&str, Coordinates)> = stations.iter().map(|(s, c)| (s.as_str(), *c)).collect();
    index(vec![line("L", 5, &refs)])
}

/// Line A runs east A1 - X - A3, line B runs north X - B2 - B3.
/// X is the only interchange.
pub fn two_lines_one_interchange() -> StationIndex {
    index(vec![
        line(
            "A",
            5,
            &[("A1", east(0.0)), ("X", east(2000.0)), ("A3", east(4000.0))],
        ),
        line(
            "B",
            8,
            &[
                ("X", east(2000.0)),
                ("B2", at(2000.0, 2000.0)),
                ("B3", at(2000.0, 4000.0)),
            ],
        ),
    ])
}

/// 200 m west of A1.
pub fn west_of_a() -> Coordinates {
    east(-200.0)
}

/// 200 m north of B3.
pub fn north_of_b() -> Coordinates {
    at(2000.0, 4200.0)
}

/// Lines A, B and C in a chain along the parallel, 3 km between stations.
/// A and C only meet through B.
pub fn three_lines_chain() -> StationIndex {
    index(vec![
        line(
            "A",
            5,
            &[("A0", east(0.0)), ("A1", east(3000.0)), ("AB", east(6000.0))],
        ),
        line(
            "B",
            5,
            &[("AB", east(6000.0)), ("B1", east(9000.0)), ("BC", east(12000.0))],
        ),
        line(
            "C",
            5,
            &[
                ("BC", east(12000.0)),
                ("C1", east(15000.0)),
                ("C2", east(18000.0)),
            ],
        ),
    ])
}

pub fn near_a_start() -> Coordinates {
    east(-100.0)
}

pub fn near_c_end() -> Coordinates {
    east(18100.0)
}
