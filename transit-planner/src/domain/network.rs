//! Static network types: stations and the lines that serve them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Identifier of a physical station, unique across the whole network.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(Arc<str>);

impl StationId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a transit line.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Arc<str>);

impl LineId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A physical station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub coordinates: Coordinates,
}

impl Station {
    pub fn new(id: impl AsRef<str>, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id: StationId::new(id),
            name: name.into(),
            coordinates,
        }
    }
}

/// A fixed transit line.
///
/// The order of `stations` is one travel direction; the line is ridden in
/// both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitLine {
    pub id: LineId,
    pub name: String,
    pub color: String,
    pub stations: Vec<Station>,

    /// Headway between vehicles, in minutes.
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    /// Free-text service window, e.g. "05:30-00:30".
    #[serde(default)]
    pub schedule: Option<String>,

    /// Flat fare shown to the user.
    #[serde(default)]
    pub ticket_cost: f64,
}

fn default_frequency() -> u32 {
    10
}

impl TransitLine {
    /// Position of `station` on this line, if the line serves it.
    pub fn position_of(&self, station: &StationId) -> Option<usize> {
        self.stations.iter().position(|s| &s.id == station)
    }

    /// Stations ridden from position `from` to position `to`, inclusive,
    /// in travel order. Works in both directions.
    pub fn stations_between(&self, from: usize, to: usize) -> Vec<Station> {
        if from <= to {
            self.stations
                .get(from..=to)
                .map(<[Station]>::to_vec)
                .unwrap_or_default()
        } else {
            self.stations
                .get(to..=from)
                .map(|slice| slice.iter().rev().cloned().collect())
                .unwrap_or_default()
        }
    }
}
