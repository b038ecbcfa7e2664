//! Route types.
//!
//! A `Route` is a complete origin-to-destination plan made of walk and
//! transit segments. Routes are produced by path search, scored, filtered by
//! the optimizer and then frozen as output.

use std::collections::HashSet;
use std::sync::Arc;

use super::{Station, StationId, TransitLine};

/// A walk between two points (endpoint or station).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    /// Duration in seconds, including any long-walk penalty.
    pub duration: u32,
    /// Walking distance in meters.
    pub distance: u32,
}

/// A ride on a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub line: Arc<TransitLine>,
    /// Stations in travel order, boarding station first.
    pub stations: Vec<Station>,
    /// Duration in seconds, including boarding and interchange time.
    pub duration: u32,
}

impl Ride {
    /// Number of station-to-station hops ridden.
    pub fn stops(&self) -> usize {
        self.stations.len().saturating_sub(1)
    }
}

/// A segment of a route: either a walk or a ride.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Walk(Walk),
    Transit(Ride),
}

impl Segment {
    /// Returns the duration of this segment in seconds.
    pub fn duration(&self) -> u32 {
        match self {
            Segment::Walk(walk) => walk.duration,
            Segment::Transit(ride) => ride.duration,
        }
    }

    /// Returns true if this is a walk segment.
    pub fn is_walk(&self) -> bool {
        matches!(self, Segment::Walk(_))
    }

    /// Returns true if this is a transit segment.
    pub fn is_transit(&self) -> bool {
        matches!(self, Segment::Transit(_))
    }

    /// Returns the ride if this is a transit segment.
    pub fn as_ride(&self) -> Option<&Ride> {
        match self {
            Segment::Walk(_) => None,
            Segment::Transit(ride) => Some(ride),
        }
    }

    /// Returns the walk if this is a walk segment.
    pub fn as_walk(&self) -> Option<&Walk> {
        match self {
            Segment::Walk(walk) => Some(walk),
            Segment::Transit(_) => None,
        }
    }
}

/// A candidate or final route.
///
/// # Invariants
///
/// - `total_duration` is the sum of the segment durations
/// - `total_stops` is the sum of hops over transit segments
/// - `transfers` counts consecutive transit segments on different lines
///
/// All three are derived in [`Route::new`], so they cannot drift from the
/// segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Stable identifier; empty until the optimizer assigns one.
    pub id: String,
    segments: Vec<Segment>,
    total_duration: u32,
    total_stops: usize,
    transfers: usize,
    is_direct_walk: bool,
}

impl Route {
    /// Build a route from its segments, deriving the totals.
    pub fn new(segments: Vec<Segment>) -> Self {
        let total_duration = segments.iter().map(Segment::duration).sum();
        let total_stops = segments
            .iter()
            .filter_map(Segment::as_ride)
            .map(Ride::stops)
            .sum();
        let transfers = count_transfers(&segments);

        Self {
            id: String::new(),
            segments,
            total_duration,
            total_stops,
            transfers,
            is_direct_walk: false,
        }
    }

    /// The pure-walk route: a single walk from origin to destination.
    pub fn direct_walk(walk: Walk) -> Self {
        let mut route = Self::new(vec![Segment::Walk(walk)]);
        route.is_direct_walk = true;
        route
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total duration in seconds.
    pub fn total_duration(&self) -> u32 {
        self.total_duration
    }

    pub fn total_stops(&self) -> usize {
        self.total_stops
    }

    pub fn transfers(&self) -> usize {
        self.transfers
    }

    pub fn is_direct_walk(&self) -> bool {
        self.is_direct_walk
    }

    /// True if the route has no transit segment.
    pub fn is_walk_only(&self) -> bool {
        !self.has_transit()
    }

    pub fn has_transit(&self) -> bool {
        self.segments.iter().any(Segment::is_transit)
    }

    /// Total walking distance in meters.
    pub fn walking_distance(&self) -> u32 {
        self.segments
            .iter()
            .filter_map(Segment::as_walk)
            .map(|walk| walk.distance)
            .sum()
    }


    /// The set of physical stations this route passes through.
    pub fn station_set(&self) -> HashSet<&StationId> {
        self.segments
            .iter()
            .filter_map(Segment::as_ride)
            .flat_map(|ride| ride.stations.iter().map(|s| &s.id))
            .collect()
    }

    /// Corridor similarity: Jaccard similarity of the two station sets.
    ///
    /// Two routes with no stations at all (pure walks) are identical
    /// corridors; a walk compared with a transit route shares nothing.
    pub fn similarity(&self, other: &Route) -> f64 {
        jaccard(&self.station_set(), &other.station_set())
    }

    /// A string that is equal for routes with the same shape.
    ///
    /// Used to remove exact duplicates and to derive stable ids.
    pub fn signature(&self) -> String {
        let mut signature = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Walk(walk) => {
                    signature.push_str(&format!("W{}:{};", walk.distance, walk.duration));
                }
                Segment::Transit(ride) => {
                    signature.push_str(&format!("T{}", ride.line.id));
                    for station in &ride.stations {
                        signature.push(':');
                        signature.push_str(station.id.as_str());
                    }
                    signature.push(';');
                }
            }
        }
        signature
    }
}

/// Jaccard similarity of two sets; two empty sets are identical.
pub fn jaccard(a: &HashSet<&StationId>, b: &HashSet<&StationId>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Count line changes between consecutive transit segments.
///
/// Walks between rides do not reset the count: riding line A, walking, then
/// riding line B is one transfer.
fn count_transfers(segments: &[Segment]) -> usize {
    let mut transfers = 0;
    let mut previous_line = None;
    for ride in segments.iter().filter_map(Segment::as_ride) {
        if let Some(previous) = previous_line
            && previous != &ride.line.id
        {
            transfers += 1;
        }
        previous_line = Some(&ride.line.id);
    }
    transfers
}
