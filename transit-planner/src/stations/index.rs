//! The station index.
//!
//! Holds the static network once it has been loaded and answers the two
//! spatial questions the planner asks: "which stations are within this
//! radius?" and "which stations are the best places to enter the network
//! from here?".

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rstar::RTree;
use tracing::{debug, info};

use crate::domain::{Coordinates, LineId, NetworkError, Station, StationId, TransitLine};

use super::spatial::{StationNode, bounding_box};

/// Distance over which the proximity part of the access score decays by 1/e.
const ACCESS_DECAY_M: f64 = 500.0;

/// Distance at which serving more lines stops counting.
const LINE_BONUS_FADE_M: f64 = 1500.0;

/// Number of serving lines at which the line bonus saturates.
const LINE_COUNT_SATURATION: f64 = 3.0;

/// Candidates fetched per requested accessible station.
const ACCESS_CANDIDATE_FACTOR: usize = 2;

/// Same station seen on two lines further apart than this is a data error.
const STATION_POSITION_TOLERANCE_M: f64 = 1.0;

/// Pad the search box so stations right at the radius survive the
/// degree approximation.
const BOX_PADDING: f64 = 1.02;

/// A station near a query point.
#[derive(Debug, Clone)]
pub struct NearbyStation {
    pub station: Arc<Station>,
    /// Great-circle distance from the query point, in meters.
    pub distance: f64,
}

/// A station ranked for how good an entry point into the network it is.
#[derive(Debug, Clone)]
pub struct AccessibleStation {
    pub station: Arc<Station>,
    /// Great-circle distance from the query point, in meters.
    pub distance: f64,
    /// Number of lines serving the station.
    pub line_count: usize,
    /// Access score, higher is better.
    pub score: f64,
}

/// Access score for a station `distance` meters away served by `line_count` lines.
///
/// Proximity dominates; an interchange a little further away can still
/// outrank the nearest single-line stop.
pub fn access_score(distance: f64, line_count: usize) -> f64 {
    let proximity = (-distance / ACCESS_DECAY_M).exp();
    let lines = (line_count as f64 / LINE_COUNT_SATURATION).min(1.0);
    let fade = (1.0 - distance / LINE_BONUS_FADE_M).max(0.0);
    proximity * 0.7 + lines * fade * 0.3
}

/// Immutable network data, built once.
struct IndexData {
    stations: HashMap<StationId, Arc<Station>>,
    lines: Vec<Arc<TransitLine>>,
    lines_by_id: HashMap<LineId, Arc<TransitLine>>,
    lines_at: HashMap<StationId, Vec<LineId>>,
    tree: RTree<StationNode>,
}

impl IndexData {
    fn build(lines: Vec<TransitLine>) -> Result<Self, NetworkError> {
        let mut stations: HashMap<StationId, Arc<Station>> = HashMap::new();
        let mut lines_by_id: HashMap<LineId, Arc<TransitLine>> = HashMap::new();
        let mut lines_at: HashMap<StationId, Vec<LineId>> = HashMap::new();
        let mut ordered = Vec::with_capacity(lines.len());

        for line in lines {
            if line.stations.is_empty() {
                return Err(NetworkError::EmptyLine(line.id));
            }
            if lines_by_id.contains_key(&line.id) {
                return Err(NetworkError::DuplicateLine(line.id));
            }

            for station in &line.stations {
                station
                    .coordinates
                    .validate()
                    .map_err(|source| NetworkError::InvalidCoordinates {
                        station: station.id.clone(),
                        source,
                    })?;

                match stations.entry(station.id.clone()) {
                    Entry::Occupied(existing) => {
                        let existing = existing.get();
                        let moved = existing.coordinates.distance_to(&station.coordinates)
                            > STATION_POSITION_TOLERANCE_M;
                        if existing.name != station.name || moved {
                            return Err(NetworkError::ConflictingStation(station.id.clone()));
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::new(station.clone()));
                    }
                }

                let serving = lines_at.entry(station.id.clone()).or_default();
                if !serving.contains(&line.id) {
                    serving.push(line.id.clone());
                }
            }

            let line = Arc::new(line);
            lines_by_id.insert(line.id.clone(), Arc::clone(&line));
            ordered.push(line);
        }

        let nodes = stations
            .values()
            .map(|station| StationNode::new(Arc::clone(station)))
            .collect();

        Ok(Self {
            stations,
            lines: ordered,
            lines_by_id,
            lines_at,
            tree: RTree::bulk_load(nodes),
        })
    }
}

/// Spatial index over the network's stations.
///
/// Initialization happens at most once; afterwards the index never mutates,
/// so reads need no synchronization. Queries on an index that has not been
/// initialized return empty results.
#[derive(Default)]
pub struct StationIndex {
    data: OnceLock<IndexData>,
    init_lock: Mutex<()>,
}

impl StationIndex {
    /// Create an empty, uninitialized index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index and initialize it from `lines`.
    pub fn from_lines(lines: Vec<TransitLine>) -> Result<Self, NetworkError> {
        let index = Self::new();
        index.initialize(lines)?;
        Ok(index)
    }

    /// Load the network.
    ///
    /// Idempotent: once the index holds data, further calls return `Ok(())`
    /// without looking at `lines`. Concurrent callers are serialized so the
    /// network is only ever built once.
    pub fn initialize(&self, lines: Vec<TransitLine>) -> Result<(), NetworkError> {
        if self.data.get().is_some() {
            return Ok(());
        }

        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.data.get().is_some() {
            return Ok(());
        }

        let data = IndexData::build(lines)?;
        info!(
            stations = data.stations.len(),
            lines = data.lines.len(),
            "Station index initialized"
        );
        // Cannot fail: we hold the lock and checked for existing data.
        let _ = self.data.set(data);
        Ok(())
    }

    /// Returns true once the network has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.data.get().is_some()
    }

    /// Number of unique stations.
    pub fn station_count(&self) -> usize {
        self.data.get().map_or(0, |d| d.stations.len())
    }

    /// Look up a station by id.
    pub fn station(&self, id: &StationId) -> Option<&Arc<Station>> {
        self.data.get()?.stations.get(id)
    }

    /// Look up a line by id.
    pub fn line(&self, id: &LineId) -> Option<&Arc<TransitLine>> {
        self.data.get()?.lines_by_id.get(id)
    }

    /// All lines, in catalog order.
    pub fn lines(&self) -> &[Arc<TransitLine>] {
        self.data.get().map_or(&[], |d| d.lines.as_slice())
    }

    /// Ids of the lines serving a station.
    pub fn lines_at(&self, station: &StationId) -> &[LineId] {
        self.data
            .get()
            .and_then(|d| d.lines_at.get(station))
            .map_or(&[], Vec::as_slice)
    }

    /// Stations within `max_distance` meters of `point`, nearest first,
    /// at most `count` of them.
    pub fn find_nearest_stations(
        &self,
        point: &Coordinates,
        count: usize,
        max_distance: f64,
    ) -> Vec<NearbyStation> {
        let Some(data) = self.data.get() else {
            return Vec::new();
        };
        if count == 0 || !(max_distance >= 0.0) {
            return Vec::new();
        }

        let envelope = bounding_box(point, max_distance * BOX_PADDING);
        let mut found: Vec<NearbyStation> = data
            .tree
            .locate_in_envelope(&envelope)
            .filter_map(|node| {
                let distance = point.distance_to(&node.station.coordinates);
                (distance <= max_distance).then(|| NearbyStation {
                    station: Arc::clone(&node.station),
                    distance,
                })
            })
            .collect();

        found.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.station.id.cmp(&b.station.id))
        });
        found.truncate(count);
        found
    }

    /// The best `count` stations to enter the network from `point`.
    ///
    /// Candidates within `max_distance` are ranked by [`access_score`]. If
    /// fewer than `count` pass `filter`, the search is retried once with a
    /// 1.5x radius and 3x as many candidates; a short list is returned if
    /// that still is not enough.
    pub fn find_accessible_stations(
        &self,
        point: &Coordinates,
        count: usize,
        max_distance: f64,
        filter: Option<&dyn Fn(&Station) -> bool>,
    ) -> Vec<AccessibleStation> {
        let candidates = count.saturating_mul(ACCESS_CANDIDATE_FACTOR);
        let mut ranked = self.rank_accessible(point, candidates, max_distance, filter);

        if ranked.len() < count {
            debug!(
                found = ranked.len(),
                wanted = count,
                max_distance,
                "Widening accessible station search"
            );
            ranked = self.rank_accessible(
                point,
                candidates.saturating_mul(3),
                max_distance * 1.5,
                filter,
            );
        }

        ranked.truncate(count);
        ranked
    }

    fn rank_accessible(
        &self,
        point: &Coordinates,
        candidates: usize,
        max_distance: f64,
        filter: Option<&dyn Fn(&Station) -> bool>,
    ) -> Vec<AccessibleStation> {
        let mut ranked: Vec<AccessibleStation> = self
            .find_nearest_stations(point, candidates, max_distance)
            .into_iter()
            .filter(|nearby| filter.is_none_or(|accept| accept(&nearby.station)))
            .map(|nearby| {
                let line_count = self.lines_at(&nearby.station.id).len();
                AccessibleStation {
                    score: access_score(nearby.distance, line_count),
                    station: nearby.station,
                    distance: nearby.distance,
                    line_count,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.distance.total_cmp(&b.distance))
        });
        ranked
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn network_strategy() -> impl Strategy<Value = Vec<TransitLine>> {
        prop::collection::vec((45.40f64..45.60, -73.70f64..-73.50), 1..40).prop_map(|points| {
            let stations = points
                .into_iter()
                .enumerate()
                .map(|(i, (lat, lng))| {
                    Station::new(format!("S{i}"), format!("Station {i}"), Coordinates { lat, lng })
                })
                .collect();
            vec![TransitLine {
                id: LineId::new("L"),
                name: "Line".into(),
                color: "#000".into(),
                stations,
                frequency: 5,
                schedule: None,
                ticket_cost: 0.0,
            }]
        })
    }

    proptest! {
        #[test]
        fn nearest_within_radius_and_sorted(
            lines in network_strategy(),
            lat in 45.40f64..45.60,
            lng in -73.70f64..-73.50,
            count in 1usize..20,
            radius in 100.0f64..15_000.0,
        ) {
            let index = StationIndex::from_lines(lines.clone()).unwrap();
            let point = Coordinates { lat, lng };
            let found = index.find_nearest_stations(&point, count, radius);

            prop_assert!(found.len() <= count);
            for nearby in &found {
                prop_assert!(nearby.distance <= radius);
            }
            for pair in found.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }

            // Nothing within the radius was missed by the box filter.
            let expected = lines[0]
                .stations
                .iter()
                .filter(|s| point.distance_to(&s.coordinates) <= radius)
                .count()
                .min(count);
            prop_assert_eq!(found.len(), expected);
        }
    }
}
