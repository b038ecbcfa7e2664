//! Planner configuration.
//!
//! Every tunable the planner uses lives here. Defaults are sensible for an
//! urban metro network; a JSON file may override any subset of them.

use serde::Deserialize;

/// Configuration for the whole planner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub graph: GraphConfig,
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub optimizer: OptimizerConfig,
}

/// A walking penalty band: walks exceeding the walking radius by at most
/// `beyond_radius_m` meters are scaled by `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WalkPenaltyBand {
    pub beyond_radius_m: f64,
    pub multiplier: f64,
}

/// Parameters for per-query graph construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Walking speed in meters per second.
    pub walk_speed_mps: f64,

    /// Average in-vehicle speed in meters per second.
    pub transit_speed_mps: f64,

    /// Boarding or alighting time at a station (seconds).
    pub boarding_secs: f64,

    /// Fixed part of the time to change lines at an interchange (seconds).
    pub interchange_base_secs: f64,

    /// Extra interchange time per line serving the station (seconds).
    pub interchange_per_line_secs: f64,

    /// Endpoints connect to every station within this radius (meters).
    pub walk_radius_m: f64,

    /// Absolute maximum walk to or from a station (meters).
    /// Beyond this an endpoint has no station nearby.
    pub max_walk_m: f64,

    /// Number of best-ranked access stations per endpoint that seed line
    /// selection.
    pub max_access_stations: usize,

    /// Endpoints with fewer station edges than this get backstop edges.
    pub min_endpoint_edges: usize,

    /// Number of nearest stations the backstop connects.
    pub backstop_stations: usize,

    /// How many interchange hops away from the endpoint lines to include
    /// further lines in the graph.
    pub line_expansion_hops: usize,

    /// Walk penalty bands past `walk_radius_m`, ascending by distance.
    pub walk_penalty_bands: Vec<WalkPenaltyBand>,

    /// Multiplier for walks beyond the last band.
    pub walk_penalty_max: f64,

    /// Search cost multiplier applied to walking edges.
    pub walk_cost_multiplier: f64,
}

impl GraphConfig {
    /// Penalty multiplier for a walk of `distance` meters.
    ///
    /// Walks within `walk_radius_m` are unpenalized; the bands apply to the
    /// excess.
    pub fn walk_penalty(&self, distance: f64) -> f64 {
        let excess = distance - self.walk_radius_m;
        if excess <= 0.0 {
            return 1.0;
        }
        self.walk_penalty_bands
            .iter()
            .find(|band| excess <= band.beyond_radius_m)
            .map_or(self.walk_penalty_max, |band| band.multiplier)
    }

    /// Penalized walking time for `distance` meters, in seconds.
    pub fn walk_duration(&self, distance: f64) -> f64 {
        distance / self.walk_speed_mps * self.walk_penalty(distance)
    }

    /// Time to change lines at a station served by `lines` lines (seconds).
    pub fn interchange_secs(&self, lines: usize) -> f64 {
        self.interchange_base_secs + lines as f64 * self.interchange_per_line_secs
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            walk_speed_mps: 1.4,
            transit_speed_mps: 9.0,
            boarding_secs: 120.0,
            interchange_base_secs: 90.0,
            interchange_per_line_secs: 30.0,
            walk_radius_m: 1000.0,
            max_walk_m: 5000.0,
            max_access_stations: 8,
            min_endpoint_edges: 2,
            backstop_stations: 3,
            line_expansion_hops: 1,
            walk_penalty_bands: vec![
                WalkPenaltyBand {
                    beyond_radius_m: 500.0,
                    multiplier: 1.1,
                },
                WalkPenaltyBand {
                    beyond_radius_m: 1500.0,
                    multiplier: 1.5,
                },
                WalkPenaltyBand {
                    beyond_radius_m: 2500.0,
                    multiplier: 2.0,
                },
            ],
            walk_penalty_max: 3.0,
            walk_cost_multiplier: 1.0,
        }
    }
}

/// Parameters for the diversified path search.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hard cap on shortest-path runs per query.
    pub max_iterations: usize,

    /// Paths more similar than this to an accepted path are rejected.
    pub similarity_threshold: f64,

    /// Stop after this many consecutive rejected paths.
    pub max_consecutive_similar: usize,

    /// Factor applied to an edge's weight each time a path uses it.
    pub reuse_penalty: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 6,
            similarity_threshold: 0.7,
            max_consecutive_similar: 2,
            reuse_penalty: 2.0,
        }
    }
}

/// Parameters for route scoring.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points deducted per transfer count; the last entry applies beyond.
    pub transfer_penalties: Vec<f64>,

    /// Walking distance thresholds (meters) for scores 100, 80, 60, 35, 0.
    pub walk_excellent_m: f64,
    pub walk_good_m: f64,
    pub walk_acceptable_m: f64,
    pub walk_fair_m: f64,
    pub walk_poor_m: f64,

    /// Weight of the transfer score in the ranking score.
    pub transfer_weight: f64,

    /// Weight of the walking score in the ranking score.
    pub walking_weight: f64,

    /// Comfort points lost per intermediate stop.
    pub comfort_stop_penalty: f64,

    /// Cap on comfort points lost to stops.
    pub comfort_stop_penalty_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            transfer_penalties: vec![0.0, 20.0, 45.0, 70.0, 90.0],
            walk_excellent_m: 300.0,
            walk_good_m: 600.0,
            walk_acceptable_m: 1000.0,
            walk_fair_m: 1600.0,
            walk_poor_m: 2500.0,
            transfer_weight: 0.6,
            walking_weight: 0.4,
            comfort_stop_penalty: 1.5,
            comfort_stop_penalty_cap: 30.0,
        }
    }
}

/// Parameters for filtering and ranking the final route list.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Routes slower than this multiple of the fastest are dropped.
    pub duration_multiplier: f64,

    /// Absolute cap on transfers.
    pub max_transfers: usize,

    /// Walk-only routes longer than this (meters) count as long walks.
    pub long_walk_m: f64,

    /// A long walk is dropped unless it is within this multiple of a transit
    /// route's duration.
    pub long_walk_ratio: f64,

    /// Maximum corridor similarity between two returned routes.
    pub similarity_threshold: f64,

    /// Trips shorter than this (meters) are very short.
    pub very_short_trip_m: f64,

    /// Trips at least this long (meters) are long.
    pub long_trip_m: f64,

    /// For short and medium trips the walk is placed first when within this
    /// multiple of the best duration.
    pub walk_first_ratio: f64,

    /// For long trips the walk is appended only when faster than this
    /// fraction of the best duration.
    pub long_trip_walk_ratio: f64,

    /// Maximum number of routes returned.
    pub max_routes: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            duration_multiplier: 2.0,
            max_transfers: 3,
            long_walk_m: 2000.0,
            long_walk_ratio: 1.8,
            similarity_threshold: 0.7,
            very_short_trip_m: 800.0,
            long_trip_m: 3000.0,
            walk_first_ratio: 1.1,
            long_trip_walk_ratio: 0.8,
            max_routes: 5,
        }
    }
}
