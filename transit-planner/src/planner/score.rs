//! Route scoring.
//!
//! All scores are on a 0-100 scale, higher is better. Scoring is pure: it
//! reads a route and the configuration and never mutates either.

use crate::domain::{Ride, Route, Segment};

use super::config::ScoringConfig;

/// Comfort of a route with no transit segment.
pub const NEUTRAL_COMFORT: f64 = 50.0;

/// Comfort points lost for a line's headway: (max headway in minutes, penalty).
const HEADWAY_PENALTIES: [(u32, f64); 3] = [(5, 0.0), (10, 10.0), (20, 20.0)];

/// Penalty for headways beyond the last entry above.
const HEADWAY_PENALTY_MAX: f64 = 30.0;

/// Sub-scores of a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteScore {
    pub transfer: f64,
    pub walking: f64,
    pub ranking: f64,
    pub comfort: f64,
}

/// Scores routes against a [`ScoringConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RouteScorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> RouteScorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, route: &Route) -> RouteScore {
        RouteScore {
            transfer: self.transfer_score(route.transfers()),
            walking: self.walking_score(route.walking_distance() as f64),
            ranking: self.ranking_score(route),
            comfort: self.comfort_score(route),
        }
    }

    /// `100 - penalty`, the penalty looked up by transfer count with the
    /// last table entry applying to anything beyond.
    pub fn transfer_score(&self, transfers: usize) -> f64 {
        let table = &self.config.transfer_penalties;
        let penalty = table
            .get(transfers)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(0.0);
        (100.0 - penalty).clamp(0.0, 100.0)
    }

    /// Piecewise-linear score of a total walking distance in meters.
    pub fn walking_score(&self, distance: f64) -> f64 {
        let c = self.config;
        let points = [
            (c.walk_excellent_m, 100.0),
            (c.walk_good_m, 80.0),
            (c.walk_acceptable_m, 60.0),
            (c.walk_fair_m, 35.0),
            (c.walk_poor_m, 0.0),
        ];

        if distance <= points[0].0 {
            return 100.0;
        }
        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if distance <= x1 {
                if x1 <= x0 {
                    return y1;
                }
                return y0 + (distance - x0) / (x1 - x0) * (y1 - y0);
            }
        }
        0.0
    }

    /// Weighted blend of the transfer and walking scores, clamped to 0-100.
    pub fn ranking_score(&self, route: &Route) -> f64 {
        let transfer = self.transfer_score(route.transfers());
        let walking = self.walking_score(route.walking_distance() as f64);
        (transfer * self.config.transfer_weight + walking * self.config.walking_weight)
            .clamp(0.0, 100.0)
    }

    /// Duration-weighted comfort of the transit segments.
    pub fn comfort_score(&self, route: &Route) -> f64 {
        let rides: Vec<&Ride> = route
            .segments()
            .iter()
            .filter_map(Segment::as_ride)
            .collect();
        if rides.is_empty() {
            return NEUTRAL_COMFORT;
        }

        let total: f64 = rides.iter().map(|r| r.duration as f64).sum();
        if total <= 0.0 {
            let sum: f64 = rides.iter().map(|r| self.ride_comfort(r)).sum();
            return sum / rides.len() as f64;
        }
        rides
            .iter()
            .map(|r| self.ride_comfort(r) * r.duration as f64)
            .sum::<f64>()
            / total
    }

    /// Comfort of one ride: frequent lines and few stops score higher.
    pub fn ride_comfort(&self, ride: &Ride) -> f64 {
        let stops = (ride.stops() as f64 * self.config.comfort_stop_penalty)
            .min(self.config.comfort_stop_penalty_cap);
        (100.0 - headway_penalty(ride.line.frequency) - stops).clamp(0.0, 100.0)
    }
}

fn headway_penalty(frequency: u32) -> f64 {
    HEADWAY_PENALTIES
        .iter()
        .find(|(max, _)| frequency <= *max)
        .map_or(HEADWAY_PENALTY_MAX, |(_, penalty)| *penalty)
}
