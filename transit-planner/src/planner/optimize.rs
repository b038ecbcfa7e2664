//! Final route selection.
//!
//! Turns the raw candidate list from path search into the short, ranked list
//! returned to callers:
//!
//! 1. drop empty and duplicate routes, assign ids
//! 2. set aside the pure-walk routes
//! 3. quality filter with a fallback so the list is never emptied
//! 4. rank, with the fastest, fewest-transfer and most comfortable routes first
//! 5. diversity pass over corridor similarity
//! 6. re-integrate the walk depending on trip length
//! 7. truncate

use std::collections::HashSet;

use tracing::{debug, trace};
use twox_hash::XxHash64;

use crate::domain::Route;

use super::config::OptimizerConfig;
use super::score::RouteScorer;

/// Trip length classes driving walk re-integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripClass {
    VeryShort,
    Medium,
    Long,
}

impl TripClass {
    pub fn classify(distance: f64, config: &OptimizerConfig) -> Self {
        if distance < config.very_short_trip_m {
            TripClass::VeryShort
        } else if distance < config.long_trip_m {
            TripClass::Medium
        } else {
            TripClass::Long
        }
    }
}

/// Seed for route id hashing. Changing it changes every id.
const ROUTE_ID_SEED: u64 = 0;

/// Stable id derived from a route's shape.
///
/// Hashed with a fixed seed, so ids are the same across builds.
pub fn route_id(route: &Route) -> String {
    let hash = XxHash64::oneshot(ROUTE_ID_SEED, route.signature().as_bytes());
    format!("route-{hash:016x}")
}

/// Filters and ranks candidate routes.
pub struct RouteOptimizer<'a> {
    config: &'a OptimizerConfig,
    scorer: RouteScorer<'a>,
}

impl<'a> RouteOptimizer<'a> {
    pub fn new(config: &'a OptimizerConfig, scorer: RouteScorer<'a>) -> Self {
        Self { config, scorer }
    }

    /// Select the final routes for a trip of `trip_distance` meters.
    ///
    /// Never fails: as long as `candidates` is non-empty, so is the result.
    pub fn optimize(&self, candidates: Vec<Route>, trip_distance: f64) -> Vec<Route> {
        let first_raw = candidates.first().cloned().map(with_id);
        let raw_count = candidates.len();

        let prepared = prepare(candidates);
        let (walks, others): (Vec<Route>, Vec<Route>) =
            prepared.into_iter().partition(Route::is_direct_walk);

        let survivors = self.quality_filter(&others);
        let walk = walks.into_iter().min_by_key(Route::total_duration);
        let ranked = self.rank(survivors);

        let class = TripClass::classify(trip_distance, self.config);
        let selected = self.diversify(&ranked, class, self.config.max_routes.max(1));

        let routes = self.reintegrate_walk(selected, walk, &ranked, &others, class);
        let mut routes = fit_to_cap(routes, self.config.max_routes);

        if routes.is_empty()
            && let Some(first) = first_raw
        {
            routes.push(first);
        }

        debug!(
            candidates = raw_count,
            returned = routes.len(),
            ?class,
            trip_distance,
            "Optimized routes"
        );
        routes
    }

    /// Duration, transfer and long-walk filters over the non-walk routes.
    pub fn quality_filter(&self, routes: &[Route]) -> Vec<Route> {
        let Some(fastest) = routes.iter().map(Route::total_duration).min() else {
            return Vec::new();
        };
        let min_transfers = routes.iter().map(Route::transfers).min().unwrap_or(0);
        let slack = if min_transfers < 2 { 2 } else { 1 };
        let max_transfers = self.config.max_transfers.min(min_transfers + slack);
        let max_duration = self.config.duration_multiplier * fastest as f64;

        let kept: Vec<Route> = routes
            .iter()
            .filter(|r| r.total_duration() as f64 <= max_duration)
            .filter(|r| r.transfers() <= max_transfers)
            .filter(|r| !self.is_dominated_long_walk(r, routes))
            .cloned()
            .collect();

        trace!(
            before = routes.len(),
            after = kept.len(),
            fastest,
            max_transfers,
            "Quality filter"
        );

        if !kept.is_empty() {
            return kept;
        }
        routes
            .iter()
            .min_by_key(|r| r.total_duration())
            .or_else(|| routes.iter().find(|r| r.has_transit()))
            .or_else(|| routes.first())
            .cloned()
            .into_iter()
            .collect()
    }

    /// A long walk-only route is dropped when some transit route exists and
    /// the walk is not within the long-walk ratio of it.
    fn is_dominated_long_walk(&self, route: &Route, all: &[Route]) -> bool {
        if !route.is_walk_only() || (route.walking_distance() as f64) <= self.config.long_walk_m {
            return false;
        }
        let Some(best_transit) = all
            .iter()
            .filter(|r| r.has_transit())
            .map(Route::total_duration)
            .min()
        else {
            return false;
        };
        route.total_duration() as f64 > self.config.long_walk_ratio * best_transit as f64
    }

    /// Sort by ranking score, then move the priority routes to the front.
    pub fn rank(&self, routes: Vec<Route>) -> Vec<Route> {
        let mut scored: Vec<(f64, f64, Route)> = routes
            .into_iter()
            .map(|route| {
                let score = self.scorer.score(&route);
                (score.ranking, score.comfort, route)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.2.total_duration().cmp(&b.2.total_duration()))
        });

        let fastest = scored
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, _, r))| r.total_duration())
            .map(|(i, _)| i);
        let fewest_transfers = scored
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, _, r))| (r.transfers(), r.total_duration()))
            .map(|(i, _)| i);
        let most_comfortable = scored
            .iter()
            .enumerate()
            .max_by(|(i, a), (j, b)| a.1.total_cmp(&b.1).then_with(|| j.cmp(i)))
            .map(|(i, _)| i);

        let mut order: Vec<usize> = Vec::with_capacity(scored.len());
        for i in [fastest, fewest_transfers, most_comfortable]
            .into_iter()
            .flatten()
        {
            if !order.contains(&i) {
                order.push(i);
            }
        }
        for i in 0..scored.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }

        let mut slots: Vec<Option<Route>> = scored.into_iter().map(|(_, _, r)| Some(r)).collect();
        order
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .collect()
    }

    /// Greedy selection keeping corridors distinct.
    pub fn diversify(&self, ranked: &[Route], class: TripClass, cap: usize) -> Vec<Route> {
        let Some(top) = ranked.first() else {
            return Vec::new();
        };
        let mut selected = vec![top.clone()];

        if class != TripClass::VeryShort
            && let Some(opposite) = ranked
                .iter()
                .skip(1)
                .find(|r| r.is_walk_only() != top.is_walk_only())
            && selected.len() < cap
        {
            selected.push(opposite.clone());
        }

        for route in ranked.iter().skip(1) {
            if selected.len() >= cap {
                break;
            }
            if selected.iter().any(|s| s.id == route.id) {
                continue;
            }
            let distinct = selected
                .iter()
                .all(|s| s.similarity(route) <= self.config.similarity_threshold);
            if distinct {
                selected.push(route.clone());
            }
        }
        selected
    }

    fn reintegrate_walk(
        &self,
        mut selected: Vec<Route>,
        walk: Option<Route>,
        ranked: &[Route],
        others: &[Route],
        class: TripClass,
    ) -> Vec<Route> {
        match class {
            TripClass::Long => {
                if !selected.iter().any(Route::has_transit)
                    && let Some(transit) = ranked
                        .iter()
                        .chain(others.iter())
                        .find(|r| r.has_transit())
                {
                    selected.insert(0, transit.clone());
                }
                let Some(walk) = walk else {
                    return selected;
                };
                let has_transit = selected.iter().any(Route::has_transit);
                let best = selected.iter().map(Route::total_duration).min();
                let competitive = best.is_some_and(|best| {
                    (walk.total_duration() as f64) < self.config.long_trip_walk_ratio * best as f64
                });
                if competitive || !has_transit {
                    selected.push(walk);
                }
            }
            TripClass::VeryShort | TripClass::Medium => {
                let Some(walk) = walk else {
                    return selected;
                };
                match selected.iter().map(Route::total_duration).min() {
                    None => selected.push(walk),
                    Some(best)
                        if walk.total_duration() as f64
                            <= self.config.walk_first_ratio * best as f64 =>
                    {
                        selected.insert(0, walk)
                    }
                    Some(_) => selected.push(walk),
                }
            }
        }
        selected
    }
}

/// Drop empty and duplicate routes, assign ids.
fn prepare(candidates: Vec<Route>) -> Vec<Route> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|r| r.total_duration() > 0)
        .filter(|r| seen.insert(r.signature()))
        .map(with_id)
        .collect()
}

/// Truncate to `cap`, dropping the lowest-ranked non-walk routes first so a
/// re-integrated walk keeps its place.
fn fit_to_cap(mut routes: Vec<Route>, cap: usize) -> Vec<Route> {
    while routes.len() > cap {
        match routes.iter().rposition(|r| !r.is_direct_walk()) {
            Some(i) => {
                routes.remove(i);
            }
            None => routes.truncate(cap),
        }
    }
    routes
}

fn with_id(route: Route) -> Route {
    if route.id.is_empty() {
        let id = route_id(&route);
        route.with_id(id)
    } else {
        route
    }
}
