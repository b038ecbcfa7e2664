//! The route planning service.
//!
//! `RoutePlanner` owns the station index and the route cache and runs the
//! full pipeline for a query:
//!
//! ```text
//! resolve endpoints -> build graph -> path search -> optimize -> cache
//! ```
//!
//! It is built once at startup and shared between request handlers.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::{CacheConfig, RouteCache};
use crate::domain::{Coordinates, Route, StationId};
use crate::stations::StationIndex;

use super::config::PlannerConfig;
use super::error::PlanError;
use super::graph::GraphBuilder;
use super::optimize::RouteOptimizer;
use super::score::RouteScorer;
use super::search::find_routes;

/// Route planner over a fixed network.
pub struct RoutePlanner {
    index: Arc<StationIndex>,
    cache: RouteCache,
    config: PlannerConfig,
}

impl RoutePlanner {
    pub fn new(index: Arc<StationIndex>, config: PlannerConfig, cache_config: &CacheConfig) -> Self {
        Self {
            index,
            cache: RouteCache::new(cache_config),
            config,
        }
    }

    pub fn index(&self) -> &StationIndex {
        &self.index
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Best routes between two stations, optionally from and to exact
    /// positions near them.
    ///
    /// Missing coordinates default to the station's own. Returns `None` when
    /// an endpoint cannot be resolved or has no station within walking
    /// distance; otherwise a non-empty, ranked list.
    pub async fn find_best_routes(
        &self,
        origin_station: &StationId,
        destination_station: &StationId,
        origin: Option<Coordinates>,
        destination: Option<Coordinates>,
    ) -> Option<Vec<Route>> {
        let endpoints = self
            .resolve(origin_station, origin)
            .and_then(|o| Ok((o, self.resolve(destination_station, destination)?)));
        let (origin, destination) = match endpoints {
            Ok(endpoints) => endpoints,
            Err(e) => {
                debug!(
                    origin = %origin_station,
                    destination = %destination_station,
                    error = %e,
                    "Cannot resolve endpoints"
                );
                return None;
            }
        };

        let key = self.cache.key(&origin, &destination);
        if let Some(entry) = self.cache.get(&key).await {
            trace!(?origin, ?destination, "Route cache hit");
            return Some(entry.routes.clone());
        }

        match self.plan(&origin, &destination) {
            Ok(routes) => {
                self.cache.set(key, routes.clone()).await;
                Some(routes)
            }
            Err(e) => {
                debug!(?origin, ?destination, error = %e, "No routes");
                None
            }
        }
    }

    /// Coordinates for an endpoint: the given ones, else the station's.
    pub fn resolve(
        &self,
        station: &StationId,
        coordinates: Option<Coordinates>,
    ) -> Result<Coordinates, PlanError> {
        match coordinates {
            Some(coordinates) => {
                coordinates.validate()?;
                Ok(coordinates)
            }
            None => self
                .index
                .station(station)
                .map(|s| s.coordinates)
                .ok_or_else(|| PlanError::UnknownStation(station.clone())),
        }
    }

    /// Plan between two points, bypassing the cache.
    pub fn plan(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> Result<Vec<Route>, PlanError> {
        self.ensure_station_nearby(origin)?;
        self.ensure_station_nearby(destination)?;

        let graph = GraphBuilder::new(&self.index, &self.config.graph).build(origin, destination);
        let candidates = find_routes(&graph, &self.config.search);
        drop(graph);

        let scorer = RouteScorer::new(&self.config.scoring);
        let optimizer = RouteOptimizer::new(&self.config.optimizer, scorer);
        let routes = optimizer.optimize(candidates, origin.distance_to(destination));

        // The direct walk keeps this from happening.
        if routes.is_empty() {
            return Err(PlanError::NoStationNearby {
                point: *origin,
                max_walk_m: self.config.graph.max_walk_m,
            });
        }
        Ok(routes)
    }

    fn ensure_station_nearby(&self, point: &Coordinates) -> Result<(), PlanError> {
        let max_walk_m = self.config.graph.max_walk_m;
        if self
            .index
            .find_nearest_stations(point, 1, max_walk_m)
            .is_empty()
        {
            return Err(PlanError::NoStationNearby {
                point: *point,
                max_walk_m,
            });
        }
        Ok(())
    }
}
