//! Multi-modal route planner.
//!
//! Answers: "how do I get from here to there on foot and by transit?"
//!
//! Each query builds a small graph around its two endpoints, runs a
//! diversified shortest-path search over it, then scores, filters and ranks
//! the candidates into a short list that always offers a sensible walking
//! alternative.

mod config;
mod error;
mod graph;
mod optimize;
mod score;
mod search;
mod service;

#[cfg(test)]
mod scenario_tests;
#[cfg(test)]
mod test_network;

pub use config::{
    GraphConfig, OptimizerConfig, PlannerConfig, ScoringConfig, SearchConfig, WalkPenaltyBand,
};
pub use error::PlanError;
pub use graph::{Endpoint, GraphBuilder, GraphEdge, GraphNode, TransitGraph, skip_cost_multiplier};
pub use optimize::{RouteOptimizer, TripClass, route_id};
pub use score::{NEUTRAL_COMFORT, RouteScore, RouteScorer};
pub use search::{EdgePenalties, direct_walk_route, find_routes, path_to_route, penalize};
pub use service::RoutePlanner;
