//! Multi-modal transit route planner.
//!
//! A web service that answers: "how do I get from this station, or a point
//! near it, to that one, walking and riding the network?"

pub mod cache;
pub mod domain;
pub mod planner;
pub mod stations;
pub mod web;
