//! Per-query graph construction.
//!
//! For each query we build a small directed graph over the stations and lines
//! relevant to the two endpoints:
//!
//! - a `Physical` node per station and a `Virtual` node per (station, line),
//!   joined by boarding/alighting `Transfer` edges;
//! - `Transit` edges between every pair of stations on a line, so search can
//!   skip stops, with a cost multiplier that grows with the number skipped;
//! - `Transfer` edges between the virtual nodes of an interchange, so a line
//!   change is charged only when the line actually changes;
//! - `Walking` edges from the origin and to the destination, plus a direct
//!   origin-destination walk that keeps the graph routable.
//!
//! The graph is owned by the request that built it and dropped after path
//! extraction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::domain::{Coordinates, LineId, Station, StationId, TransitLine};
use crate::stations::StationIndex;

use super::config::GraphConfig;

/// One of the two query points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Origin,
    Destination,
}

/// A node of the query graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    /// Standing at a station, not on any vehicle.
    Physical(StationId),
    /// At a station while riding a given line.
    Virtual(StationId, LineId),
    /// The query origin or destination.
    Endpoint(Endpoint),
}

/// An edge of the query graph. Durations are seconds, distances meters.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEdge {
    Transit {
        line: LineId,
        /// Position of the departure station on the line.
        from_pos: usize,
        /// Position of the arrival station on the line.
        to_pos: usize,
        duration: f64,
        distance: f64,
        cost_multiplier: f64,
    },
    Transfer {
        duration: f64,
    },
    Walking {
        duration: f64,
        distance: f64,
        cost_multiplier: f64,
    },
}

impl GraphEdge {
    /// User-facing duration of this edge.
    pub fn duration(&self) -> f64 {
        match self {
            GraphEdge::Transit { duration, .. }
            | GraphEdge::Transfer { duration }
            | GraphEdge::Walking { duration, .. } => *duration,
        }
    }

    /// Multiplier biasing search cost without changing the duration.
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            GraphEdge::Transit {
                cost_multiplier, ..
            }
            | GraphEdge::Walking {
                cost_multiplier, ..
            } => *cost_multiplier,
            GraphEdge::Transfer { .. } => 1.0,
        }
    }

    /// Search cost before any diversification penalty.
    pub fn base_cost(&self) -> f64 {
        self.duration() * self.cost_multiplier()
    }
}

/// Cost multiplier for a transit edge spanning `hops` consecutive stops.
pub fn skip_cost_multiplier(hops: usize) -> f64 {
    if hops <= 1 {
        1.0
    } else {
        (hops as f64).log2() + 1.0
    }
}

/// The graph built for one query.
#[derive(Debug)]
pub struct TransitGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    nodes: HashMap<GraphNode, NodeIndex>,
    lines: HashMap<LineId, Arc<TransitLine>>,
    origin: NodeIndex,
    destination: NodeIndex,
    direct_walk: EdgeIndex,
}

impl TransitGraph {
    pub fn graph(&self) -> &DiGraph<GraphNode, GraphEdge> {
        &self.graph
    }

    pub fn origin(&self) -> NodeIndex {
        self.origin
    }

    pub fn destination(&self) -> NodeIndex {
        self.destination
    }

    /// The origin-to-destination walking edge.
    pub fn direct_walk(&self) -> EdgeIndex {
        self.direct_walk
    }

    /// Look up a node by value.
    pub fn node(&self, node: &GraphNode) -> Option<NodeIndex> {
        self.nodes.get(node).copied()
    }

    /// A line included in this graph.
    pub fn line(&self, id: &LineId) -> Option<&Arc<TransitLine>> {
        self.lines.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of walking edges joining an endpoint to stations.
    pub fn station_edge_count(&self, endpoint: Endpoint) -> usize {
        let (node, direction) = match endpoint {
            Endpoint::Origin => (self.origin, Direction::Outgoing),
            Endpoint::Destination => (self.destination, Direction::Incoming),
        };
        self.graph
            .edges_directed(node, direction)
            .filter(|edge| edge.id() != self.direct_walk)
            .filter(|edge| {
                let other = if direction == Direction::Outgoing {
                    edge.target()
                } else {
                    edge.source()
                };
                matches!(self.graph[other], GraphNode::Physical(_))
            })
            .count()
    }
}

/// A station an endpoint walks to, with the walking distance.
struct AccessLink {
    station: Arc<Station>,
    distance: f64,
}

/// How an endpoint enters the network.
struct EndpointAccess {
    /// Walking edges to build.
    links: Vec<AccessLink>,
    /// Best-ranked stations whose lines seed relevant-line selection.
    seeds: Vec<StationId>,
}

/// Builds a [`TransitGraph`] per query.
pub struct GraphBuilder<'a> {
    index: &'a StationIndex,
    config: &'a GraphConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(index: &'a StationIndex, config: &'a GraphConfig) -> Self {
        Self { index, config }
    }

    /// Build the graph for a trip from `origin` to `destination`.
    pub fn build(&self, origin: &Coordinates, destination: &Coordinates) -> TransitGraph {
        let origin_access = self.endpoint_access(origin, Endpoint::Origin);
        let destination_access = self.endpoint_access(destination, Endpoint::Destination);

        let seeds = origin_access
            .seeds
            .iter()
            .chain(destination_access.seeds.iter());
        let lines = self.relevant_lines(seeds);
        let (origin_links, destination_links) = (origin_access.links, destination_access.links);

        let mut state = BuildState::default();

        // Stations, virtual nodes and boarding edges.
        let mut lines_in_graph: HashMap<StationId, Vec<LineId>> = HashMap::new();
        for line in &lines {
            for station in &line.stations {
                let physical = state.node(GraphNode::Physical(station.id.clone()));
                let key = GraphNode::Virtual(station.id.clone(), line.id.clone());
                if state.nodes.contains_key(&key) {
                    continue;
                }
                let virtual_node = state.node(key);
                state.add_both(
                    physical,
                    virtual_node,
                    GraphEdge::Transfer {
                        duration: self.config.boarding_secs,
                    },
                );
                lines_in_graph
                    .entry(station.id.clone())
                    .or_default()
                    .push(line.id.clone());
            }
        }

        // Transit edges between every ordered pair of stations on a line.
        for line in &lines {
            self.add_line_edges(&mut state, line);
        }

        // Interchange edges between the virtual nodes of a station.
        let mut seen = HashSet::new();
        for station in lines.iter().flat_map(|line| line.stations.iter()) {
            if !seen.insert(&station.id) {
                continue;
            }
            let Some(here) = lines_in_graph.get(&station.id) else {
                continue;
            };
            if here.len() < 2 {
                continue;
            }
            let duration = self
                .config
                .interchange_secs(self.index.lines_at(&station.id).len());
            for (i, a) in here.iter().enumerate() {
                for b in &here[i + 1..] {
                    let va = state.node(GraphNode::Virtual(station.id.clone(), a.clone()));
                    let vb = state.node(GraphNode::Virtual(station.id.clone(), b.clone()));
                    state.add_both(va, vb, GraphEdge::Transfer { duration });
                }
            }
        }

        // Endpoints.
        let origin_node = state.node(GraphNode::Endpoint(Endpoint::Origin));
        let destination_node = state.node(GraphNode::Endpoint(Endpoint::Destination));

        for link in &origin_links {
            let station = state.node(GraphNode::Physical(link.station.id.clone()));
            state.graph.add_edge(origin_node, station, self.walking_edge(link.distance));
        }
        for link in &destination_links {
            let station = state.node(GraphNode::Physical(link.station.id.clone()));
            state
                .graph
                .add_edge(station, destination_node, self.walking_edge(link.distance));
        }

        let direct_distance = origin.distance_to(destination);
        let direct_walk =
            state
                .graph
                .add_edge(origin_node, destination_node, self.walking_edge(direct_distance));
        state
            .graph
            .add_edge(destination_node, origin_node, self.walking_edge(direct_distance));

        debug!(
            lines = lines.len(),
            nodes = state.graph.node_count(),
            edges = state.graph.edge_count(),
            origin_links = origin_links.len(),
            destination_links = destination_links.len(),
            direct_distance,
            "Built query graph"
        );

        TransitGraph {
            graph: state.graph,
            nodes: state.nodes,
            lines: lines
                .into_iter()
                .map(|line| (line.id.clone(), line))
                .collect(),
            origin: origin_node,
            destination: destination_node,
            direct_walk,
        }
    }

    /// Walking links for an endpoint: every station within the standard
    /// radius, topped up by the connectivity backstop. Line selection is
    /// seeded from the best-ranked accessible stations only.
    fn endpoint_access(&self, point: &Coordinates, endpoint: Endpoint) -> EndpointAccess {
        let radius = self.config.walk_radius_m;
        let mut seeds: Vec<StationId> = self
            .index
            .find_accessible_stations(point, self.config.max_access_stations, radius, None)
            .into_iter()
            .filter(|access| access.distance <= radius)
            .map(|access| access.station.id.clone())
            .collect();

        let mut links: Vec<AccessLink> = self
            .index
            .find_nearest_stations(point, usize::MAX, radius)
            .into_iter()
            .map(|nearby| AccessLink {
                station: nearby.station,
                distance: nearby.distance,
            })
            .collect();

        if links.len() < self.config.min_endpoint_edges {
            let nearest = self.index.find_nearest_stations(
                point,
                self.config.backstop_stations,
                self.config.max_walk_m,
            );
            for nearby in nearest {
                if links.iter().any(|l| l.station.id == nearby.station.id) {
                    continue;
                }
                debug!(
                    ?endpoint,
                    station = %nearby.station.id,
                    distance = nearby.distance,
                    "Backstop walking link"
                );
                seeds.push(nearby.station.id.clone());
                links.push(AccessLink {
                    station: nearby.station,
                    distance: nearby.distance,
                });
            }
        }

        EndpointAccess { links, seeds }
    }

    /// Lines serving the seed stations, expanded through interchanges.
    fn relevant_lines<'s>(
        &self,
        seeds: impl Iterator<Item = &'s StationId>,
    ) -> Vec<Arc<TransitLine>> {
        let mut selected = Vec::new();
        let mut seen: HashSet<LineId> = HashSet::new();
        let mut frontier: Vec<LineId> = seeds
            .flat_map(|station| self.index.lines_at(station).iter().cloned())
            .collect();

        for hop in 0..=self.config.line_expansion_hops {
            let mut next = Vec::new();
            for line_id in frontier {
                if !seen.insert(line_id.clone()) {
                    continue;
                }
                let Some(line) = self.index.line(&line_id) else {
                    continue;
                };
                if hop < self.config.line_expansion_hops {
                    for station in &line.stations {
                        next.extend(
                            self.index
                                .lines_at(&station.id)
                                .iter()
                                .filter(|other| !seen.contains(*other))
                                .cloned(),
                        );
                    }
                }
                selected.push(Arc::clone(line));
            }
            frontier = next;
        }

        selected
    }

    fn add_line_edges(&self, state: &mut BuildState, line: &TransitLine) {
        let stations = &line.stations;
        for i in 0..stations.len() {
            for j in (i + 1)..stations.len() {
                let (a, b) = (&stations[i], &stations[j]);
                if a.id == b.id {
                    continue;
                }
                let distance = a.coordinates.distance_to(&b.coordinates);
                let duration = distance / self.config.transit_speed_mps;
                let cost_multiplier = skip_cost_multiplier(j - i);

                let va = state.node(GraphNode::Virtual(a.id.clone(), line.id.clone()));
                let vb = state.node(GraphNode::Virtual(b.id.clone(), line.id.clone()));
                let edge = |from_pos, to_pos| GraphEdge::Transit {
                    line: line.id.clone(),
                    from_pos,
                    to_pos,
                    duration,
                    distance,
                    cost_multiplier,
                };
                state.graph.add_edge(va, vb, edge(i, j));
                state.graph.add_edge(vb, va, edge(j, i));
            }
        }
    }

    fn walking_edge(&self, distance: f64) -> GraphEdge {
        GraphEdge::Walking {
            duration: self.config.walk_duration(distance),
            distance,
            cost_multiplier: self.config.walk_cost_multiplier,
        }
    }
}

#[derive(Default)]
struct BuildState {
    graph: DiGraph<GraphNode, GraphEdge>,
    nodes: HashMap<GraphNode, NodeIndex>,
}

impl BuildState {
    /// Get or create the node for `node`.
    fn node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&index) = self.nodes.get(&node) {
            return index;
        }
        let index = self.graph.add_node(node.clone());
        self.nodes.insert(node, index);
        index
    }

    fn add_both(&mut self, a: NodeIndex, b: NodeIndex, edge: GraphEdge) {
        self.graph.add_edge(a, b, edge.clone());
        self.graph.add_edge(b, a, edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::test_network::{self, east};

    fn edges_between(graph: &TransitGraph, a: &GraphNode, b: &GraphNode) -> Vec<GraphEdge> {
        let (Some(a), Some(b)) = (graph.node(a), graph.node(b)) else {
            return Vec::new();
        };
        graph
            .graph()
            .edges_connecting(a, b)
            .map(|e| e.weight().clone())
            .collect()
    }

    fn physical(id: &str) -> GraphNode {
        GraphNode::Physical(StationId::new(id))
    }

    fn virtual_node(id: &str, line: &str) -> GraphNode {
        GraphNode::Virtual(StationId::new(id), LineId::new(line))
    }

    #[test]
    fn skip_multiplier() {
        assert_eq!(skip_cost_multiplier(1), 1.0);
        assert_eq!(skip_cost_multiplier(2), 2.0);
        assert_eq!(skip_cost_multiplier(4), 3.0);
        assert!(skip_cost_multiplier(3) > 2.0 && skip_cost_multiplier(3) < 3.0);
    }

    #[test]
    fn edge_accessors() {
        let transit = GraphEdge::Transit {
            line: LineId::new("L"),
            from_pos: 0,
            to_pos: 2,
            duration: 100.0,
            distance: 900.0,
            cost_multiplier: 2.0,
        };
        assert_eq!(transit.duration(), 100.0);
        assert_eq!(transit.base_cost(), 200.0);

        let transfer = GraphEdge::Transfer { duration: 60.0 };
        assert_eq!(transfer.cost_multiplier(), 1.0);
        assert_eq!(transfer.base_cost(), 60.0);
    }

    #[test]
    fn builds_nodes_and_edges_for_a_line() {
        let index = test_network::straight_line();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        // Straight line L: S0..S4, 1 km apart, along the parallel.
        let graph = builder.build(&east(0.0), &east(4000.0));

        // 5 physical + 5 virtual + 2 endpoints.
        assert_eq!(graph.node_count(), 12);
        for i in 0..5 {
            let id = format!("S{i}");
            assert!(graph.node(&physical(&id)).is_some());
            let boarding = edges_between(&graph, &physical(&id), &virtual_node(&id, "L"));
            assert_eq!(boarding, vec![GraphEdge::Transfer { duration: 120.0 }]);
        }

        // Adjacent stops: multiplier 1. Skipping: log2(hops) + 1.
        let adjacent = edges_between(&graph, &virtual_node("S0", "L"), &virtual_node("S1", "L"));
        assert_eq!(adjacent.len(), 1);
        let GraphEdge::Transit {
            cost_multiplier,
            duration,
            from_pos,
            to_pos,
            ..
        } = &adjacent[0]
        else {
            panic!("expected transit edge");
        };
        assert_eq!(*cost_multiplier, 1.0);
        assert_eq!((*from_pos, *to_pos), (0, 1));
        assert!((duration - 1000.0 / 9.0).abs() < 1.0);

        let skip = edges_between(&graph, &virtual_node("S4", "L"), &virtual_node("S0", "L"));
        let GraphEdge::Transit {
            cost_multiplier,
            from_pos,
            to_pos,
            ..
        } = &skip[0]
        else {
            panic!("expected transit edge");
        };
        assert_eq!(*cost_multiplier, 3.0);
        assert_eq!((*from_pos, *to_pos), (4, 0));
    }

    #[test]
    fn interchange_transfer_edges() {
        let index = test_network::two_lines_one_interchange();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        let graph = builder.build(&test_network::west_of_a(), &test_network::north_of_b());

        let change = edges_between(&graph, &virtual_node("X", "A"), &virtual_node("X", "B"));
        assert_eq!(change, vec![GraphEdge::Transfer { duration: 150.0 }]);
        let back = edges_between(&graph, &virtual_node("X", "B"), &virtual_node("X", "A"));
        assert_eq!(back.len(), 1);

        // Non-interchange stations have a single virtual node.
        assert!(graph.node(&virtual_node("A1", "B")).is_none());
    }

    #[test]
    fn endpoints_connect_within_walk_radius() {
        let index = test_network::straight_line();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        // Origin 200 m west of S0: S0 (200 m) and S1 (1200 m, outside radius).
        let graph = builder.build(&east(-200.0), &east(4000.0));

        let to_s0 = edges_between(
            &graph,
            &GraphNode::Endpoint(Endpoint::Origin),
            &physical("S0"),
        );
        assert_eq!(to_s0.len(), 1);
        let GraphEdge::Walking {
            duration, distance, ..
        } = &to_s0[0]
        else {
            panic!("expected walking edge");
        };
        assert!((distance - 200.0).abs() < 1.0);
        assert!((duration - distance / 1.4).abs() < 1e-9);

        // S1 joined only through the backstop (origin had one in-radius station).
        assert!(graph.station_edge_count(Endpoint::Origin) >= 2);
    }

    #[test]
    fn every_station_in_radius_gets_a_walking_edge() {
        // 12 stations 80 m apart from the origin eastwards: all within 1 km.
        let stations: Vec<(String, Coordinates)> = (0..12)
            .map(|i| (format!("D{i}"), east(i as f64 * 80.0)))
            .collect();
        let refs: Vec<(&str, Coordinates)> =
            stations.iter().map(|(id, c)| (id.as_str(), *c)).collect();
        let index = test_network::index(vec![test_network::line("D", 5, &refs)]);
        let config = GraphConfig::default();
        assert!(config.max_access_stations < 12);

        let graph = GraphBuilder::new(&index, &config).build(&east(0.0), &east(8000.0));

        assert_eq!(graph.station_edge_count(Endpoint::Origin), 12);
        for (id, _) in &stations {
            let origin = GraphNode::Endpoint(Endpoint::Origin);
            let edges = edges_between(&graph, &origin, &physical(id));
            assert_eq!(edges.len(), 1, "origin to {id}");
        }
    }

    #[test]
    fn direct_walk_edge_always_present() {
        let index = test_network::straight_line();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        let graph = builder.build(&east(1500.0), &east(1700.0));

        let direct = graph.graph().edge_weight(graph.direct_walk()).unwrap();
        let GraphEdge::Walking { distance, .. } = direct else {
            panic!("expected walking edge");
        };
        assert!((distance - 200.0).abs() < 1.0);
        let (from, to) = graph.graph().edge_endpoints(graph.direct_walk()).unwrap();
        assert_eq!(from, graph.origin());
        assert_eq!(to, graph.destination());
    }

    #[test]
    fn unroutable_area_still_has_direct_walk() {
        let index = test_network::straight_line();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        // 50 km away from any station.
        let far = east(50_000.0);
        let graph = builder.build(&far, &east(50_300.0));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.station_edge_count(Endpoint::Origin), 0);
    }

    #[test]
    fn backstop_walk_is_penalized() {
        let index = test_network::straight_line();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        // Origin 3 km west of S0: beyond the radius, within the max walk.
        let graph = builder.build(&east(-3000.0), &east(4000.0));

        let to_s0 = edges_between(
            &graph,
            &GraphNode::Endpoint(Endpoint::Origin),
            &physical("S0"),
        );
        let GraphEdge::Walking {
            duration, distance, ..
        } = &to_s0[0]
        else {
            panic!("expected walking edge");
        };
        assert!(*duration > distance / config.walk_speed_mps);
    }

    #[test]
    fn expansion_includes_lines_one_interchange_away() {
        let index = test_network::three_lines_chain();
        let config = GraphConfig::default();
        let builder = GraphBuilder::new(&index, &config);

        // Origin near line A only, destination near line C only; B joins them.
        let graph = builder.build(&test_network::near_a_start(), &test_network::near_c_end());
        assert!(graph.line(&LineId::new("A")).is_some());
        assert!(graph.line(&LineId::new("B")).is_some());
        assert!(graph.line(&LineId::new("C")).is_some());

        let narrow = GraphConfig {
            line_expansion_hops: 0,
            ..GraphConfig::default()
        };
        let builder = GraphBuilder::new(&index, &narrow);
        let graph = builder.build(&test_network::near_a_start(), &test_network::near_c_end());
        assert!(graph.line(&LineId::new("B")).is_none());
    }
}
