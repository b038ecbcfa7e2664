//! Diversified shortest-path search.
//!
//! Runs repeated shortest-path queries over a [`TransitGraph`]. After each
//! run, every edge of the extracted path has its weight multiplied by the
//! reuse penalty, pushing later runs onto other corridors. A path is only
//! kept when its station set is not too similar to an already kept one.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::astar;
use petgraph::graph::EdgeIndex;
use petgraph::visit::EdgeRef;
use tracing::{debug, trace};

use crate::domain::{LineId, Ride, Route, Segment, TransitLine, Walk};

use super::config::SearchConfig;
use super::error::PlanError;
use super::graph::{GraphEdge, TransitGraph};

/// Per-edge multipliers accumulated across search iterations.
pub type EdgePenalties = HashMap<EdgeIndex, f64>;

/// Multiply the penalty of every edge on `path` by `factor`.
pub fn penalize(penalties: &mut EdgePenalties, path: &[EdgeIndex], factor: f64) {
    for edge in path {
        *penalties.entry(*edge).or_insert(1.0) *= factor;
    }
}

/// Find a diverse set of candidate routes through `graph`.
///
/// The returned list always contains the direct walk. Routes appear in the
/// order they were found.
pub fn find_routes(graph: &TransitGraph, config: &SearchConfig) -> Vec<Route> {
    let mut penalties = EdgePenalties::new();
    let mut accepted: Vec<Route> = Vec::new();
    let mut consecutive_similar = 0;

    for iteration in 0..config.max_iterations {
        let Some(path) = shortest_path(graph, &penalties) else {
            debug!(iteration, "No path between endpoints");
            break;
        };
        penalize(&mut penalties, &path, config.reuse_penalty);

        let route = match path_to_route(graph, &path) {
            Ok(Some(route)) => route,
            Ok(None) => {
                trace!(iteration, "Dropping walk-only path through stations");
                continue;
            }
            Err(e) => {
                debug!(iteration, error = %e, "Dropping malformed path");
                continue;
            }
        };

        let similar = accepted
            .iter()
            .any(|kept| route.similarity(kept) > config.similarity_threshold);
        if similar {
            consecutive_similar += 1;
            trace!(iteration, consecutive_similar, "Rejected similar path");
            if consecutive_similar >= config.max_consecutive_similar {
                break;
            }
            continue;
        }

        consecutive_similar = 0;
        trace!(
            iteration,
            duration = route.total_duration(),
            transfers = route.transfers(),
            "Accepted path"
        );
        accepted.push(route);
    }

    if !accepted.iter().any(Route::is_direct_walk) {
        accepted.push(direct_walk_route(graph));
    }

    debug!(candidates = accepted.len(), "Path search finished");
    accepted
}

/// The pure-walk route between the endpoints.
pub fn direct_walk_route(graph: &TransitGraph) -> Route {
    let (duration, distance) = match graph.graph().edge_weight(graph.direct_walk()) {
        Some(GraphEdge::Walking {
            duration, distance, ..
        }) => (*duration, *distance),
        _ => (0.0, 0.0),
    };
    Route::direct_walk(Walk {
        duration: whole(duration),
        distance: whole(distance),
    })
}

/// Cheapest origin-to-destination path under the current penalties, as a
/// list of edges.
fn shortest_path(graph: &TransitGraph, penalties: &EdgePenalties) -> Option<Vec<EdgeIndex>> {
    let g = graph.graph();
    let cost = |edge: EdgeIndex, weight: &GraphEdge| {
        weight.base_cost() * penalties.get(&edge).copied().unwrap_or(1.0)
    };

    let (_, nodes) = astar(
        g,
        graph.origin(),
        |node| node == graph.destination(),
        |edge| cost(edge.id(), edge.weight()),
        |_| 0.0,
    )?;

    nodes
        .windows(2)
        .map(|pair| {
            g.edges_connecting(pair[0], pair[1])
                .min_by(|a, b| cost(a.id(), a.weight()).total_cmp(&cost(b.id(), b.weight())))
                .map(|edge| edge.id())
        })
        .collect()
}

/// A ride being assembled from consecutive transit edges.
struct OpenRide {
    line: LineId,
    from: usize,
    to: usize,
    duration: f64,
}

/// Convert an edge path into a route.
///
/// Transfer edges do not become segments: boarding and interchange time is
/// added to the ride that follows, alighting time to the ride before a walk.
/// Returns `Ok(None)` for paths that walk through stations without riding
/// anything.
pub fn path_to_route(graph: &TransitGraph, path: &[EdgeIndex]) -> Result<Option<Route>, PlanError> {
    if path == [graph.direct_walk()] {
        return Ok(Some(direct_walk_route(graph)));
    }

    let mut builder = SegmentBuilder::new(graph);
    for edge in path {
        let Some(weight) = graph.graph().edge_weight(*edge) else {
            continue;
        };
        match weight {
            GraphEdge::Walking {
                duration, distance, ..
            } => builder.walk(*duration, *distance)?,
            GraphEdge::Transfer { duration } => builder.pending += duration,
            GraphEdge::Transit {
                line,
                from_pos,
                to_pos,
                duration,
                ..
            } => builder.ride(line, *from_pos, *to_pos, *duration)?,
        }
    }
    let segments = builder.finish()?;

    if !segments.iter().any(Segment::is_transit) {
        return Ok(None);
    }
    Ok(Some(Route::new(segments)))
}

struct SegmentBuilder<'a> {
    graph: &'a TransitGraph,
    segments: Vec<Segment>,
    open: Option<OpenRide>,
    pending: f64,
}

impl<'a> SegmentBuilder<'a> {
    fn new(graph: &'a TransitGraph) -> Self {
        Self {
            graph,
            segments: Vec::new(),
            open: None,
            pending: 0.0,
        }
    }

    fn ride(&mut self, line: &LineId, from: usize, to: usize, duration: f64) -> Result<(), PlanError> {
        if let Some(open) = &mut self.open
            && &open.line == line
            && open.to == from
        {
            open.to = to;
            open.duration += duration + std::mem::take(&mut self.pending);
            return Ok(());
        }

        self.close_ride()?;
        self.open = Some(OpenRide {
            line: line.clone(),
            from,
            to,
            duration: duration + std::mem::take(&mut self.pending),
        });
        Ok(())
    }

    fn walk(&mut self, duration: f64, distance: f64) -> Result<(), PlanError> {
        if let Some(open) = &mut self.open {
            open.duration += std::mem::take(&mut self.pending);
        }
        self.close_ride()?;
        let walk = Walk {
            duration: whole(duration + std::mem::take(&mut self.pending)),
            distance: whole(distance),
        };
        // Endpoints placed on a station walk nowhere.
        if walk.duration > 0 || walk.distance > 0 {
            self.segments.push(Segment::Walk(walk));
        }
        Ok(())
    }

    fn close_ride(&mut self) -> Result<(), PlanError> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        let line: &Arc<TransitLine> = self
            .graph
            .line(&open.line)
            .ok_or_else(|| PlanError::UnknownLine(open.line.clone()))?;
        let stations = line.stations_between(open.from, open.to);
        if stations.len() < 2 {
            return Err(PlanError::InvalidRide {
                line: open.line,
                from: open.from,
                to: open.to,
            });
        }
        self.segments.push(Segment::Transit(Ride {
            line: Arc::clone(line),
            stations,
            duration: whole(open.duration),
        }));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Segment>, PlanError> {
        if let Some(open) = &mut self.open {
            open.duration += std::mem::take(&mut self.pending);
        }
        self.close_ride()?;

        let mut segments = self.segments;
        if self.pending > 0.0
            && let Some(last) = segments.last_mut()
        {
            let extra = whole(self.pending);
            match last {
                Segment::Walk(walk) => walk.duration += extra,
                Segment::Transit(ride) => ride.duration += extra,
            }
        }
        Ok(segments)
    }
}

/// Round a non-negative quantity of seconds or meters to whole units.
fn whole(value: f64) -> u32 {
    value.max(0.0).round() as u32
}
