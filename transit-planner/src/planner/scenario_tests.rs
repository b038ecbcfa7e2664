//! End-to-end planner scenarios over small synthetic networks.

use std::sync::Arc;

use crate::cache::CacheConfig;
use crate::domain::{Coordinates, Route, Segment, StationId, TransitLine};
use crate::stations::StationIndex;

use super::config::{GraphConfig, PlannerConfig};
use super::graph::GraphBuilder;
use super::search::find_routes;
use super::service::RoutePlanner;
use super::test_network::{self, at, east, line};

fn planner(index: StationIndex) -> RoutePlanner {
    RoutePlanner::new(
        Arc::new(index),
        PlannerConfig::default(),
        &CacheConfig::default(),
    )
}

fn id(s: &str) -> StationId {
    StationId::new(s)
}

fn coordinates(planner: &RoutePlanner, station: &str) -> Coordinates {
    planner
        .index()
        .station(&id(station))
        .map(|s| s.coordinates)
        .expect("station in network")
}

fn line_ids(route: &Route) -> Vec<&str> {
    route
        .segments()
        .iter()
        .filter_map(Segment::as_ride)
        .map(|ride| ride.line.id.as_str())
        .collect()
}

/// Three east-west and three north-south lines crossing on a 2 km grid.
/// Every grid station is an interchange.
fn grid() -> StationIndex {
    let name = |x: usize, y: usize| format!("G{x}{y}");
    let mut lines: Vec<TransitLine> = Vec::new();
    for y in 0..3 {
        let stations: Vec<(String, Coordinates)> = (0..3)
            .map(|x| (name(x, y), at(x as f64 * 2000.0, y as f64 * 2000.0)))
            .collect();
        let refs: Vec<(&str, Coordinates)> =
            stations.iter().map(|(s, c)| (s.as_str(), *c)).collect();
        lines.push(line(&format!("H{y}"), 5, &refs));
    }
    for x in 0..3 {
        let stations: Vec<(String, Coordinates)> = (0..3)
            .map(|y| (name(x, y), at(x as f64 * 2000.0, y as f64 * 2000.0)))
            .collect();
        let refs: Vec<(&str, Coordinates)> =
            stations.iter().map(|(s, c)| (s.as_str(), *c)).collect();
        lines.push(line(&format!("V{x}"), 12, &refs));
    }
    test_network::index(lines)
}

/// Fewest transfers over the transit candidates path search produces for
/// this trip, recomputed from a fresh graph.
fn min_candidate_transfers(
    planner: &RoutePlanner,
    origin: &Coordinates,
    destination: &Coordinates,
) -> usize {
    let config = planner.config();
    let graph = GraphBuilder::new(planner.index(), &config.graph).build(origin, destination);
    find_routes(&graph, &config.search)
        .iter()
        .filter(|r| !r.is_direct_walk())
        .map(Route::transfers)
        .min()
        .unwrap_or(0)
}

fn assert_invariants(
    planner: &RoutePlanner,
    origin: &Coordinates,
    destination: &Coordinates,
    routes: &[Route],
) {
    let config = planner.config();
    assert!(!routes.is_empty());
    assert!(routes.len() <= config.optimizer.max_routes);

    for route in routes {
        let sum: u32 = route.segments().iter().map(Segment::duration).sum();
        assert_eq!(route.total_duration(), sum, "route {}", route.id);
        assert!(!route.id.is_empty());
    }

    if routes.len() >= 2 {
        for (i, a) in routes.iter().enumerate() {
            for b in &routes[i + 1..] {
                assert!(
                    a.similarity(b) <= config.optimizer.similarity_threshold,
                    "{} and {} share a corridor",
                    a.id,
                    b.id
                );
            }
        }
    }

    let min_transfers = min_candidate_transfers(planner, origin, destination);
    let bound = config.optimizer.max_transfers.min(min_transfers + 2);
    for route in routes {
        assert!(
            route.transfers() <= bound,
            "route {} has {} transfers, bound {bound}",
            route.id,
            route.transfers()
        );
    }
}

#[tokio::test]
async fn direct_line_is_a_single_ride() {
    let planner = planner(test_network::straight_line());

    let routes = planner
        .find_best_routes(&id("S0"), &id("S4"), None, None)
        .await
        .unwrap();

    let (origin, destination) = (coordinates(&planner, "S0"), coordinates(&planner, "S4"));
    assert_invariants(&planner, &origin, &destination, &routes);
    let direct = routes
        .iter()
        .find(|r| r.segments().len() == 1 && r.has_transit())
        .expect("direct transit route");
    assert_eq!(direct.transfers(), 0);
    assert_eq!(line_ids(direct), vec!["L"]);
    let ride = direct.segments()[0].as_ride().unwrap();
    assert_eq!(ride.stations.first().map(|s| s.id.as_str()), Some("S0"));
    assert_eq!(ride.stations.last().map(|s| s.id.as_str()), Some("S4"));
}

#[tokio::test]
async fn crossing_two_lines_changes_once_at_the_interchange() {
    let planner = planner(test_network::two_lines_one_interchange());

    let routes = planner
        .find_best_routes(&id("A1"), &id("B3"), None, None)
        .await
        .unwrap();

    let (origin, destination) = (coordinates(&planner, "A1"), coordinates(&planner, "B3"));
    assert_invariants(&planner, &origin, &destination, &routes);
    let route = routes
        .iter()
        .find(|r| r.segments().len() == 2 && line_ids(r) == ["A", "B"])
        .expect("route changing from A to B");
    assert_eq!(route.transfers(), 1);

    let first = route.segments()[0].as_ride().unwrap();
    let second = route.segments()[1].as_ride().unwrap();
    assert_eq!(first.stations.last().map(|s| s.id.as_str()), Some("X"));
    assert_eq!(second.stations.first().map(|s| s.id.as_str()), Some("X"));
}

#[tokio::test]
async fn far_origin_walk_is_penalized() {
    let planner = planner(test_network::straight_line());
    let walk_speed = GraphConfig::default().walk_speed_mps;

    // 3 km west of S0: beyond the walking radius, within the max walk.
    let routes = planner
        .find_best_routes(&id("S0"), &id("S4"), Some(east(-3000.0)), None)
        .await
        .unwrap();

    let destination = coordinates(&planner, "S4");
    assert_invariants(&planner, &east(-3000.0), &destination, &routes);
    let Segment::Walk(walk) = &routes[0].segments()[0] else {
        panic!("first segment should be a walk");
    };
    assert!(walk.distance >= 2990);
    assert!(walk.duration as f64 > walk.distance as f64 / walk_speed);
}

#[tokio::test]
async fn short_trip_walks_first() {
    let planner = planner(test_network::straight_line());

    // 200 m apart, between S1 and S2.
    let routes = planner
        .find_best_routes(
            &id("S1"),
            &id("S2"),
            Some(east(1400.0)),
            Some(east(1600.0)),
        )
        .await
        .unwrap();

    assert_invariants(&planner, &east(1400.0), &east(1600.0), &routes);
    assert!(routes[0].is_direct_walk());
    assert!((routes[0].walking_distance() as i64 - 200).abs() <= 1);
}

#[tokio::test]
async fn no_station_near_origin_is_none() {
    let planner = planner(test_network::straight_line());

    let routes = planner
        .find_best_routes(&id("S0"), &id("S4"), Some(east(-20_000.0)), None)
        .await;
    assert!(routes.is_none());

    let routes = planner
        .find_best_routes(&id("S0"), &id("S4"), None, Some(east(30_000.0)))
        .await;
    assert!(routes.is_none());
}

#[test]
fn planning_is_idempotent() {
    let planner = planner(grid());
    let origin = at(100.0, -100.0);
    let destination = at(3900.0, 4100.0);

    let first = planner.plan(&origin, &destination).unwrap();
    let second = planner.plan(&origin, &destination).unwrap();

    assert_eq!(first, second);
}

#[test]
fn grid_trips_keep_invariants() {
    let planner = planner(grid());
    let trips = [
        (at(0.0, 0.0), at(4000.0, 4000.0)),
        (at(-300.0, 200.0), at(4200.0, 1800.0)),
        (at(2000.0, 0.0), at(2000.0, 4000.0)),
        (at(500.0, 500.0), at(900.0, 700.0)),
        (at(4000.0, 0.0), at(0.0, 4000.0)),
    ];

    for (origin, destination) in trips {
        let routes = planner.plan(&origin, &destination).unwrap();
        assert_invariants(&planner, &origin, &destination, &routes);
    }
}

#[test]
fn grid_offers_more_than_one_corridor() {
    let planner = planner(grid());

    let routes = planner.plan(&at(0.0, 0.0), &at(4000.0, 4000.0)).unwrap();
    let transit: Vec<&Route> = routes.iter().filter(|r| r.has_transit()).collect();

    assert!(transit.len() >= 2);
    assert!(transit.iter().all(|r| r.transfers() >= 1));
}
