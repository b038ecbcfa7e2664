use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_planner::cache::CacheConfig;
use transit_planner::planner::{PlannerConfig, RoutePlanner};
use transit_planner::stations::load_index;
use transit_planner::web::{AppState, create_router};

/// Catalog used when `NETWORK_PATH` is not set.
const DEFAULT_NETWORK_PATH: &str = "network.json";

/// Address used when `BIND_ADDR` is not set.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load the network (fail fast if missing or malformed)
    let network_path = PathBuf::from(
        std::env::var("NETWORK_PATH").unwrap_or_else(|_| DEFAULT_NETWORK_PATH.to_string()),
    );
    let index = load_index(&network_path).expect("Failed to load network catalog");
    info!(
        path = %network_path.display(),
        stations = index.station_count(),
        lines = index.lines().len(),
        "Loaded network"
    );

    // Planner configuration: defaults, optionally overridden from a JSON file
    let config = match std::env::var("PLANNER_CONFIG") {
        Ok(path) => {
            let contents =
                std::fs::read_to_string(&path).expect("Failed to read planner config");
            let config: PlannerConfig =
                serde_json::from_str(&contents).expect("Failed to parse planner config");
            info!(%path, "Loaded planner config");
            config
        }
        Err(_) => PlannerConfig::default(),
    };

    let planner = RoutePlanner::new(Arc::new(index), config, &CacheConfig::default());
    let state = AppState::new(planner);
    let app = create_router(state);

    // Bind and serve
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .expect("Invalid BIND_ADDR");
    info!(%addr, "Transit planner listening");
    info!("  GET  /health          - Health check");
    info!("  POST /routes          - Plan routes between stations");
    info!("  GET  /stations/nearby - Stations near a point");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
