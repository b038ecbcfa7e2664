//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::domain::{Coordinates, InvalidCoordinates, StationId};

use super::dto::*;
use super::state::AppState;

/// Default number of stations returned by the nearby lookup.
const DEFAULT_NEARBY_COUNT: usize = 5;

/// Upper bound on stations returned by the nearby lookup.
const MAX_NEARBY_COUNT: usize = 50;

/// Default nearby search radius in meters.
const DEFAULT_NEARBY_RADIUS_M: f64 = 1000.0;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/routes", post(plan_routes))
        .route("/stations/nearby", get(nearby_stations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan routes between two stations.
async fn plan_routes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlanRoutesResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: PlanRoutesRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(body = %String::from_utf8_lossy(&body), "Rejected route request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    for coordinates in [&req.origin, &req.destination].into_iter().flatten() {
        coordinates.validate()?;
    }

    let origin = StationId::new(&req.origin_station_id);
    let destination = StationId::new(&req.destination_station_id);

    let routes = state
        .planner
        .find_best_routes(&origin, &destination, req.origin, req.destination)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!(
                "No route between {} and {}: no station within walking distance",
                req.origin_station_id, req.destination_station_id
            ),
        })?;

    Ok(Json(PlanRoutesResponse {
        routes: routes.iter().map(RouteResult::from_route).collect(),
    }))
}

/// Stations near a point, nearest first.
async fn nearby_stations(
    State(state): State<AppState>,
    Query(req): Query<NearbyStationsRequest>,
) -> Result<Json<NearbyStationsResponse>, AppError> {
    let point = Coordinates::new(req.lat, req.lng)?;
    let count = req.count.unwrap_or(DEFAULT_NEARBY_COUNT).min(MAX_NEARBY_COUNT);
    let max_radius = state.planner.config().graph.max_walk_m;
    let radius = req
        .radius
        .unwrap_or(DEFAULT_NEARBY_RADIUS_M)
        .clamp(0.0, max_radius);

    let index = state.planner.index();
    let stations = index
        .find_nearest_stations(&point, count, radius)
        .iter()
        .map(|nearby| {
            let lines = index
                .lines_at(&nearby.station.id)
                .iter()
                .map(|id| id.to_string())
                .collect();
            NearbyStationResult::from_nearby(nearby, lines)
        })
        .collect();

    Ok(Json(NearbyStationsResponse { stations }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl From<InvalidCoordinates> for AppError {
    fn from(e: InvalidCoordinates) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        debug!(%status, %message, "Request rejected");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
