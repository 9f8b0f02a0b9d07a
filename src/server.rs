//! HTTP transport for the wire protocol.
//!
//! Routes match the browser front end's endpoints. Every handler is
//! stateless: the engine only holds configuration and each request carries
//! the full clustering state. CORS is permissive so a front end served from
//! another origin can call the API.

use crate::error::KMeansError;
use crate::geometry::Point;
use crate::kmeans::KMeansEngine;
use crate::protocol::{
    decode, handle_converge, handle_generate, handle_initialize, handle_step, ConvergeResponse,
    ErrorResponse, GenerateParams, InitializeCentroidsResponse, StepResponse,
};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
struct AppState {
    engine: KMeansEngine,
}

fn status_for(err: &KMeansError) -> StatusCode {
    match err {
        KMeansError::InvalidK(_) | KMeansError::CentroidCountMismatch { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        KMeansError::NotInitialized(_) | KMeansError::AlreadyInitialized(_) => {
            StatusCode::CONFLICT
        }
        KMeansError::EmptyDataset | KMeansError::MalformedInput(_) => StatusCode::BAD_REQUEST,
    }
}

fn api_error(route: &'static str, err: KMeansError) -> ApiError {
    warn!(route, kind = err.kind(), "rejected request: {}", err);
    (status_for(&err), Json(ErrorResponse::from(&err)))
}

/// Build the router serving the four clustering endpoints.
pub fn router(engine: KMeansEngine) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/initialize-data", get(initialize_data))
        .route("/initialize-centroids", post(initialize_centroids))
        .route("/step-kmeans", post(step_kmeans))
        .route("/jump-to-convergence", post(jump_to_convergence))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn initialize_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateParams>,
) -> ApiResult<Vec<Point>> {
    let points = handle_generate(&state.engine, &params)
        .map_err(|e| api_error("/initialize-data", e))?;
    debug!(n_points = points.len(), "generated dataset");
    Ok(Json(points))
}

async fn initialize_centroids(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<InitializeCentroidsResponse> {
    const ROUTE: &str = "/initialize-centroids";
    let req = decode(&body).map_err(|e| api_error(ROUTE, e))?;
    let resp = handle_initialize(&state.engine, req).map_err(|e| api_error(ROUTE, e))?;
    debug!(k = resp.centroids.len(), "initialized centroids");
    Ok(Json(resp))
}

async fn step_kmeans(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<StepResponse> {
    const ROUTE: &str = "/step-kmeans";
    let req = decode(&body).map_err(|e| api_error(ROUTE, e))?;
    let resp = handle_step(&state.engine, req).map_err(|e| api_error(ROUTE, e))?;
    debug!(converged = resp.converged, "step");
    Ok(Json(resp))
}

async fn jump_to_convergence(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<ConvergeResponse> {
    const ROUTE: &str = "/jump-to-convergence";
    let req = decode(&body).map_err(|e| api_error(ROUTE, e))?;
    let resp = handle_converge(&state.engine, req).map_err(|e| api_error(ROUTE, e))?;
    debug!(
        converged = resp.converged,
        iterations = resp.iterations,
        "jump to convergence"
    );
    Ok(Json(resp))
}
