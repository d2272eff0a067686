//! HTTP boundary for path queries.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use paradise_core::{ExternalId, PathResult};

use crate::error::PathfindError;
use crate::PathfindEngine;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PathfindEngine>,
}

impl AppState {
    pub fn new(engine: PathfindEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Raw query parameters; validated by the handler so absence and
/// malformation map to distinct statuses.
#[derive(Debug, Default, Deserialize)]
pub struct PathParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(shortest_path))
        .route("/shortest", get(shortest_path))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn run_server(state: AppState, bind: &str) -> std::io::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "Path query server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
}

async fn health() -> &'static str {
    "ok"
}

async fn shortest_path(
    State(state): State<AppState>,
    Query(params): Query<PathParams>,
) -> Result<Json<PathResult>, (StatusCode, String)> {
    let run = async {
        let from = endpoint_param("from", params.from.as_deref())?;
        let to = endpoint_param("to", params.to.as_deref())?;
        state.engine.shortest_path(from, to).await
    };

    run.await.map(Json).map_err(|e| {
        let status = status_of(&e);
        if status.is_server_error() {
            tracing::error!(error = %e, "Path query failed");
        }
        (status, e.to_string())
    })
}

fn endpoint_param(param: &'static str, raw: Option<&str>) -> Result<ExternalId, PathfindError> {
    match raw.map(str::trim) {
        None | Some("") => Err(PathfindError::MissingParameter { param }),
        Some(value) => value
            .parse()
            .map_err(|e: paradise_core::ParadiseError| PathfindError::MalformedRequest {
                param,
                reason: e.to_string(),
            }),
    }
}

fn status_of(error: &PathfindError) -> StatusCode {
    match error {
        PathfindError::MissingParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PathfindError::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
        PathfindError::EndpointNotFound { .. } => StatusCode::NOT_FOUND,
        PathfindError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
