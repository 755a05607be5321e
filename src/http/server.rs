//! Health endpoint server.
//!
//! # Responsibilities
//! - Create Axum Router for the health path
//! - Wire up middleware (request ID, tracing)
//! - Map a [`CheckerResult`] to a status code and optional JSON body
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::HealthConfig;
use crate::health::{Checker, CheckerResult};
use crate::lifecycle::ShutdownReason;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<Checker>,
}

/// Query string as ordered pairs, so repeated keys never reject a request.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct HealthQuery(Vec<(String, String)>);

impl HealthQuery {
    /// First `verbose` value is present and non-empty.
    fn is_verbose(&self) -> bool {
        self.0
            .iter()
            .find(|(key, _)| key == "verbose")
            .is_some_and(|(_, value)| !value.is_empty())
    }
}

/// HTTP server exposing the health checker.
pub struct HealthServer {
    router: Router,
    config: HealthConfig,
}

impl HealthServer {
    pub fn new(config: HealthConfig, checker: Arc<Checker>) -> Self {
        let router = Self::build_router(&config, AppState { checker });
        Self { router, config }
    }

    fn build_router(config: &HealthConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.path, get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires or its sender is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<ShutdownReason>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, path = %self.config.path, "Health server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

async fn health_handler(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> Response {
    let result = state.checker.check().await;
    render(&result, query.is_verbose())
}

fn render(result: &CheckerResult, verbose: bool) -> Response {
    let status = if result.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if verbose {
        (status, Json(result)).into_response()
    } else {
        status.into_response()
    }
}
