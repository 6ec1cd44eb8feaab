//! HTTP server.
//!
//! Routes:
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET` | `/` | Browser page |
//! | `POST` | `/process-idea` | Saved idea, or `{ideas, count, failed}` for several |
//! | `GET` | `/list-ideas` | Idea summaries |
//! | `GET` | `/idea/{id}` | Stored markdown |
//! | `GET` | `/graph` | Settled layout as JSON |
//! | `GET` | `/graph.svg` | Settled layout as SVG |
//!
//! Store and refinement calls are blocking and run on the blocking pool.

mod handlers;
mod page;

use crate::config::SantraConfig;
use crate::graph::SimulationConfig;
use crate::services::IdeaService;
use crate::{Error, Result};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Idea service.
    pub service: IdeaService,
    /// Layout parameters for graph routes.
    pub canvas: SimulationConfig,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub const fn new(service: IdeaService, canvas: SimulationConfig) -> Self {
        Self { service, canvas }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/process-idea", post(handlers::process_idea))
        .route("/list-ideas", get(handlers::list_ideas))
        .route("/idea/{id}", get(handlers::get_idea))
        .route("/graph", get(handlers::graph_scene))
        .route("/graph.svg", get(handlers::graph_svg))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the server until interrupted.
///
/// Creates its own runtime, so it must not be called from async code.
///
/// # Errors
///
/// Returns `OperationFailed` if the runtime cannot start or the port cannot
/// be bound.
pub fn run(config: &SantraConfig, service: IdeaService) -> Result<()> {
    let state = AppState::new(
        service,
        SimulationConfig::with_canvas(config.graph.width, config.graph.height),
    );
    let app = router(state);

    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    rt.block_on(async {
        let listener =
            tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| Error::OperationFailed {
                    operation: "bind".to_string(),
                    cause: format!("{addr}: {e}"),
                })?;

        tracing::info!(
            port = config.port,
            data_dir = %config.data_dir.display(),
            "Server running at http://localhost:{}",
            config.port
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "serve".to_string(),
                cause: e.to_string(),
            })
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Runs a blocking closure on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "spawn_blocking".to_string(),
            cause: e.to_string(),
        })?
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidInput(msg) => {
                tracing::warn!(error = %msg, "Rejected request");
                (StatusCode::BAD_REQUEST, msg.clone())
            },
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Idea not found".to_string()),
            Self::ServiceFailed { .. } => {
                tracing::error!(error = %self, "Refinement failed");
                (StatusCode::BAD_GATEWAY, "Processing failed".to_string())
            },
            Self::OperationFailed { .. } => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            },
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
