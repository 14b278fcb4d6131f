//! `api` crate: HTTP REST API layer.
//!
//! Exposes:
//!   GET    /health
//!   POST   /api/v1/roadmaps
//!   GET    /api/v1/roadmaps?user_id=
//!   GET    /api/v1/roadmaps/{id}
//!   DELETE /api/v1/roadmaps/{id}
//!   GET    /api/v1/roadmaps/{id}/graph
//!   PUT    /api/v1/roadmaps/{id}/status
//!   PUT    /api/v1/roadmaps/{id}/positions
//!   POST   /api/v1/roadmaps/{id}/steps/{step_id}/advance

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use db::{DbPool, PgRoadmapStore};
use engine::LayoutConfig;
use store::RoadmapStore;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use handlers::{graph, roadmaps};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// Tracking-state backend for the graph, status and positions routes.
    pub store: Arc<dyn RoadmapStore>,
    pub layout: LayoutConfig,
}

impl AppState {
    /// State backed entirely by `pool`.
    pub fn new(pool: DbPool, layout: LayoutConfig) -> Self {
        let store: Arc<dyn RoadmapStore> = Arc::new(PgRoadmapStore::new(pool.clone()));
        Self { pool, store, layout }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/roadmaps", get(roadmaps::list).post(roadmaps::create))
        .route(
            "/api/v1/roadmaps/:id",
            get(roadmaps::get).delete(roadmaps::delete),
        )
        .route("/api/v1/roadmaps/:id/graph", get(graph::graph))
        .route("/api/v1/roadmaps/:id/status", put(graph::put_status))
        .route("/api/v1/roadmaps/:id/positions", put(graph::put_positions))
        .route(
            "/api/v1/roadmaps/:id/steps/:step_id/advance",
            post(graph::advance),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `bind` and serve until the process is stopped.
pub async fn serve(bind: &str, pool: DbPool, layout: LayoutConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(AppState::new(pool, layout))).await
}

async fn health() -> &'static str {
    "ok"
}

// ============================================================
// Unit tests
// ============================================================
