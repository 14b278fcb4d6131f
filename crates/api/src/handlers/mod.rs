//! Route handlers, grouped by resource.

pub mod graph;
pub mod roadmaps;

use axum::http::StatusCode;
use store::StoreError;
use tracing::error;

/// Map a repository error onto an HTTP status.
pub(crate) fn db_status(e: db::DbError) -> StatusCode {
    match e {
        db::DbError::NotFound => StatusCode::NOT_FOUND,
        other => {
            error!("database error: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map a persistence-adapter error onto an HTTP status.
pub(crate) fn store_status(e: StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        other => {
            error!("store error: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
