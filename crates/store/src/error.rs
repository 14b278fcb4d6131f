//! Store-level error type.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by a [`RoadmapStore`](crate::RoadmapStore) backend.
///
/// The engine treats every variant the same way on writes (log, keep local
/// state).  On loads, any error means "no prior state".
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// No roadmap exists under this id.
    #[error("roadmap '{0}' not found")]
    NotFound(Uuid),

    /// The backend rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A persisted value could not be decoded.
    #[error("malformed persisted value: {0}")]
    Malformed(String),
}
