//! Engine-level error types.

use thiserror::Error;

/// Errors produced by the roadmap engine (input validation + session operations).
///
/// Malformed graph structure (dangling dependencies, cycles) is never an
/// error; it is recovered during graph building and layout.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Input errors ------

    /// The payload was not valid JSON or did not match any accepted shape.
    #[error("malformed roadmap payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The generator refused the requested role.
    #[error("role rejected by generator: {0}")]
    InvalidRole(String),

    /// The payload contained no steps.
    #[error("roadmap contains no steps")]
    EmptyRoadmap,

    /// A single step could not be normalised.
    #[error("step #{index} is invalid: {reason}")]
    InvalidStep {
        index: usize,
        reason: String,
    },

    /// Two steps share the same id.
    #[error("duplicate step ID: '{0}'")]
    DuplicateStepId(String),

    // ------ Session errors ------

    /// An operation referenced a node id that is not part of the roadmap.
    #[error("unknown step '{0}'")]
    UnknownStep(String),

    /// Error surfaced by the persistence backend.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}
