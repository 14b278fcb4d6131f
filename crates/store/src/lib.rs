//! `store` crate: the persistence contract for roadmap tracking state.
//!
//! The graph engine never talks to a database directly.  It is handed an
//! `Arc<dyn RoadmapStore>` by the host application.  Every backend (Postgres,
//! a REST client, the in-memory double in [`mock`]) implements [`RoadmapStore`].

pub mod error;
pub mod traits;
pub mod types;
pub mod mock;

pub use error::StoreError;
pub use traits::RoadmapStore;
pub use types::{NodePositions, Position, RoadmapState, StepStatus, StepStatusMap};
