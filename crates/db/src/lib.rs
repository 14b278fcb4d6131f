//! `db` crate: Postgres persistence for saved roadmaps.
//!
//! Provides a connection pool, typed row structs, repository functions for
//! the `roadmaps` table, and [`PgRoadmapStore`], the Postgres implementation
//! of the engine's persistence contract.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;
pub mod pg_store;

pub use pool::DbPool;
pub use error::DbError;
pub use pg_store::PgRoadmapStore;
