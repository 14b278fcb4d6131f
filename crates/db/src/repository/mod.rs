//! Repository functions: one function per database operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! Pure SQL, no domain types.

pub mod roadmaps;
