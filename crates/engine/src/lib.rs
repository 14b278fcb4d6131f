//! `engine` crate: the roadmap graph engine.
//!
//! Turns a validated step list into a laid-out, status-aware graph and keeps
//! that graph consistent while a user tracks their progress through it.

pub mod models;
pub mod error;
pub mod schema;
pub mod graph;
pub mod layout;
pub mod status;
pub mod view;
pub mod writer;
pub mod session;

pub use models::{Edge, GraphMode, Node, RoadmapGraph, RoadmapStep};
pub use error::EngineError;
pub use schema::{parse_roadmap, parse_steps};
pub use graph::build_graph;
pub use layout::{apply_layout, LayoutConfig};
pub use view::assemble_graph;
pub use session::{RoadmapSession, SessionConfig, SessionInput, SessionObserver};

#[cfg(test)]
mod session_tests;
