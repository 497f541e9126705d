//! Project bookkeeping module
//!
//! This module owns the authoritative in-memory registry of projects known
//! to the backend. Projects arrive as [`ProjectContainer`] values from the
//! IPC layer and live in the [`ProjectRegistry`] keyed by their project
//! file path.

pub mod container;
pub mod error;
pub mod project;
pub mod registry;

pub use container::ProjectContainer;
pub use error::ProjectError;
pub use project::Project;
pub use registry::ProjectRegistry;
