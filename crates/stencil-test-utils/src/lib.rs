//! Shared test utilities for the stencil workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`project`]: [`TestProject`] builder for a throwaway target directory

pub mod project;

pub use project::TestProject;
