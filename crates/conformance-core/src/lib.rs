//! Core types and abstractions for repository conformance testing.
//!
//! This crate describes the boundary between the conformance workbench and a
//! repository under test: the type system and instance model a repository
//! exchanges, the [`MetadataCollection`] capability it exposes, and the
//! workbench configuration.

pub mod config;
pub mod error;
pub mod id;
pub mod traits;
pub mod types;

pub use config::WorkbenchConfig;
pub use error::{ConformanceError, Result};
pub use id::Guid;
pub use traits::*;
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::WorkbenchConfig;
    pub use crate::error::{ConformanceError, Result};
    pub use crate::id::Guid;
    pub use crate::traits::*;
    pub use crate::types::*;
}
