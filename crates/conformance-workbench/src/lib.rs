//! Repository conformance workbench.
//!
//! Drives a [`MetadataCollection`](conformance_core::MetadataCollection)
//! through its behavioral contract and reports a verdict per contract clause.
//!
//! # Pipeline
//!
//! ```text
//! acquire handle -> resolve collection id -> re-acquire handle
//!   -> type discovery
//!   -> per-type contract checks      (one case per discovered definition)
//!   -> category partition checks
//!   -> instance lifecycles           (one case per entity, relationship, classification)
//!   -> external mapping lookup
//!   -> WorkbenchResult { passed, failed, skipped }
//! ```
//!
//! Later stages only see what earlier stages discovered. A stage whose input
//! is missing is skipped, never failed, so the report separates "repository
//! does not offer X" from "repository offers X but breaks the contract".
//!
//! # Example
//!
//! ```no_run
//! use conformance_core::WorkbenchConfig;
//! use conformance_workbench::reference::InMemoryConnector;
//! use conformance_workbench::Workbench;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let workbench = Workbench::new(Arc::new(InMemoryConnector::sample()), WorkbenchConfig::default());
//! let result = workbench.run().await;
//! assert!(!result.has_failures());
//! # }
//! ```

pub mod cases;
pub mod error;
pub mod handle;
pub mod output;
pub mod planner;
pub mod properties;
pub mod reference;
pub mod result;
pub mod test_case;
pub mod workbench;

pub use error::{CaseError, CaseResult};
pub use handle::MetadataCollectionHandle;
pub use result::{ResultSummary, WorkbenchResult};
pub use test_case::{
    run_case, Assertion, AssertionLedger, CaseContext, ConformanceTestCase, DiscoveredProperties,
    TestCaseId, TestCaseRecord, TestOutcome,
};
pub use workbench::{RunContext, Workbench};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CaseError, CaseResult};
    pub use crate::result::WorkbenchResult;
    pub use crate::test_case::{CaseContext, ConformanceTestCase, TestCaseRecord, TestOutcome};
    pub use crate::workbench::Workbench;
    pub use conformance_core::prelude::*;
}
