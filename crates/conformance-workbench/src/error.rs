//! Errors that end a test case.

use conformance_core::ConformanceError;
use std::time::Duration;

/// Result type for test case bodies
pub type CaseResult<T> = std::result::Result<T, CaseError>;

/// Why a test case body stopped before completing.
///
/// Every variant ends only the test case that produced it. The runner
/// decides whether it counts as a failure or a skip.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// A contract clause was violated
    #[error("Assertion {id} failed: {message}")]
    Assertion { id: String, message: String },

    /// The repository raised an error from a call
    #[error("{operation} raised an error: {source}")]
    Repository {
        operation: &'static str,
        #[source]
        source: ConformanceError,
    },

    /// A call did not complete within the per-call deadline
    #[error("{operation} did not complete within {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The repository declared the function unsupported
    #[error("{operation} is not supported: {reason}")]
    NotSupported {
        operation: &'static str,
        reason: String,
    },

    /// Nothing the test case checks is present in this repository
    #[error("Not applicable: {reason}")]
    NotApplicable { reason: String },
}

impl CaseError {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable {
            reason: reason.into(),
        }
    }

    /// Skips report "not supported"; everything else is a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NotSupported { .. } | Self::NotApplicable { .. })
    }

    /// Identifier of the failed assertion, if this is an assertion failure
    pub fn assertion_id(&self) -> Option<&str> {
        match self {
            Self::Assertion { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Map a repository error, separating "not supported" from real failures
    pub fn from_repository(operation: &'static str, error: ConformanceError) -> Self {
        if error.is_not_supported() {
            Self::NotSupported {
                operation,
                reason: error.to_string(),
            }
        } else {
            Self::Repository {
                operation,
                source: error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_supported_is_skip() {
        let err = CaseError::from_repository(
            "deleteEntity",
            ConformanceError::function_not_supported("soft delete"),
        );
        assert!(err.is_skip());
        assert!(matches!(err, CaseError::NotSupported { .. }));
    }

    #[test]
    fn test_repository_error_is_failure() {
        let err = CaseError::from_repository("addEntity", ConformanceError::repository("boom"));
        assert!(!err.is_skip());
        assert_eq!(format!("{}", err), "addEntity raised an error: Repository error: boom");
    }

    #[test]
    fn test_assertion_id() {
        let err = CaseError::Assertion {
            id: "name-present".to_string(),
            message: "AttributeTypeDef has a name".to_string(),
        };
        assert_eq!(err.assertion_id(), Some("name-present"));
        assert!(!err.is_skip());
    }
}
