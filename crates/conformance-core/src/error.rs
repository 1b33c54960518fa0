//! Error types raised by metadata collections and the conformance tooling.

/// Result type alias for conformance operations.
pub type Result<T> = std::result::Result<T, ConformanceError>;

/// Main error type shared by repository implementations and the workbench.
#[derive(Debug, thiserror::Error)]
pub enum ConformanceError {
    /// A type definition could not be located
    #[error("Type definition not known: {0}")]
    TypeDefNotKnown(String),

    /// An entity instance could not be located
    #[error("Entity not known: {0}")]
    EntityNotKnown(String),

    /// A relationship instance could not be located
    #[error("Relationship not known: {0}")]
    RelationshipNotKnown(String),

    /// A classification could not be applied, updated or removed
    #[error("Classification error: {0}")]
    Classification(String),

    /// A parameter passed to the repository was rejected
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Instance properties do not match the type definition
    #[error("Property error: {0}")]
    Property(String),

    /// The repository does not implement the requested function
    #[error("Function not supported: {0}")]
    FunctionNotSupported(String),

    /// Repository-specific failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Connector could not be obtained or bound
    #[error("Connector error: {0}")]
    Connector(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConformanceError {
    /// Create a new type-definition-not-known error
    pub fn type_def_not_known(msg: impl Into<String>) -> Self {
        Self::TypeDefNotKnown(msg.into())
    }

    /// Create a new entity-not-known error
    pub fn entity_not_known(msg: impl Into<String>) -> Self {
        Self::EntityNotKnown(msg.into())
    }

    /// Create a new relationship-not-known error
    pub fn relationship_not_known(msg: impl Into<String>) -> Self {
        Self::RelationshipNotKnown(msg.into())
    }

    /// Create a new classification error
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new property error
    pub fn property(msg: impl Into<String>) -> Self {
        Self::Property(msg.into())
    }

    /// Create a new function-not-supported error
    pub fn function_not_supported(msg: impl Into<String>) -> Self {
        Self::FunctionNotSupported(msg.into())
    }

    /// Create a new repository error
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a new connector error
    pub fn connector(msg: impl Into<String>) -> Self {
        Self::Connector(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is one of the not-known errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TypeDefNotKnown(_) | Self::EntityNotKnown(_) | Self::RelationshipNotKnown(_)
        )
    }

    /// Check if the repository declared the function unsupported
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::FunctionNotSupported(_))
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicate() {
        assert!(ConformanceError::type_def_not_known("Asset").is_not_found());
        assert!(ConformanceError::entity_not_known("g1").is_not_found());
        assert!(ConformanceError::relationship_not_known("r1").is_not_found());
        assert!(!ConformanceError::repository("boom").is_not_found());
    }

    #[test]
    fn test_not_supported_predicate() {
        let err = ConformanceError::function_not_supported("deleteEntity");
        assert!(err.is_not_supported());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = ConformanceError::classification("already classified");
        assert_eq!(format!("{}", err), "Classification error: already classified");

        let err = ConformanceError::timeout("addEntity after 10ms");
        assert_eq!(format!("{}", err), "Operation timed out: addEntity after 10ms");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConformanceError = io_err.into();
        assert!(matches!(err, ConformanceError::Io(_)));
    }
}
