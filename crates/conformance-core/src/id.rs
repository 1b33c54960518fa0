//! GUID helper for type definitions and instances.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A globally unique identifier as exchanged with a metadata collection.
///
/// Repositories hand GUIDs around as strings; this wrapper only guarantees
/// that GUIDs minted locally are UUIDv4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// Mint a new random GUID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing GUID string
    pub fn from_string(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    /// Borrow the GUID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Guid> for String {
    fn from(guid: Guid) -> Self {
        guid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_creation() {
        let a = Guid::new();
        let b = Guid::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_guid_serializes_as_plain_string() {
        let guid = Guid::from_string("g1");
        let json = serde_json::to_string(&guid).unwrap();
        assert_eq!(json, "\"g1\"");
    }
}
