//! Instance model: entities, relationships, classifications and their properties.

use super::typedef::{PrimitiveDefCategory, TypeDef, TypeDefCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of an instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    #[default]
    Unknown,
    Proposed,
    Draft,
    Prepared,
    Active,
    Deleted,
}

impl InstanceStatus {
    /// Whether an instance in this status is visible to normal retrieval
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Unknown | Self::Deleted)
    }
}

/// A single property value held by an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InstancePropertyValue {
    Primitive {
        category: PrimitiveDefCategory,
        value: serde_json::Value,
    },
    Enum {
        ordinal: i32,
        symbolic_name: String,
    },
    Array {
        values: Vec<InstancePropertyValue>,
    },
    Map {
        values: BTreeMap<String, InstancePropertyValue>,
    },
}

impl InstancePropertyValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Primitive {
            category: PrimitiveDefCategory::OmPrimitiveTypeString,
            value: serde_json::Value::String(value.into()),
        }
    }
}

/// Named property values of an instance, ordered by property name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InstanceProperties(BTreeMap<String, InstancePropertyValue>);

impl InstanceProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: InstancePropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&InstancePropertyValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstancePropertyValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, InstancePropertyValue)> for InstanceProperties {
    fn from_iter<I: IntoIterator<Item = (String, InstancePropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Type information stamped on an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub type_def_category: TypeDefCategory,
    pub type_def_guid: String,
    pub type_def_name: String,
    pub type_def_version: u64,
}

impl InstanceType {
    /// Stamp from a type definition; `None` when the definition lacks identity
    pub fn from_type_def(def: &TypeDef) -> Option<Self> {
        Some(Self {
            type_def_category: def.category?,
            type_def_guid: def.guid.clone()?,
            type_def_name: def.name.clone()?,
            type_def_version: def.version,
        })
    }
}

/// A classification attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub name: String,
    #[serde(default)]
    pub instance_type: Option<InstanceType>,
    #[serde(default)]
    pub properties: Option<InstanceProperties>,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub version: u64,
}

impl Classification {
    /// Number of properties carried; an absent property set counts as empty
    pub fn property_count(&self) -> usize {
        self.properties.as_ref().map_or(0, InstanceProperties::len)
    }
}

/// Full detail of an entity instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetail {
    pub guid: String,
    #[serde(default)]
    pub metadata_collection_id: Option<String>,
    #[serde(default)]
    pub instance_type: Option<InstanceType>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub properties: Option<InstanceProperties>,
    /// Repositories may omit the list entirely rather than return it empty
    #[serde(default)]
    pub classifications: Option<Vec<Classification>>,
}

impl EntityDetail {
    pub fn type_name(&self) -> Option<&str> {
        self.instance_type.as_ref().map(|t| t.type_def_name.as_str())
    }

    /// Classifications carrying the given name
    pub fn classifications_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Classification> {
        self.classifications
            .iter()
            .flatten()
            .filter(move |c| c.name == name)
    }
}

/// Proxy for an entity at one end of a relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityProxy {
    pub guid: String,
    #[serde(default)]
    pub type_name: Option<String>,
}

/// A relationship instance between two entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub guid: String,
    #[serde(default)]
    pub metadata_collection_id: Option<String>,
    #[serde(default)]
    pub instance_type: Option<InstanceType>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub properties: Option<InstanceProperties>,
    #[serde(default)]
    pub entity_one_proxy: Option<EntityProxy>,
    #[serde(default)]
    pub entity_two_proxy: Option<EntityProxy>,
}

impl Relationship {
    pub fn type_name(&self) -> Option<&str> {
        self.instance_type.as_ref().map(|t| t.type_def_name.as_str())
    }
}
