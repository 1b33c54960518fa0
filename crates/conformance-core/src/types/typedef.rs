//! Type system model: attribute type definitions and structural type definitions.
//!
//! Identity fields are optional on purpose. A repository under test may hand
//! back incomplete definitions, and the contract checks need to observe the
//! gap rather than fail to deserialize it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an attribute type definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeTypeDefCategory {
    UnknownDef,
    Primitive,
    Collection,
    EnumDef,
}

impl AttributeTypeDefCategory {
    /// Every category a repository can legitimately declare
    pub const KNOWN: [AttributeTypeDefCategory; 3] = [Self::Primitive, Self::Collection, Self::EnumDef];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownDef => "UNKNOWN_DEF",
            Self::Primitive => "PRIMITIVE",
            Self::Collection => "COLLECTION",
            Self::EnumDef => "ENUM_DEF",
        }
    }

    /// Discovery property key listing the names returned for this category
    pub fn discovery_key(&self) -> &'static str {
        match self {
            Self::UnknownDef => "Supported UnknownDefs",
            Self::Primitive => "Supported PrimitiveDefs",
            Self::Collection => "Supported CollectionDefs",
            Self::EnumDef => "Supported EnumDefs",
        }
    }
}

impl fmt::Display for AttributeTypeDefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a structural type definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeDefCategory {
    UnknownDef,
    EntityDef,
    RelationshipDef,
    ClassificationDef,
}

impl TypeDefCategory {
    pub const KNOWN: [TypeDefCategory; 3] =
        [Self::EntityDef, Self::RelationshipDef, Self::ClassificationDef];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownDef => "UNKNOWN_DEF",
            Self::EntityDef => "ENTITY_DEF",
            Self::RelationshipDef => "RELATIONSHIP_DEF",
            Self::ClassificationDef => "CLASSIFICATION_DEF",
        }
    }

    pub fn discovery_key(&self) -> &'static str {
        match self {
            Self::UnknownDef => "Supported UnknownDefs",
            Self::EntityDef => "Supported EntityDefs",
            Self::RelationshipDef => "Supported RelationshipDefs",
            Self::ClassificationDef => "Supported ClassificationDefs",
        }
    }
}

impl fmt::Display for TypeDefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive sub-category of a PRIMITIVE attribute type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimitiveDefCategory {
    OmPrimitiveTypeUnknown,
    OmPrimitiveTypeBoolean,
    OmPrimitiveTypeByte,
    OmPrimitiveTypeChar,
    OmPrimitiveTypeShort,
    OmPrimitiveTypeInt,
    OmPrimitiveTypeLong,
    OmPrimitiveTypeFloat,
    OmPrimitiveTypeDouble,
    OmPrimitiveTypeBiginteger,
    OmPrimitiveTypeBigdecimal,
    OmPrimitiveTypeString,
    OmPrimitiveTypeDate,
}

impl PrimitiveDefCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OmPrimitiveTypeUnknown => "OM_PRIMITIVE_TYPE_UNKNOWN",
            Self::OmPrimitiveTypeBoolean => "OM_PRIMITIVE_TYPE_BOOLEAN",
            Self::OmPrimitiveTypeByte => "OM_PRIMITIVE_TYPE_BYTE",
            Self::OmPrimitiveTypeChar => "OM_PRIMITIVE_TYPE_CHAR",
            Self::OmPrimitiveTypeShort => "OM_PRIMITIVE_TYPE_SHORT",
            Self::OmPrimitiveTypeInt => "OM_PRIMITIVE_TYPE_INT",
            Self::OmPrimitiveTypeLong => "OM_PRIMITIVE_TYPE_LONG",
            Self::OmPrimitiveTypeFloat => "OM_PRIMITIVE_TYPE_FLOAT",
            Self::OmPrimitiveTypeDouble => "OM_PRIMITIVE_TYPE_DOUBLE",
            Self::OmPrimitiveTypeBiginteger => "OM_PRIMITIVE_TYPE_BIGINTEGER",
            Self::OmPrimitiveTypeBigdecimal => "OM_PRIMITIVE_TYPE_BIGDECIMAL",
            Self::OmPrimitiveTypeString => "OM_PRIMITIVE_TYPE_STRING",
            Self::OmPrimitiveTypeDate => "OM_PRIMITIVE_TYPE_DATE",
        }
    }
}

impl fmt::Display for PrimitiveDefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-category of a COLLECTION attribute type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionDefCategory {
    OmCollectionUnknown,
    OmCollectionMap,
    OmCollectionArray,
    OmCollectionStruct,
}

impl CollectionDefCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OmCollectionUnknown => "OM_COLLECTION_UNKNOWN",
            Self::OmCollectionMap => "OM_COLLECTION_MAP",
            Self::OmCollectionArray => "OM_COLLECTION_ARRAY",
            Self::OmCollectionStruct => "OM_COLLECTION_STRUCT",
        }
    }
}

impl fmt::Display for CollectionDefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One valid value of an ENUM_DEF attribute type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnumElementDef {
    pub ordinal: i32,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Identifier of a type in an external standard (for example a W3C or
/// ISO vocabulary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalStandardMapping {
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub standard_organization: Option<String>,
    #[serde(default)]
    pub standard_type_name: Option<String>,
}

/// Declared attribute type: PRIMITIVE, COLLECTION or ENUM_DEF.
///
/// Category specific fields are only meaningful for their category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeTypeDef {
    #[serde(default)]
    pub category: Option<AttributeTypeDefCategory>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub version_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub primitive_def_category: Option<PrimitiveDefCategory>,

    #[serde(default)]
    pub collection_def_category: Option<CollectionDefCategory>,
    #[serde(default)]
    pub argument_count: u32,
    #[serde(default)]
    pub argument_types: Vec<PrimitiveDefCategory>,

    #[serde(default)]
    pub element_defs: Vec<EnumElementDef>,
    #[serde(default)]
    pub default_value: Option<EnumElementDef>,
}

impl AttributeTypeDef {
    fn base(category: AttributeTypeDefCategory, guid: &str, name: &str) -> Self {
        Self {
            category: Some(category),
            guid: Some(guid.to_string()),
            name: Some(name.to_string()),
            version: 1,
            version_name: Some("1.0".to_string()),
            description: None,
            primitive_def_category: None,
            collection_def_category: None,
            argument_count: 0,
            argument_types: Vec::new(),
            element_defs: Vec::new(),
            default_value: None,
        }
    }

    /// Build a PRIMITIVE definition at version 1 / "1.0"
    pub fn primitive(guid: &str, name: &str, primitive: PrimitiveDefCategory) -> Self {
        Self {
            primitive_def_category: Some(primitive),
            ..Self::base(AttributeTypeDefCategory::Primitive, guid, name)
        }
    }

    /// Build a COLLECTION definition whose argument count matches its argument list
    pub fn collection(
        guid: &str,
        name: &str,
        collection: CollectionDefCategory,
        argument_types: Vec<PrimitiveDefCategory>,
    ) -> Self {
        Self {
            collection_def_category: Some(collection),
            argument_count: argument_types.len() as u32,
            argument_types,
            ..Self::base(AttributeTypeDefCategory::Collection, guid, name)
        }
    }

    /// Build an ENUM_DEF definition; the first element becomes the default
    pub fn enumeration(guid: &str, name: &str, element_defs: Vec<EnumElementDef>) -> Self {
        Self {
            default_value: element_defs.first().cloned(),
            element_defs,
            ..Self::base(AttributeTypeDefCategory::EnumDef, guid, name)
        }
    }

    /// Category label, qualified with the sub-category when one applies.
    ///
    /// `PRIMITIVE<OM_PRIMITIVE_TYPE_STRING>`, `COLLECTION<OM_COLLECTION_MAP>`,
    /// `ENUM_DEF`.
    pub fn category_label(&self) -> String {
        let Some(category) = self.category else {
            return "<null>".to_string();
        };

        let sub = match category {
            AttributeTypeDefCategory::Primitive => self.primitive_def_category.map(|p| p.as_str()),
            AttributeTypeDefCategory::Collection => {
                self.collection_def_category.map(|c| c.as_str())
            }
            _ => None,
        };

        match sub {
            Some(sub) => format!("{}<{}>", category, sub),
            None => category.to_string(),
        }
    }
}

/// Lightweight reference to a type definition by GUID and name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefLink {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TypeDefLink {
    pub fn new(guid: &str, name: &str) -> Self {
        Self {
            guid: Some(guid.to_string()),
            name: Some(name.to_string()),
        }
    }
}

/// Cardinality of a type attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeCardinality {
    #[default]
    AtMostOne,
    ExactlyOne,
    AnyNumberUnordered,
    AnyNumberOrdered,
}

/// An attribute declared by a structural type definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefAttribute {
    pub attribute_name: String,
    pub attribute_type: AttributeTypeDef,
    #[serde(default)]
    pub cardinality: AttributeCardinality,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexable: bool,
}

impl TypeDefAttribute {
    pub fn new(attribute_name: &str, attribute_type: AttributeTypeDef) -> Self {
        Self {
            attribute_name: attribute_name.to_string(),
            attribute_type,
            cardinality: AttributeCardinality::AtMostOne,
            unique: false,
            indexable: true,
        }
    }
}

/// One end of a relationship type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEndDef {
    #[serde(default)]
    pub entity_type: Option<TypeDefLink>,
    #[serde(default)]
    pub attribute_name: Option<String>,
    #[serde(default)]
    pub attribute_cardinality: AttributeCardinality,
}

impl RelationshipEndDef {
    pub fn new(entity_type: TypeDefLink, attribute_name: &str) -> Self {
        Self {
            entity_type: Some(entity_type),
            attribute_name: Some(attribute_name.to_string()),
            attribute_cardinality: AttributeCardinality::AnyNumberUnordered,
        }
    }
}

/// Declared structural type: ENTITY_DEF, RELATIONSHIP_DEF or CLASSIFICATION_DEF.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    #[serde(default)]
    pub category: Option<TypeDefCategory>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub version_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub super_type: Option<TypeDefLink>,
    #[serde(default)]
    pub property_defs: Vec<TypeDefAttribute>,
    #[serde(default)]
    pub external_standard_mappings: Vec<ExternalStandardMapping>,

    /// RELATIONSHIP_DEF ends
    #[serde(default)]
    pub end_def1: Option<RelationshipEndDef>,
    #[serde(default)]
    pub end_def2: Option<RelationshipEndDef>,

    /// CLASSIFICATION_DEF attachment rules
    #[serde(default)]
    pub valid_entity_defs: Vec<TypeDefLink>,
    #[serde(default)]
    pub propagatable: bool,
}

impl TypeDef {
    fn base(category: TypeDefCategory, guid: &str, name: &str) -> Self {
        Self {
            category: Some(category),
            guid: Some(guid.to_string()),
            name: Some(name.to_string()),
            version: 1,
            version_name: Some("1.0".to_string()),
            description: None,
            super_type: None,
            property_defs: Vec::new(),
            external_standard_mappings: Vec::new(),
            end_def1: None,
            end_def2: None,
            valid_entity_defs: Vec::new(),
            propagatable: false,
        }
    }

    pub fn entity(guid: &str, name: &str) -> Self {
        Self::base(TypeDefCategory::EntityDef, guid, name)
    }

    pub fn relationship(
        guid: &str,
        name: &str,
        end_def1: RelationshipEndDef,
        end_def2: RelationshipEndDef,
    ) -> Self {
        Self {
            end_def1: Some(end_def1),
            end_def2: Some(end_def2),
            ..Self::base(TypeDefCategory::RelationshipDef, guid, name)
        }
    }

    pub fn classification(guid: &str, name: &str, valid_entity_defs: Vec<TypeDefLink>) -> Self {
        Self {
            valid_entity_defs,
            ..Self::base(TypeDefCategory::ClassificationDef, guid, name)
        }
    }

    pub fn with_super_type(mut self, super_type: TypeDefLink) -> Self {
        self.super_type = Some(super_type);
        self
    }

    pub fn with_property(mut self, attribute: TypeDefAttribute) -> Self {
        self.property_defs.push(attribute);
        self
    }

    pub fn with_external_mapping(mut self, mapping: ExternalStandardMapping) -> Self {
        self.external_standard_mappings.push(mapping);
        self
    }

    /// Link to this definition, for use as a supertype or valid entity def
    pub fn link(&self) -> TypeDefLink {
        TypeDefLink {
            guid: self.guid.clone(),
            name: self.name.clone(),
        }
    }

    /// Category label used in discovery properties
    pub fn category_label(&self) -> String {
        self.category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "<null>".to_string())
    }
}

/// The complete type system a repository declares.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefGallery {
    #[serde(default)]
    pub attribute_type_defs: Vec<AttributeTypeDef>,
    #[serde(default)]
    pub type_defs: Vec<TypeDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_category_label() {
        let def = AttributeTypeDef::primitive("g1", "string", PrimitiveDefCategory::OmPrimitiveTypeString);
        assert_eq!(def.category_label(), "PRIMITIVE<OM_PRIMITIVE_TYPE_STRING>");
    }

    #[test]
    fn test_collection_category_label_and_arguments() {
        let def = AttributeTypeDef::collection(
            "g2",
            "map<string,string>",
            CollectionDefCategory::OmCollectionMap,
            vec![
                PrimitiveDefCategory::OmPrimitiveTypeString,
                PrimitiveDefCategory::OmPrimitiveTypeString,
            ],
        );
        assert_eq!(def.category_label(), "COLLECTION<OM_COLLECTION_MAP>");
        assert_eq!(def.argument_count, 2);
    }

    #[test]
    fn test_enum_label_has_no_subcategory() {
        let def = AttributeTypeDef::enumeration(
            "g3",
            "Criticality",
            vec![EnumElementDef { ordinal: 0, value: "Low".into(), description: None }],
        );
        assert_eq!(def.category_label(), "ENUM_DEF");
        assert_eq!(def.default_value.as_ref().map(|e| e.ordinal), Some(0));
    }

    #[test]
    fn test_missing_category_label() {
        let mut def = AttributeTypeDef::primitive("g1", "int", PrimitiveDefCategory::OmPrimitiveTypeInt);
        def.category = None;
        assert_eq!(def.category_label(), "<null>");
    }

    #[test]
    fn test_typedef_serde_uses_wire_names() {
        let def = TypeDef::entity("e1", "Asset");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["category"], "ENTITY_DEF");
        assert_eq!(json["versionName"], "1.0");

        let back: TypeDef = serde_json::from_value(json).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_sparse_typedef_deserializes() {
        let def: TypeDef = serde_json::from_str(r#"{"name":"Broken"}"#).unwrap();
        assert!(def.guid.is_none());
        assert!(def.category.is_none());
        assert_eq!(def.version, 0);
    }
}
