//! Instance property synthesis for lifecycle test cases.
//!
//! Lifecycle cases need property values that match a type's declared schema,
//! including attributes inherited from supertypes.

use conformance_core::{
    AttributeTypeDef, AttributeTypeDefCategory, CollectionDefCategory, InstanceProperties,
    InstancePropertyValue, PrimitiveDefCategory, TypeDef, TypeDefAttribute,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Fixed timestamp used for date properties (2023-11-14T22:13:20Z)
const SAMPLE_DATE_MILLIS: i64 = 1_700_000_000_000;

/// Named lookup over every discovered type definition.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    by_name: BTreeMap<String, TypeDef>,
}

impl TypeCatalog {
    pub fn new(type_defs: &[TypeDef]) -> Self {
        let by_name = type_defs
            .iter()
            .filter_map(|def| def.name.clone().map(|name| (name, def.clone())))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Attributes declared by `def` and every supertype reachable by name.
    ///
    /// Supertypes come first; a subtype redeclaring an attribute wins.
    pub fn all_property_defs(&self, def: &TypeDef) -> Vec<TypeDefAttribute> {
        let mut chain = vec![def];
        let mut seen = HashSet::new();
        if let Some(name) = &def.name {
            seen.insert(name.clone());
        }

        let mut current = def;
        while let Some(super_name) = current.super_type.as_ref().and_then(|s| s.name.as_ref()) {
            if !seen.insert(super_name.clone()) {
                break;
            }
            match self.by_name.get(super_name) {
                Some(super_def) => {
                    chain.push(super_def);
                    current = super_def;
                }
                None => break,
            }
        }

        let mut attributes: BTreeMap<String, TypeDefAttribute> = BTreeMap::new();
        for def in chain.into_iter().rev() {
            for attribute in &def.property_defs {
                attributes.insert(attribute.attribute_name.clone(), attribute.clone());
            }
        }
        attributes.into_values().collect()
    }
}

/// Which variant of values to produce. Updates must differ from creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyVariant {
    Initial,
    Updated,
}

impl PropertyVariant {
    fn tag(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Updated => "updated",
        }
    }

    fn offset(&self) -> i64 {
        match self {
            Self::Initial => 0,
            Self::Updated => 1,
        }
    }
}

/// Build property values for every attribute whose type can be synthesized.
pub fn synthesize_properties(
    attributes: &[TypeDefAttribute],
    variant: PropertyVariant,
) -> InstanceProperties {
    attributes
        .iter()
        .filter_map(|attribute| {
            synthesize_value(&attribute.attribute_type, &attribute.attribute_name, variant)
                .map(|value| (attribute.attribute_name.clone(), value))
        })
        .collect()
}

/// A value matching `attribute_type`, or `None` for types without a usable shape
pub fn synthesize_value(
    attribute_type: &AttributeTypeDef,
    attribute_name: &str,
    variant: PropertyVariant,
) -> Option<InstancePropertyValue> {
    match attribute_type.category? {
        AttributeTypeDefCategory::Primitive => {
            primitive_value(attribute_type.primitive_def_category?, attribute_name, variant)
        }
        AttributeTypeDefCategory::EnumDef => {
            let element = match variant {
                PropertyVariant::Initial => attribute_type.element_defs.first(),
                PropertyVariant::Updated => attribute_type
                    .element_defs
                    .get(1)
                    .or_else(|| attribute_type.element_defs.first()),
            }?;
            Some(InstancePropertyValue::Enum {
                ordinal: element.ordinal,
                symbolic_name: element.value.clone(),
            })
        }
        AttributeTypeDefCategory::Collection => {
            collection_value(attribute_type, attribute_name, variant)
        }
        AttributeTypeDefCategory::UnknownDef => None,
    }
}

fn primitive_value(
    category: PrimitiveDefCategory,
    attribute_name: &str,
    variant: PropertyVariant,
) -> Option<InstancePropertyValue> {
    use PrimitiveDefCategory::*;

    let offset = variant.offset();
    let value = match category {
        OmPrimitiveTypeUnknown => return None,
        OmPrimitiveTypeBoolean => Value::Bool(variant == PropertyVariant::Initial),
        OmPrimitiveTypeByte => Value::from(1 + offset),
        OmPrimitiveTypeChar => Value::from(if offset == 0 { "a" } else { "b" }),
        OmPrimitiveTypeShort => Value::from(2 + offset),
        OmPrimitiveTypeInt => Value::from(3 + offset),
        OmPrimitiveTypeLong => Value::from(4 + offset),
        OmPrimitiveTypeFloat => Value::from(5.5 + offset as f64),
        OmPrimitiveTypeDouble => Value::from(6.25 + offset as f64),
        OmPrimitiveTypeBiginteger => Value::from(format!("1234567890123456789{}", offset)),
        OmPrimitiveTypeBigdecimal => Value::from(format!("{}.5", 7 + offset)),
        OmPrimitiveTypeString => Value::from(format!("{}-{}", attribute_name, variant.tag())),
        OmPrimitiveTypeDate => Value::from(SAMPLE_DATE_MILLIS + offset * 86_400_000),
    };

    Some(InstancePropertyValue::Primitive { category, value })
}

fn collection_value(
    attribute_type: &AttributeTypeDef,
    attribute_name: &str,
    variant: PropertyVariant,
) -> Option<InstancePropertyValue> {
    match attribute_type.collection_def_category? {
        CollectionDefCategory::OmCollectionMap => {
            let value_category = attribute_type
                .argument_types
                .get(1)
                .copied()
                .unwrap_or(PrimitiveDefCategory::OmPrimitiveTypeString);
            let value = primitive_value(value_category, attribute_name, variant)?;
            let mut values = BTreeMap::new();
            values.insert(format!("{}-key", attribute_name), value);
            Some(InstancePropertyValue::Map { values })
        }
        CollectionDefCategory::OmCollectionArray => {
            let element_category = attribute_type
                .argument_types
                .first()
                .copied()
                .unwrap_or(PrimitiveDefCategory::OmPrimitiveTypeString);
            let value = primitive_value(element_category, attribute_name, variant)?;
            Some(InstancePropertyValue::Array { values: vec![value] })
        }
        CollectionDefCategory::OmCollectionStruct | CollectionDefCategory::OmCollectionUnknown => None,
    }
}
