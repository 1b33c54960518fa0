//! Test case planning.
//!
//! Planning is pure: each function takes what earlier stages produced and
//! returns the case descriptors to execute. Nothing here touches the
//! repository, so the fan-out can be checked without one.

use crate::cases::{
    AttributeTypeDefCase, ClassificationLifecycleCase, EntityLifecycleCase,
    RelationshipLifecycleCase, TypeDefCase,
};
use crate::properties::TypeCatalog;
use conformance_core::{AttributeTypeDef, TypeDef, TypeDefCategory};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Structural type definitions split by category.
#[derive(Debug, Clone, Default)]
pub struct TypeDefPartition {
    /// Every ENTITY_DEF, in discovery order
    pub entity_defs: Vec<TypeDef>,
    /// Named ENTITY_DEFs, used to resolve relationship ends and classification targets
    pub entity_defs_by_name: Arc<BTreeMap<String, TypeDef>>,
    pub relationship_defs: Vec<TypeDef>,
    pub classification_defs: Vec<TypeDef>,
}

impl TypeDefPartition {
    pub fn len(&self) -> usize {
        self.entity_defs.len() + self.relationship_defs.len() + self.classification_defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split type definitions into entity, relationship and classification lists.
///
/// Definitions without a category, or with the unknown category, land in
/// none of the lists; the per-type contract stage reports them.
pub fn partition_type_defs(type_defs: &[TypeDef]) -> TypeDefPartition {
    let mut partition = TypeDefPartition::default();
    let mut by_name = BTreeMap::new();

    for def in type_defs {
        match def.category {
            Some(TypeDefCategory::EntityDef) => {
                if let Some(name) = &def.name {
                    by_name.insert(name.clone(), def.clone());
                }
                partition.entity_defs.push(def.clone());
            }
            Some(TypeDefCategory::RelationshipDef) => partition.relationship_defs.push(def.clone()),
            Some(TypeDefCategory::ClassificationDef) => {
                partition.classification_defs.push(def.clone())
            }
            Some(TypeDefCategory::UnknownDef) | None => {}
        }
    }

    partition.entity_defs_by_name = Arc::new(by_name);
    partition
}

pub fn plan_attribute_type_def_cases(defs: &[AttributeTypeDef]) -> Vec<AttributeTypeDefCase> {
    defs.iter().cloned().map(AttributeTypeDefCase::new).collect()
}

pub fn plan_type_def_cases(defs: &[TypeDef]) -> Vec<TypeDefCase> {
    defs.iter().cloned().map(TypeDefCase::new).collect()
}

pub fn plan_entity_lifecycle_cases(
    partition: &TypeDefPartition,
    catalog: &Arc<TypeCatalog>,
) -> Vec<EntityLifecycleCase> {
    partition
        .entity_defs
        .iter()
        .map(|def| EntityLifecycleCase::new(def.clone(), Arc::clone(catalog)))
        .collect()
}

pub fn plan_relationship_lifecycle_cases(
    partition: &TypeDefPartition,
    catalog: &Arc<TypeCatalog>,
) -> Vec<RelationshipLifecycleCase> {
    partition
        .relationship_defs
        .iter()
        .map(|def| {
            RelationshipLifecycleCase::new(
                def.clone(),
                Arc::clone(&partition.entity_defs_by_name),
                Arc::clone(catalog),
            )
        })
        .collect()
}

pub fn plan_classification_lifecycle_cases(
    partition: &TypeDefPartition,
    catalog: &Arc<TypeCatalog>,
) -> Vec<ClassificationLifecycleCase> {
    partition
        .classification_defs
        .iter()
        .map(|def| {
            ClassificationLifecycleCase::new(
                def.clone(),
                Arc::clone(&partition.entity_defs_by_name),
                Arc::clone(catalog),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_case::ConformanceTestCase;
    use conformance_core::{RelationshipEndDef, TypeDefLink};
    use proptest::prelude::*;

    fn sample() -> Vec<TypeDef> {
        let asset = TypeDef::entity("e1", "Asset");
        let term = TypeDef::entity("e2", "GlossaryTerm");
        vec![
            asset.clone(),
            term.clone(),
            TypeDef::relationship(
                "r1",
                "SemanticAssignment",
                RelationshipEndDef::new(asset.link(), "assignedElements"),
                RelationshipEndDef::new(term.link(), "meaning"),
            ),
            TypeDef::classification("c1", "Confidentiality", vec![asset.link()]),
        ]
    }

    #[test]
    fn test_partition_by_category() {
        let partition = partition_type_defs(&sample());

        assert_eq!(partition.entity_defs.len(), 2);
        assert_eq!(partition.relationship_defs.len(), 1);
        assert_eq!(partition.classification_defs.len(), 1);
        assert!(partition.entity_defs_by_name.contains_key("GlossaryTerm"));
        assert_eq!(partition.len(), 4);
    }

    #[test]
    fn test_unnamed_entity_still_planned() {
        let mut unnamed = TypeDef::entity("e3", "x");
        unnamed.name = None;
        let partition = partition_type_defs(&[unnamed]);

        assert_eq!(partition.entity_defs.len(), 1);
        assert!(partition.entity_defs_by_name.is_empty());

        let catalog = Arc::new(TypeCatalog::new(&[]));
        let cases = plan_entity_lifecycle_cases(&partition, &catalog);
        assert_eq!(cases[0].discriminator().as_deref(), Some("<null>"));
    }

    #[test]
    fn test_empty_input_plans_nothing() {
        let partition = partition_type_defs(&[]);
        let catalog = Arc::new(TypeCatalog::new(&[]));

        assert!(partition.is_empty());
        assert!(plan_type_def_cases(&[]).is_empty());
        assert!(plan_attribute_type_def_cases(&[]).is_empty());
        assert!(plan_entity_lifecycle_cases(&partition, &catalog).is_empty());
        assert!(plan_relationship_lifecycle_cases(&partition, &catalog).is_empty());
        assert!(plan_classification_lifecycle_cases(&partition, &catalog).is_empty());
    }

    #[test]
    fn test_one_case_per_definition() {
        let defs = sample();
        let cases = plan_type_def_cases(&defs);
        let names: Vec<_> = cases.iter().filter_map(|c| c.discriminator()).collect();

        assert_eq!(names, vec!["Asset", "GlossaryTerm", "SemanticAssignment", "Confidentiality"]);
    }

    fn category_strategy() -> impl Strategy<Value = Option<TypeDefCategory>> {
        prop_oneof![
            Just(Some(TypeDefCategory::EntityDef)),
            Just(Some(TypeDefCategory::RelationshipDef)),
            Just(Some(TypeDefCategory::ClassificationDef)),
        ]
    }

    proptest! {
        #[test]
        fn prop_partition_is_complete(categories in prop::collection::vec(category_strategy(), 0..40)) {
            let defs: Vec<TypeDef> = categories
                .iter()
                .enumerate()
                .map(|(i, category)| {
                    let mut def = TypeDef::entity(&format!("g{}", i), &format!("T{}", i));
                    def.category = *category;
                    if *category == Some(TypeDefCategory::ClassificationDef) {
                        def.valid_entity_defs = vec![TypeDefLink::new("g0", "T0")];
                    }
                    def
                })
                .collect();

            let partition = partition_type_defs(&defs);
            prop_assert_eq!(partition.len(), defs.len());
            prop_assert_eq!(partition.entity_defs_by_name.len(), partition.entity_defs.len());
        }
    }
}
