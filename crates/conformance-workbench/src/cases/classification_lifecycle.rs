//! Classification lifecycle against every entity type the classification
//! may attach to.
//!
//! For each valid entity type a fresh entity walks
//! `UNCLASSIFIED -> CLASSIFIED(no props) -> CLASSIFIED(with props) -> UNCLASSIFIED`.
//! The property step only runs when the classification declares attributes;
//! one whose attributes cannot be synthesized is skipped. After the loop the number of entity types
//! actually exercised must equal the number declared.

use super::entity_lifecycle::check_new_entity;
use super::{name_or_null, purge_then_resume, require_synthesizable, CreatedInstances, NULL_NAME};
use crate::error::CaseResult;
use crate::properties::{synthesize_properties, PropertyVariant, TypeCatalog};
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::{Classification, EntityDetail, InstanceProperties, TypeDef};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::debug;

pub const TEST_CASE_ID: &str = "repository-classification-lifecycle";
pub const TEST_CASE_NAME: &str = "Repository classification lifecycle";

#[derive(Debug, Clone)]
pub struct ClassificationLifecycleCase {
    classification_def: TypeDef,
    entity_defs: Arc<BTreeMap<String, TypeDef>>,
    catalog: Arc<TypeCatalog>,
}

impl ClassificationLifecycleCase {
    pub fn new(
        classification_def: TypeDef,
        entity_defs: Arc<BTreeMap<String, TypeDef>>,
        catalog: Arc<TypeCatalog>,
    ) -> Self {
        Self {
            classification_def,
            entity_defs,
            catalog,
        }
    }

    /// Classifications of `name` on a returned entity. A missing list is a
    /// contract failure here, not an empty result.
    fn classifications_on<'a>(
        ctx: &mut CaseContext,
        entity: &'a EntityDetail,
        name: &'a str,
        step: &str,
    ) -> CaseResult<Vec<&'a Classification>> {
        ctx.require(
            entity.classifications.as_ref(),
            &format!("{}-classifications-returned", step),
            format!("Entity {} returned after {} lists its classifications", entity.guid, step),
        )?;
        Ok(entity.classifications_named(name).collect())
    }

    /// Walk one entity type through the classification state machine
    async fn exercise_entity_type(
        &self,
        ctx: &mut CaseContext,
        created: &mut CreatedInstances,
        classification_name: &str,
        entity_def: &TypeDef,
        updated_properties: Option<&InstanceProperties>,
    ) -> CaseResult<()> {
        let type_name = ctx.require(
            entity_def.name.clone(),
            "entity-def-name-present",
            "Valid EntityDef has a name",
        )?;
        let type_guid = ctx.require(
            entity_def.guid.clone(),
            "entity-def-guid-present",
            format!("Valid EntityDef {} has a GUID", type_name),
        )?;
        let entity_properties = synthesize_properties(
            &self.catalog.all_property_defs(entity_def),
            PropertyVariant::Initial,
        );

        let repo = ctx.collection();
        let entity = ctx
            .call(
                "addEntity",
                repo.add_entity(
                    &type_guid,
                    (!entity_properties.is_empty()).then_some(entity_properties),
                    Vec::new(),
                    None,
                ),
            )
            .await?;
        created.entity(&type_guid, &entity.guid);
        check_new_entity(ctx, &entity, &type_name)?;

        // UNCLASSIFIED -> CLASSIFIED(no props)
        let classified = ctx
            .call(
                "classifyEntity",
                repo.classify_entity(&entity.guid, classification_name, None),
            )
            .await?;
        let found = Self::classifications_on(ctx, &classified, classification_name, "classify")?;
        ctx.assert(
            found.len() == 1,
            "classified-once",
            format!(
                "{} entity carries exactly one {} classification (found {})",
                type_name,
                classification_name,
                found.len()
            ),
        )?;
        ctx.assert(
            found[0].name == classification_name,
            "classification-name-matches",
            format!("Classification on {} entity is named {}", type_name, classification_name),
        )?;
        ctx.assert(
            found[0].property_count() == 0,
            "classified-without-properties",
            format!(
                "{} classification on {} entity has no properties (found {})",
                classification_name,
                type_name,
                found[0].property_count()
            ),
        )?;

        // CLASSIFIED(no props) -> CLASSIFIED(with props)
        if let Some(properties) = updated_properties {
            let updated = ctx
                .call(
                    "updateEntityClassification",
                    repo.update_entity_classification(
                        &entity.guid,
                        classification_name,
                        properties.clone(),
                    ),
                )
                .await?;
            let found = Self::classifications_on(ctx, &updated, classification_name, "update")?;
            ctx.assert(
                found.len() == 1,
                "classification-updated-in-place",
                format!(
                    "{} entity still carries exactly one {} classification after the update (found {})",
                    type_name,
                    classification_name,
                    found.len()
                ),
            )?;
            ctx.assert(
                found[0].name == classification_name,
                "updated-classification-name-matches",
                format!(
                    "Updated classification on {} entity is named {}",
                    type_name, classification_name
                ),
            )?;
            ctx.assert(
                found[0].property_count() > 0,
                "classification-properties-stored",
                format!(
                    "{} classification on {} entity now carries properties",
                    classification_name, type_name
                ),
            )?;
        }

        // CLASSIFIED -> UNCLASSIFIED
        let declassified = ctx
            .call(
                "declassifyEntity",
                repo.declassify_entity(&entity.guid, classification_name),
            )
            .await?;
        let remaining = declassified.classifications.as_ref().map_or(0, Vec::len);
        ctx.assert(
            remaining == 0,
            "declassified-fully",
            format!(
                "{} entity carries no classifications after declassifying {} (found {})",
                type_name, classification_name, remaining
            ),
        )?;

        Ok(())
    }

    async fn exercise(&self, ctx: &mut CaseContext, created: &mut CreatedInstances) -> CaseResult<()> {
        let def = &self.classification_def;
        let name = ctx.require(
            def.name.clone(),
            "classification-def-name-present",
            "ClassificationDef has a name",
        )?;

        let declared = def.valid_entity_defs.len();
        ctx.assert(
            declared > 0,
            "valid-entity-defs-present",
            format!("Classification {} may be attached to at least one entity type", name),
        )?;

        let attributes = self.catalog.all_property_defs(def);
        let updated_properties = synthesize_properties(&attributes, PropertyVariant::Initial);
        require_synthesizable(&name, &attributes, &updated_properties)?;
        let updated_properties = (!updated_properties.is_empty()).then_some(updated_properties);
        ctx.discover(
            format!("{} properties", name),
            updated_properties.as_ref().map_or(0, InstanceProperties::len),
        );

        let mut exercised = Vec::new();
        for link in &def.valid_entity_defs {
            let Some(entity_def) = link.name.as_ref().and_then(|n| self.entity_defs.get(n)) else {
                debug!(
                    "Valid entity type {} of {} was not discovered",
                    name_or_null(link.name.as_ref()),
                    name
                );
                continue;
            };

            self.exercise_entity_type(ctx, created, &name, entity_def, updated_properties.as_ref())
                .await?;
            exercised.push(name_or_null(entity_def.name.as_ref()));
        }

        ctx.discover(format!("{} valid entity types", name), declared);
        ctx.discover(format!("{} classified entity types", name), exercised.clone());

        ctx.assert(
            exercised.len() == declared,
            "all-valid-entity-types-exercised",
            format!(
                "Classification {} was exercised against {} of {} valid entity types",
                name,
                exercised.len(),
                declared
            ),
        )?;

        Ok(())
    }
}

#[async_trait]
impl ConformanceTestCase for ClassificationLifecycleCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn discriminator(&self) -> Option<String> {
        Some(name_or_null(self.classification_def.name.as_ref()))
    }

    fn success_message(&self) -> String {
        format!(
            "Classification {} attaches, updates in place and detaches on every valid entity type",
            self.classification_def.name.as_deref().unwrap_or(NULL_NAME)
        )
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<()> {
        let mut created = CreatedInstances::default();
        let outcome = AssertUnwindSafe(self.exercise(ctx, &mut created))
            .catch_unwind()
            .await;
        purge_then_resume(ctx, created, outcome).await
    }
}
