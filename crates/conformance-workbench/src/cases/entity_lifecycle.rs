//! Entity instance lifecycle: create, retrieve, update, delete, purge.

use super::{
    name_or_null, purge_then_resume, require_synthesizable, tolerate_unsupported, CreatedInstances,
    NULL_NAME,
};
use crate::error::CaseResult;
use crate::properties::{synthesize_properties, PropertyVariant, TypeCatalog};
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::{EntityDetail, InstanceStatus, TypeDef};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub const TEST_CASE_ID: &str = "repository-entity-lifecycle";
pub const TEST_CASE_NAME: &str = "Repository entity lifecycle";

#[derive(Debug, Clone)]
pub struct EntityLifecycleCase {
    entity_def: TypeDef,
    catalog: Arc<TypeCatalog>,
}

impl EntityLifecycleCase {
    pub fn new(entity_def: TypeDef, catalog: Arc<TypeCatalog>) -> Self {
        Self {
            entity_def,
            catalog,
        }
    }

    async fn exercise(&self, ctx: &mut CaseContext, created: &mut CreatedInstances) -> CaseResult<()> {
        let def = &self.entity_def;
        let name = ctx.require(def.name.clone(), "entity-def-name-present", "EntityDef has a name")?;
        let type_guid = ctx.require(def.guid.clone(), "entity-def-guid-present", "EntityDef has a GUID")?;

        let attributes = self.catalog.all_property_defs(def);
        let initial = synthesize_properties(&attributes, PropertyVariant::Initial);
        require_synthesizable(&name, &attributes, &initial)?;
        ctx.discover(format!("{} properties", name), initial.len());

        let repo = ctx.collection();
        let entity = ctx
            .call(
                "addEntity",
                repo.add_entity(
                    &type_guid,
                    (!initial.is_empty()).then(|| initial.clone()),
                    Vec::new(),
                    None,
                ),
            )
            .await?;
        created.entity(&type_guid, &entity.guid);

        check_new_entity(ctx, &entity, &name)?;
        if !initial.is_empty() {
            ctx.assert(
                entity.properties.as_ref() == Some(&initial),
                "entity-properties-stored",
                format!("New {} entity carries the properties it was created with", name),
            )?;
        }

        let retrieved = ctx
            .call("getEntityDetail", repo.get_entity_detail(&entity.guid))
            .await?;
        ctx.assert(
            retrieved.as_ref() == Some(&entity),
            "entity-retrieved",
            format!("Retrieved {} entity matches the created entity", name),
        )?;

        if !initial.is_empty() {
            let updated_properties = synthesize_properties(&attributes, PropertyVariant::Updated);
            let updated = ctx
                .call(
                    "updateEntityProperties",
                    repo.update_entity_properties(&entity.guid, updated_properties.clone()),
                )
                .await?;
            ctx.assert(
                updated.properties.as_ref() == Some(&updated_properties),
                "entity-properties-updated",
                format!("Updated {} entity carries the new properties", name),
            )?;
            ctx.assert(
                updated.version > entity.version,
                "entity-version-increased",
                format!(
                    "{} entity version moved from {} to {} on update",
                    name, entity.version, updated.version
                ),
            )?;

            let retrieved = ctx
                .call("getEntityDetail", repo.get_entity_detail(&entity.guid))
                .await?;
            ctx.assert(
                retrieved.as_ref() == Some(&updated),
                "entity-update-retrieved",
                format!("Retrieved {} entity reflects the update", name),
            )?;
        }

        let deleted = tolerate_unsupported(
            ctx.call("deleteEntity", repo.delete_entity(&type_guid, &entity.guid))
                .await,
        )?;
        if let Some(deleted) = deleted {
            ctx.assert(
                deleted.status == InstanceStatus::Deleted,
                "entity-soft-deleted",
                format!("Deleted {} entity has status DELETED", name),
            )?;
        }

        if ctx.purge_instances() {
            ctx.call("purgeEntity", repo.purge_entity(&type_guid, &entity.guid))
                .await?;
            created.forget_entity(&entity.guid);

            let gone = ctx
                .call("getEntityDetail", repo.get_entity_detail(&entity.guid))
                .await?;
            ctx.assert(
                gone.is_none(),
                "entity-purged",
                format!("Purged {} entity is no longer retrievable", name),
            )?;
        }

        Ok(())
    }
}

/// Checks shared by every freshly created entity
pub(crate) fn check_new_entity(ctx: &mut CaseContext, entity: &EntityDetail, type_name: &str) -> CaseResult<()> {
    ctx.assert(
        !entity.guid.is_empty(),
        "entity-guid-present",
        format!("New {} entity has a GUID", type_name),
    )?;
    ctx.assert(
        entity.type_name() == Some(type_name),
        "entity-type-matches",
        format!(
            "New entity has type {} (got {})",
            type_name,
            entity.type_name().unwrap_or(NULL_NAME)
        ),
    )?;
    let home = ctx.collection_id().to_string();
    ctx.assert(
        entity.metadata_collection_id.as_deref() == Some(home.as_str()),
        "entity-home-collection",
        format!("New {} entity belongs to metadata collection {}", type_name, home),
    )?;
    ctx.assert(
        entity.version >= 1,
        "entity-version-set",
        format!("New {} entity has a version", type_name),
    )?;
    ctx.assert(
        entity.status.is_live(),
        "entity-status-live",
        format!("New {} entity has a live status ({:?})", type_name, entity.status),
    )
}

#[async_trait]
impl ConformanceTestCase for EntityLifecycleCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn discriminator(&self) -> Option<String> {
        Some(name_or_null(self.entity_def.name.as_ref()))
    }

    fn success_message(&self) -> String {
        format!(
            "Entities of type {} can be created, retrieved, updated and deleted",
            self.entity_def.name.as_deref().unwrap_or(NULL_NAME)
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
