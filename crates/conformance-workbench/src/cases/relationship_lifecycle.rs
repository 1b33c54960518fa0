//! Relationship instance lifecycle between two freshly created end entities.

use super::entity_lifecycle::check_new_entity;
use super::{
    name_or_null, purge_then_resume, require_synthesizable, tolerate_unsupported, CreatedInstances,
    NULL_NAME,
};
use crate::error::CaseResult;
use crate::properties::{synthesize_properties, PropertyVariant, TypeCatalog};
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::{EntityDetail, InstanceStatus, RelationshipEndDef, TypeDef};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub const TEST_CASE_ID: &str = "repository-relationship-lifecycle";
pub const TEST_CASE_NAME: &str = "Repository relationship lifecycle";

#[derive(Debug, Clone)]
pub struct RelationshipLifecycleCase {
    relationship_def: TypeDef,
    entity_defs: Arc<BTreeMap<String, TypeDef>>,
    catalog: Arc<TypeCatalog>,
}

impl RelationshipLifecycleCase {
    pub fn new(
        relationship_def: TypeDef,
        entity_defs: Arc<BTreeMap<String, TypeDef>>,
        catalog: Arc<TypeCatalog>,
    ) -> Self {
        Self {
            relationship_def,
            entity_defs,
            catalog,
        }
    }

    /// Resolve the entity type declared for one end
    fn end_entity_def(
        &self,
        ctx: &mut CaseContext,
        end: Option<&RelationshipEndDef>,
        label: &str,
    ) -> CaseResult<TypeDef> {
        let end_type = ctx.require(
            end.and_then(|e| e.entity_type.as_ref())
                .and_then(|t| t.name.clone()),
            &format!("{}-entity-type-declared", label),
            format!("Relationship {} declares an entity type", label),
        )?;
        ctx.require(
            self.entity_defs.get(&end_type).cloned(),
            &format!("{}-entity-type-known", label),
            format!("{} entity type {} was discovered", label, end_type),
        )
    }

    async fn create_end(
        &self,
        ctx: &mut CaseContext,
        created: &mut CreatedInstances,
        entity_def: &TypeDef,
    ) -> CaseResult<EntityDetail> {
        let type_name = ctx.require(
            entity_def.name.clone(),
            "end-entity-def-name-present",
            "End EntityDef has a name",
        )?;
        let type_guid = ctx.require(
            entity_def.guid.clone(),
            "end-entity-def-guid-present",
            "End EntityDef has a GUID",
        )?;
        let properties = synthesize_properties(
            &self.catalog.all_property_defs(entity_def),
            PropertyVariant::Initial,
        );

        let repo = ctx.collection();
        let entity = ctx
            .call(
                "addEntity",
                repo.add_entity(
                    &type_guid,
                    (!properties.is_empty()).then_some(properties),
                    Vec::new(),
                    None,
                ),
            )
            .await?;
        created.entity(&type_guid, &entity.guid);
        check_new_entity(ctx, &entity, &type_name)?;
        Ok(entity)
    }

    async fn exercise(&self, ctx: &mut CaseContext, created: &mut CreatedInstances) -> CaseResult<()> {
        let def = &self.relationship_def;
        let name = ctx.require(
            def.name.clone(),
            "relationship-def-name-present",
            "RelationshipDef has a name",
        )?;
        let type_guid = ctx.require(
            def.guid.clone(),
            "relationship-def-guid-present",
            "RelationshipDef has a GUID",
        )?;

        let attributes = self.catalog.all_property_defs(def);
        let initial = synthesize_properties(&attributes, PropertyVariant::Initial);
        require_synthesizable(&name, &attributes, &initial)?;
        ctx.discover(format!("{} properties", name), initial.len());

        let end_one_def = self.end_entity_def(ctx, def.end_def1.as_ref(), "end1")?;
        let end_two_def = self.end_entity_def(ctx, def.end_def2.as_ref(), "end2")?;
        let end_one = self.create_end(ctx, created, &end_one_def).await?;
        let end_two = self.create_end(ctx, created, &end_two_def).await?;

        let repo = ctx.collection();
        let relationship = ctx
            .call(
                "addRelationship",
                repo.add_relationship(
                    &type_guid,
                    (!initial.is_empty()).then(|| initial.clone()),
                    &end_one.guid,
                    &end_two.guid,
                    None,
                ),
            )
            .await?;
        created.relationship(&type_guid, &relationship.guid);

        ctx.assert(
            !relationship.guid.is_empty(),
            "relationship-guid-present",
            format!("New {} relationship has a GUID", name),
        )?;
        ctx.assert(
            relationship.type_name() == Some(name.as_str()),
            "relationship-type-matches",
            format!(
                "New relationship has type {} (got {})",
                name,
                relationship.type_name().unwrap_or(NULL_NAME)
            ),
        )?;
        ctx.assert(
            relationship.metadata_collection_id.as_deref() == Some(ctx.collection_id()),
            "relationship-home-collection",
            format!("New {} relationship belongs to the metadata collection under test", name),
        )?;
        ctx.assert(
            relationship.version >= 1,
            "relationship-version-set",
            format!("New {} relationship has a version", name),
        )?;
        ctx.assert(
            relationship.status.is_live(),
            "relationship-status-live",
            format!("New {} relationship has a live status", name),
        )?;
        ctx.assert(
            relationship
                .entity_one_proxy
                .as_ref()
                .is_some_and(|p| p.guid == end_one.guid),
            "relationship-end1-matches",
            format!("{} relationship end 1 is entity {}", name, end_one.guid),
        )?;
        ctx.assert(
            relationship
                .entity_two_proxy
                .as_ref()
                .is_some_and(|p| p.guid == end_two.guid),
            "relationship-end2-matches",
            format!("{} relationship end 2 is entity {}", name, end_two.guid),
        )?;

        let retrieved = ctx
            .call("getRelationship", repo.get_relationship(&relationship.guid))
            .await?;
        ctx.assert(
            retrieved.as_ref() == Some(&relationship),
            "relationship-retrieved",
            format!("Retrieved {} relationship matches the created relationship", name),
        )?;

        if !initial.is_empty() {
            let updated_properties = synthesize_properties(&attributes, PropertyVariant::Updated);
            let updated = ctx
                .call(
                    "updateRelationshipProperties",
                    repo.update_relationship_properties(&relationship.guid, updated_properties.clone()),
                )
                .await?;
            ctx.assert(
                updated.properties.as_ref() == Some(&updated_properties),
                "relationship-properties-updated",
                format!("Updated {} relationship carries the new properties", name),
            )?;
            ctx.assert(
                updated.version > relationship.version,
                "relationship-version-increased",
                format!("{} relationship version increased on update", name),
            )?;
        }

        let deleted = tolerate_unsupported(
            ctx.call(
                "deleteRelationship",
                repo.delete_relationship(&type_guid, &relationship.guid),
            )
            .await,
        )?;
        if let Some(deleted) = deleted {
            ctx.assert(
                deleted.status == InstanceStatus::Deleted,
                "relationship-soft-deleted",
                format!("Deleted {} relationship has status DELETED", name),
            )?;
        }

        if ctx.purge_instances() {
            ctx.call(
                "purgeRelationship",
                repo.purge_relationship(&type_guid, &relationship.guid),
            )
            .await?;
            created.forget_relationship(&relationship.guid);

            let gone = ctx
                .call("getRelationship", repo.get_relationship(&relationship.guid))
                .await?;
            ctx.assert(
                gone.is_none(),
                "relationship-purged",
                format!("Purged {} relationship is no longer retrievable", name),
            )?;
        }

        Ok(())
    }
}

#[async_trait]
impl ConformanceTestCase for RelationshipLifecycleCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn discriminator(&self) -> Option<String> {
        Some(name_or_null(self.relationship_def.name.as_ref()))
    }

    fn success_message(&self) -> String {
        format!(
            "Relationships of type {} link the expected ends through their lifecycle",
            self.relationship_def.name.as_deref().unwrap_or(NULL_NAME)
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
