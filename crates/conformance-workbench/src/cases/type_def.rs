//! Per type definition contract checks.

use super::{name_or_null, NULL_NAME};
use crate::error::CaseResult;
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::{RelationshipEndDef, TypeDef, TypeDefCategory};

pub const TEST_CASE_ID: &str = "repository-type-definition";
pub const TEST_CASE_NAME: &str = "Repository type definition";

/// Contract checks for one entity, relationship or classification type.
#[derive(Debug, Clone)]
pub struct TypeDefCase {
    def: TypeDef,
}

impl TypeDefCase {
    pub fn new(def: TypeDef) -> Self {
        Self { def }
    }

    pub fn def(&self) -> &TypeDef {
        &self.def
    }
}

fn end_entity_type(end: Option<&RelationshipEndDef>) -> Option<&String> {
    end?.entity_type.as_ref()?.name.as_ref()
}

#[async_trait]
impl ConformanceTestCase for TypeDefCase {
    type Output = ();

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn discriminator(&self) -> Option<String> {
        Some(name_or_null(self.def.name.as_ref()))
    }

    fn success_message(&self) -> String {
        format!(
            "TypeDef {} matches the contract",
            self.def.name.as_deref().unwrap_or(NULL_NAME)
        )
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<()> {
        let def = &self.def;

        let name = ctx.require(def.name.clone(), "name-present", "TypeDef has a name")?;
        let guid = ctx.require(def.guid.clone(), "guid-present", "TypeDef has a GUID")?;
        ctx.assert(def.version != 0, "version-set", "TypeDef has a version number")?;
        ctx.assert(
            def.version_name.is_some(),
            "version-name-present",
            "TypeDef has a version name",
        )?;
        let category = ctx.require(def.category, "category-present", "TypeDef has a category")?;
        ctx.assert(
            category != TypeDefCategory::UnknownDef,
            "category-known",
            "TypeDef category is not unknown",
        )?;

        if category == TypeDefCategory::RelationshipDef {
            ctx.assert(
                end_entity_type(def.end_def1.as_ref()).is_some(),
                "relationship-end1-present",
                "RelationshipDef declares an entity type for end 1",
            )?;
            ctx.assert(
                end_entity_type(def.end_def2.as_ref()).is_some(),
                "relationship-end2-present",
                "RelationshipDef declares an entity type for end 2",
            )?;
        }

        let repo = ctx.collection();

        if let Some(super_type) = &def.super_type {
            let super_guid = ctx.require(
                super_type.guid.clone(),
                "super-type-guid-present",
                format!("Supertype link of {} carries a GUID", name),
            )?;
            let resolved = ctx
                .call("getTypeDefByGUID", repo.get_type_def_by_guid(&super_guid))
                .await?;
            ctx.assert(
                resolved.is_some_and(|s| s.name == super_type.name),
                "super-type-resolvable",
                format!("Supertype {} of {} is retrievable", super_guid, name),
            )?;
        }

        let verified = ctx.call("verifyTypeDef", repo.verify_type_def(def)).await?;
        ctx.assert(
            verified,
            "verified",
            format!("Repository verifies TypeDef {} as supported", name),
        )?;

        let by_name = ctx
            .call("getTypeDefByName", repo.get_type_def_by_name(&name))
            .await?;
        ctx.assert(
            by_name.as_ref() == Some(def),
            "retrieved-by-name",
            format!("TypeDef retrieved by name {} matches", name),
        )?;

        let by_guid = ctx
            .call("getTypeDefByGUID", repo.get_type_def_by_guid(&guid))
            .await?;
        ctx.assert(
            by_guid.as_ref() == Some(def),
            "retrieved-by-guid",
            format!("TypeDef retrieved by GUID {} matches", guid),
        )?;

        ctx.discover(format!("{} category", name), def.category_label());
        if let Some(version_name) = &def.version_name {
            ctx.discover(format!("{} version", name), version_name.clone());
        }

        Ok(())
    }
}
