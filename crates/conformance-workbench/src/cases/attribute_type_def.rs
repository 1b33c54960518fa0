//! Per attribute type definition contract checks.

use super::{name_or_null, NULL_NAME};
use crate::error::CaseResult;
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::{AttributeTypeDef, AttributeTypeDefCategory, CollectionDefCategory};

pub const TEST_CASE_ID: &str = "repository-attribute-type-definition";
pub const TEST_CASE_NAME: &str = "Repository attribute type definition";

/// Contract checks for one attribute type definition the repository declared.
#[derive(Debug, Clone)]
pub struct AttributeTypeDefCase {
    def: AttributeTypeDef,
}

impl AttributeTypeDefCase {
    pub fn new(def: AttributeTypeDef) -> Self {
        Self { def }
    }

    pub fn def(&self) -> &AttributeTypeDef {
        &self.def
    }

    fn check_category_shape(
        &self,
        ctx: &mut CaseContext,
        category: AttributeTypeDefCategory,
    ) -> CaseResult<()> {
        let def = &self.def;
        match category {
            AttributeTypeDefCategory::Primitive => {
                ctx.assert(
                    def.primitive_def_category.is_some(),
                    "primitive-category-present",
                    "PrimitiveDef has a primitive category",
                )?;
            }
            AttributeTypeDefCategory::Collection => {
                ctx.assert(
                    def.collection_def_category.is_some(),
                    "collection-category-present",
                    "CollectionDef has a collection category",
                )?;
                ctx.assert(
                    def.collection_def_category != Some(CollectionDefCategory::OmCollectionUnknown),
                    "collection-category-known",
                    "CollectionDef collection category is not unknown",
                )?;
                ctx.assert(
                    def.argument_count > 0,
                    "collection-argument-count-positive",
                    "CollectionDef declares at least one argument",
                )?;
                ctx.assert(
                    def.argument_count as usize == def.argument_types.len(),
                    "collection-argument-count-matches",
                    format!(
                        "CollectionDef argument count {} matches its {} argument types",
                        def.argument_count,
                        def.argument_types.len()
                    ),
                )?;
            }
            AttributeTypeDefCategory::EnumDef => {
                ctx.assert(
                    !def.element_defs.is_empty(),
                    "enum-elements-present",
                    "EnumDef declares at least one element",
                )?;
            }
            AttributeTypeDefCategory::UnknownDef => {}
        }
        Ok(())
    }
}

#[async_trait]
impl ConformanceTestCase for AttributeTypeDefCase {
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
            "AttributeTypeDef {} matches the contract",
            self.def.name.as_deref().unwrap_or(NULL_NAME)
        )
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<()> {
        let def = &self.def;

        let name = ctx.require(def.name.clone(), "name-present", "AttributeTypeDef has a name")?;
        let guid = ctx.require(def.guid.clone(), "guid-present", "AttributeTypeDef has a GUID")?;
        ctx.assert(def.version != 0, "version-set", "AttributeTypeDef has a version number")?;
        ctx.assert(
            def.version_name.is_some(),
            "version-name-present",
            "AttributeTypeDef has a version name",
        )?;
        let category = ctx.require(
            def.category,
            "category-present",
            "AttributeTypeDef has a category",
        )?;
        ctx.assert(
            category != AttributeTypeDefCategory::UnknownDef,
            "category-known",
            "AttributeTypeDef category is not unknown",
        )?;
        self.check_category_shape(ctx, category)?;

        let repo = ctx.collection();
        let verified = ctx
            .call("verifyAttributeTypeDef", repo.verify_attribute_type_def(def))
            .await?;
        ctx.assert(
            verified,
            "verified",
            format!("Repository verifies AttributeTypeDef {} as supported", name),
        )?;

        let by_name = ctx
            .call("getAttributeTypeDefByName", repo.get_attribute_type_def_by_name(&name))
            .await?;
        ctx.assert(
            by_name.as_ref() == Some(def),
            "retrieved-by-name",
            format!("AttributeTypeDef retrieved by name {} matches", name),
        )?;

        let by_guid = ctx
            .call("getAttributeTypeDefByGUID", repo.get_attribute_type_def_by_guid(&guid))
            .await?;
        ctx.assert(
            by_guid.as_ref() == Some(def),
            "retrieved-by-guid",
            format!("AttributeTypeDef retrieved by GUID {} matches", guid),
        )?;

        ctx.discover(format!("{} category", name), def.category_label());
        if let Some(version_name) = &def.version_name {
            ctx.discover(format!("{} version", name), version_name.clone());
        }

        Ok(())
    }
}
