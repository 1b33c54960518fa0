//! Retrieve the repository's complete type system once.

use super::name_or_null;
use crate::error::CaseResult;
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;
use conformance_core::TypeDefGallery;

pub const TEST_CASE_ID: &str = "repository-type-discovery";
pub const TEST_CASE_NAME: &str = "Repository type definition discovery";

pub const DISCOVERED_ATTRIBUTE_TYPE_DEFS: &str = "AttributeTypeDefs";
pub const DISCOVERED_TYPE_DEFS: &str = "TypeDefs";
pub const DISCOVERED_ATTRIBUTE_TYPE_DEF_COUNT: &str = "Number of AttributeTypeDefs";
pub const DISCOVERED_TYPE_DEF_COUNT: &str = "Number of TypeDefs";

#[derive(Debug, Clone, Default)]
pub struct TypeDiscoveryCase;

#[async_trait]
impl ConformanceTestCase for TypeDiscoveryCase {
    type Output = TypeDefGallery;

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn success_message(&self) -> String {
        "Repository type definitions retrieved".to_string()
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<TypeDefGallery> {
        let repo = ctx.collection();
        let gallery = ctx.call("getAllTypes", repo.get_all_types()).await?;

        let attribute_names: Vec<String> = gallery
            .attribute_type_defs
            .iter()
            .map(|def| name_or_null(def.name.as_ref()))
            .collect();
        let type_names: Vec<String> = gallery
            .type_defs
            .iter()
            .map(|def| name_or_null(def.name.as_ref()))
            .collect();

        ctx.discover(DISCOVERED_ATTRIBUTE_TYPE_DEF_COUNT, attribute_names.len());
        ctx.discover(DISCOVERED_ATTRIBUTE_TYPE_DEFS, attribute_names);
        ctx.discover(DISCOVERED_TYPE_DEF_COUNT, type_names.len());
        ctx.discover(DISCOVERED_TYPE_DEFS, type_names);

        Ok(gallery)
    }
}
