//! Resolve the real metadata collection id.

use crate::error::{CaseError, CaseResult};
use crate::test_case::{CaseContext, ConformanceTestCase};
use async_trait::async_trait;

pub const TEST_CASE_ID: &str = "repository-metadata-collection-id";
pub const TEST_CASE_NAME: &str = "Repository metadata collection id";

pub const DISCOVERED_COLLECTION_ID: &str = "metadata collection id";

#[derive(Debug, Clone, Default)]
pub struct MetadataCollectionIdCase;

#[async_trait]
impl ConformanceTestCase for MetadataCollectionIdCase {
    type Output = String;

    fn test_case_id(&self) -> &'static str {
        TEST_CASE_ID
    }

    fn test_case_name(&self) -> &'static str {
        TEST_CASE_NAME
    }

    fn success_message(&self) -> String {
        "Metadata collection id retrieved from the repository".to_string()
    }

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<String> {
        let repo = ctx.collection();
        let collection_id = ctx
            .call("metadataCollectionId", repo.metadata_collection_id())
            .await?
            .ok_or_else(|| {
                CaseError::not_applicable("repository did not report a metadata collection id")
            })?;

        ctx.assert(
            !collection_id.trim().is_empty(),
            "collection-id-not-blank",
            "Metadata collection id is not blank",
        )?;

        ctx.discover(DISCOVERED_COLLECTION_ID, collection_id.clone());
        Ok(collection_id)
    }
}
