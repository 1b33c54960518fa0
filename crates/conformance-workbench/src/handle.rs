//! Binding between a repository connector and one metadata collection id.

use conformance_core::{ConformanceError, MetadataCollection, RepositoryConnector, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A metadata collection bound to a collection identifier for one run.
#[derive(Clone)]
pub struct MetadataCollectionHandle {
    collection_id: String,
    collection: Arc<dyn MetadataCollection>,
}

impl MetadataCollectionHandle {
    pub fn new(collection_id: impl Into<String>, collection: Arc<dyn MetadataCollection>) -> Self {
        Self {
            collection_id: collection_id.into(),
            collection,
        }
    }

    /// Ask the connector for a metadata collection bound to `collection_id`.
    ///
    /// A connector that does not answer within `timeout` is reported as a
    /// `ConformanceError::Timeout`.
    pub async fn acquire(
        connector: &dyn RepositoryConnector,
        collection_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        debug!("Acquiring metadata collection bound to {}", collection_id);
        let collection = tokio::time::timeout(timeout, connector.metadata_collection(collection_id))
            .await
            .map_err(|_| {
                ConformanceError::timeout(format!(
                    "connector did not bind metadata collection {} within {:?}",
                    collection_id, timeout
                ))
            })??;
        Ok(Self::new(collection_id, collection))
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn collection(&self) -> Arc<dyn MetadataCollection> {
        Arc::clone(&self.collection)
    }
}

impl std::fmt::Debug for MetadataCollectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCollectionHandle")
            .field("collection_id", &self.collection_id)
            .finish_non_exhaustive()
    }
}
