//! The contract clauses the workbench runs, one module per test case kind.

pub mod attribute_type_def;
pub mod categories;
pub mod classification_lifecycle;
pub mod collection_id;
pub mod entity_lifecycle;
pub mod external_mappings;
pub mod relationship_lifecycle;
pub mod type_def;
pub mod type_discovery;

pub use attribute_type_def::AttributeTypeDefCase;
pub use categories::{AttributeTypeDefCategoriesCase, TypeDefCategoriesCase};
pub use classification_lifecycle::ClassificationLifecycleCase;
pub use collection_id::MetadataCollectionIdCase;
pub use entity_lifecycle::EntityLifecycleCase;
pub use external_mappings::ExternalMappingsCase;
pub use relationship_lifecycle::RelationshipLifecycleCase;
pub use type_def::TypeDefCase;
pub use type_discovery::TypeDiscoveryCase;

use crate::error::{CaseError, CaseResult};
use crate::test_case::CaseContext;
use conformance_core::{InstanceProperties, TypeDefAttribute};
use std::panic;
use tracing::warn;

/// Placeholder for a missing name in identifiers and reports
pub const NULL_NAME: &str = "<null>";

pub(crate) fn name_or_null(name: Option<&String>) -> String {
    name.cloned().unwrap_or_else(|| NULL_NAME.to_string())
}

/// Instances a lifecycle case created and still has to remove.
#[derive(Debug, Default)]
pub(crate) struct CreatedInstances {
    entities: Vec<(String, String)>,
    relationships: Vec<(String, String)>,
}

impl CreatedInstances {
    pub(crate) fn entity(&mut self, type_def_guid: &str, guid: &str) {
        self.entities.push((type_def_guid.to_string(), guid.to_string()));
    }

    pub(crate) fn relationship(&mut self, type_def_guid: &str, guid: &str) {
        self.relationships
            .push((type_def_guid.to_string(), guid.to_string()));
    }

    pub(crate) fn forget_entity(&mut self, guid: &str) {
        self.entities.retain(|(_, g)| g != guid);
    }

    pub(crate) fn forget_relationship(&mut self, guid: &str) {
        self.relationships.retain(|(_, g)| g != guid);
    }

    /// Purge whatever is left. Failures are logged, never asserted.
    pub(crate) async fn purge(self, ctx: &CaseContext) {
        if !ctx.purge_instances() {
            return;
        }

        let repo = ctx.collection();
        for (type_guid, guid) in self.relationships {
            if let Err(e) = ctx
                .call("purgeRelationship", repo.purge_relationship(&type_guid, &guid))
                .await
            {
                warn!("Could not purge relationship {}: {}", guid, e);
            }
        }
        for (type_guid, guid) in self.entities {
            if let Err(e) = ctx
                .call("purgeEntity", repo.purge_entity(&type_guid, &guid))
                .await
            {
                warn!("Could not purge entity {}: {}", guid, e);
            }
        }
    }
}

/// Purge what a lifecycle created, then hand back its outcome. A panic
/// caught while the lifecycle ran is resumed after the purge.
pub(crate) async fn purge_then_resume<T>(
    ctx: &CaseContext,
    created: CreatedInstances,
    outcome: std::thread::Result<CaseResult<T>>,
) -> CaseResult<T> {
    created.purge(ctx).await;
    match outcome {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// A type that declares properties none of which can be given a value
/// cannot reach its property-carrying states.
pub(crate) fn require_synthesizable(
    type_name: &str,
    attributes: &[TypeDefAttribute],
    synthesized: &InstanceProperties,
) -> CaseResult<()> {
    if !attributes.is_empty() && synthesized.is_empty() {
        return Err(CaseError::not_applicable(format!(
            "none of the {} properties declared by {} can be synthesized",
            attributes.len(),
            type_name
        )));
    }
    Ok(())
}

/// Turn a "not supported" result into `None`; used for optional steps such
/// as soft delete
pub(crate) fn tolerate_unsupported<T>(result: CaseResult<T>) -> CaseResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CaseError::NotSupported { operation, .. }) => {
            tracing::debug!("{} not supported, continuing with purge", operation);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
