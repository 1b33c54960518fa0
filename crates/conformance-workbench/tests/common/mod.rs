//! Common test utilities for workbench tests
//!
//! `FaultyCollection` wraps the in-memory reference repository and breaks
//! individual contract clauses on demand, so each test can check that the
//! workbench pins the failure on the right test case.

#![allow(dead_code)]

use async_trait::async_trait;
use conformance_core::{
    AttributeTypeDef, AttributeTypeDefCategory, Classification, ConformanceError, EntityDetail,
    InstanceProperties, InstanceStatus, MetadataCollection, Relationship, RepositoryConnector,
    Result, TypeDef, TypeDefCategory, TypeDefGallery, WorkbenchConfig,
};
use conformance_workbench::reference::{InMemoryMetadataCollection, SAMPLE_COLLECTION_ID};
use conformance_workbench::{Workbench, WorkbenchResult};
use std::sync::Arc;

/// Contract clauses to break.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// `get_all_types` never returns
    pub hang_on_get_all_types: bool,
    /// `verify_type_def` panics for this type name
    pub panic_on_verify: Option<String>,
    /// `get_attribute_type_def_by_guid` returns this definition renamed
    pub rename_attribute_type_by_guid: Option<String>,
    /// `find_attribute_type_defs_by_category` drops results of this category
    pub drop_attribute_category: Option<AttributeTypeDefCategory>,
    /// `update_entity_classification` appends a second classification
    pub duplicate_on_classification_update: bool,
    /// `declassify_entity` reports the classification still attached
    pub keep_classification_on_declassify: bool,
    /// `classify_entity` returns the entity without a classification list
    pub omit_classifications_on_classify: bool,
    /// `delete_entity` and `delete_relationship` are not supported
    pub no_soft_delete: bool,
    /// `get_entity_detail` reports this status for every entity
    pub entity_status_override: Option<InstanceStatus>,
    /// `find_type_defs_by_external_id` finds nothing
    pub lose_external_mappings: bool,
    /// `verify_type_def` reports this type name as unsupported
    pub reject_verify: Option<String>,
    /// `add_relationship` panics after its end entities exist
    pub panic_on_add_relationship: bool,
}

/// Reference repository with injected faults.
pub struct FaultyCollection {
    inner: InMemoryMetadataCollection,
    faults: Faults,
}

impl FaultyCollection {
    pub fn new(inner: InMemoryMetadataCollection, faults: Faults) -> Self {
        Self { inner, faults }
    }

    pub fn sample(faults: Faults) -> Self {
        Self::new(InMemoryMetadataCollection::sample(), faults)
    }

    pub fn inner(&self) -> &InMemoryMetadataCollection {
        &self.inner
    }
}

#[async_trait]
impl MetadataCollection for FaultyCollection {
    async fn metadata_collection_id(&self) -> Result<Option<String>> {
        self.inner.metadata_collection_id().await
    }

    async fn get_all_types(&self) -> Result<TypeDefGallery> {
        if self.faults.hang_on_get_all_types {
            std::future::pending::<()>().await;
        }
        self.inner.get_all_types().await
    }

    async fn find_attribute_type_defs_by_category(
        &self,
        category: AttributeTypeDefCategory,
    ) -> Result<Vec<AttributeTypeDef>> {
        if self.faults.drop_attribute_category == Some(category) {
            return Ok(Vec::new());
        }
        self.inner.find_attribute_type_defs_by_category(category).await
    }

    async fn find_type_defs_by_category(&self, category: TypeDefCategory) -> Result<Vec<TypeDef>> {
        self.inner.find_type_defs_by_category(category).await
    }

    async fn find_type_defs_by_external_id(
        &self,
        standard: Option<&str>,
        organization: Option<&str>,
        identifier: Option<&str>,
    ) -> Result<Vec<TypeDef>> {
        if self.faults.lose_external_mappings {
            return Ok(Vec::new());
        }
        self.inner
            .find_type_defs_by_external_id(standard, organization, identifier)
            .await
    }

    async fn get_attribute_type_def_by_name(&self, name: &str) -> Result<Option<AttributeTypeDef>> {
        self.inner.get_attribute_type_def_by_name(name).await
    }

    async fn get_attribute_type_def_by_guid(&self, guid: &str) -> Result<Option<AttributeTypeDef>> {
        let found = self.inner.get_attribute_type_def_by_guid(guid).await?;
        Ok(match &self.faults.rename_attribute_type_by_guid {
            Some(target) => found.map(|mut def| {
                if def.name.as_deref() == Some(target.as_str()) {
                    def.name = Some(format!("{}-renamed", target));
                }
                def
            }),
            None => found,
        })
    }

    async fn get_type_def_by_name(&self, name: &str) -> Result<Option<TypeDef>> {
        self.inner.get_type_def_by_name(name).await
    }

    async fn get_type_def_by_guid(&self, guid: &str) -> Result<Option<TypeDef>> {
        self.inner.get_type_def_by_guid(guid).await
    }

    async fn verify_attribute_type_def(&self, def: &AttributeTypeDef) -> Result<bool> {
        self.inner.verify_attribute_type_def(def).await
    }

    async fn verify_type_def(&self, def: &TypeDef) -> Result<bool> {
        if let Some(target) = &self.faults.panic_on_verify {
            if def.name.as_deref() == Some(target.as_str()) {
                panic!("verify_type_def exploded on {}", target);
            }
        }
        if let Some(target) = &self.faults.reject_verify {
            if def.name.as_deref() == Some(target.as_str()) {
                return Ok(false);
            }
        }
        self.inner.verify_type_def(def).await
    }

    async fn add_entity(
        &self,
        type_def_guid: &str,
        properties: Option<InstanceProperties>,
        classifications: Vec<Classification>,
        initial_status: Option<InstanceStatus>,
    ) -> Result<EntityDetail> {
        self.inner
            .add_entity(type_def_guid, properties, classifications, initial_status)
            .await
    }

    async fn get_entity_detail(&self, guid: &str) -> Result<Option<EntityDetail>> {
        let found = self.inner.get_entity_detail(guid).await?;
        Ok(match self.faults.entity_status_override {
            Some(status) => found.map(|mut entity| {
                entity.status = status;
                entity
            }),
            None => found,
        })
    }

    async fn update_entity_properties(
        &self,
        guid: &str,
        properties: InstanceProperties,
    ) -> Result<EntityDetail> {
        self.inner.update_entity_properties(guid, properties).await
    }

    async fn delete_entity(&self, type_def_guid: &str, guid: &str) -> Result<EntityDetail> {
        if self.faults.no_soft_delete {
            return Err(ConformanceError::function_not_supported("deleteEntity"));
        }
        self.inner.delete_entity(type_def_guid, guid).await
    }

    async fn purge_entity(&self, type_def_guid: &str, guid: &str) -> Result<()> {
        self.inner.purge_entity(type_def_guid, guid).await
    }

    async fn classify_entity(
        &self,
        entity_guid: &str,
        classification_name: &str,
        properties: Option<InstanceProperties>,
    ) -> Result<EntityDetail> {
        let mut entity = self
            .inner
            .classify_entity(entity_guid, classification_name, properties)
            .await?;
        if self.faults.omit_classifications_on_classify {
            entity.classifications = None;
        }
        Ok(entity)
    }

    async fn update_entity_classification(
        &self,
        entity_guid: &str,
        classification_name: &str,
        properties: InstanceProperties,
    ) -> Result<EntityDetail> {
        let mut entity = self
            .inner
            .update_entity_classification(entity_guid, classification_name, properties)
            .await?;
        if self.faults.duplicate_on_classification_update {
            let copy = entity.classifications_named(classification_name).next().cloned();
            if let (Some(list), Some(copy)) = (entity.classifications.as_mut(), copy) {
                list.push(copy);
            }
        }
        Ok(entity)
    }

    async fn declassify_entity(
        &self,
        entity_guid: &str,
        classification_name: &str,
    ) -> Result<EntityDetail> {
        let before = self.inner.get_entity_detail(entity_guid).await?;
        let mut entity = self
            .inner
            .declassify_entity(entity_guid, classification_name)
            .await?;
        if self.faults.keep_classification_on_declassify {
            entity.classifications = before.and_then(|b| b.classifications);
        }
        Ok(entity)
    }

    async fn add_relationship(
        &self,
        type_def_guid: &str,
        properties: Option<InstanceProperties>,
        entity_one_guid: &str,
        entity_two_guid: &str,
        initial_status: Option<InstanceStatus>,
    ) -> Result<Relationship> {
        if self.faults.panic_on_add_relationship {
            panic!("add_relationship exploded on {}", type_def_guid);
        }
        self.inner
            .add_relationship(
                type_def_guid,
                properties,
                entity_one_guid,
                entity_two_guid,
                initial_status,
            )
            .await
    }

    async fn get_relationship(&self, guid: &str) -> Result<Option<Relationship>> {
        self.inner.get_relationship(guid).await
    }

    async fn update_relationship_properties(
        &self,
        guid: &str,
        properties: InstanceProperties,
    ) -> Result<Relationship> {
        self.inner.update_relationship_properties(guid, properties).await
    }

    async fn delete_relationship(&self, type_def_guid: &str, guid: &str) -> Result<Relationship> {
        if self.faults.no_soft_delete {
            return Err(ConformanceError::function_not_supported("deleteRelationship"));
        }
        self.inner.delete_relationship(type_def_guid, guid).await
    }

    async fn purge_relationship(&self, type_def_guid: &str, guid: &str) -> Result<()> {
        self.inner.purge_relationship(type_def_guid, guid).await
    }
}

/// Connector handing out one shared collection
pub struct SharedConnector(pub Arc<dyn MetadataCollection>);

#[async_trait]
impl RepositoryConnector for SharedConnector {
    async fn metadata_collection(&self, _metadata_collection_id: &str) -> Result<Arc<dyn MetadataCollection>> {
        Ok(Arc::clone(&self.0))
    }
}

/// Configuration with a short call deadline
pub fn test_config() -> WorkbenchConfig {
    WorkbenchConfig {
        workbench_id: "test-workbench".to_string(),
        call_timeout_ms: 2_000,
        ..WorkbenchConfig::default()
    }
}

/// Run the workbench against the sample repository with `faults` injected
pub async fn run_with_faults(faults: Faults) -> (WorkbenchResult, Arc<FaultyCollection>) {
    let collection = Arc::new(FaultyCollection::sample(faults));
    let result = run_against(Arc::clone(&collection) as Arc<dyn MetadataCollection>, test_config()).await;
    (result, collection)
}

/// Run the workbench against any collection
pub async fn run_against(collection: Arc<dyn MetadataCollection>, config: WorkbenchConfig) -> WorkbenchResult {
    Workbench::new(Arc::new(SharedConnector(collection)), config)
        .run()
        .await
}

/// Run the workbench against an in-memory repository declaring `gallery`
pub async fn run_gallery(gallery: TypeDefGallery) -> WorkbenchResult {
    let collection = InMemoryMetadataCollection::new(SAMPLE_COLLECTION_ID, gallery);
    run_against(Arc::new(collection), test_config()).await
}

/// Full ids of the failed test cases
pub fn failed_ids(result: &WorkbenchResult) -> Vec<String> {
    result.failed.iter().map(|r| r.full_id()).collect()
}
