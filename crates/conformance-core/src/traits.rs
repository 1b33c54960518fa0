//! Capability traits a repository implementation exposes to the workbench.

use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// The metadata collection of a repository under test.
///
/// Every call is a single request against the repository. Lookups that find
/// nothing return `Ok(None)`; everything else the repository objects to is an
/// error. `ConformanceError::FunctionNotSupported` marks a capability the
/// repository declines to offer.
#[async_trait]
pub trait MetadataCollection: Send + Sync {
    /// Identifier of the metadata collection, if the repository reports one
    async fn metadata_collection_id(&self) -> Result<Option<String>>;

    // ------------------------------------------------------------------
    // Type system
    // ------------------------------------------------------------------

    /// Every attribute type definition and type definition the repository declares
    async fn get_all_types(&self) -> Result<TypeDefGallery>;

    /// Attribute type definitions of one category
    async fn find_attribute_type_defs_by_category(
        &self,
        category: AttributeTypeDefCategory,
    ) -> Result<Vec<AttributeTypeDef>>;

    /// Type definitions of one category
    async fn find_type_defs_by_category(&self, category: TypeDefCategory) -> Result<Vec<TypeDef>>;

    /// Type definitions mapped to an identifier of an external standard
    async fn find_type_defs_by_external_id(
        &self,
        standard: Option<&str>,
        organization: Option<&str>,
        identifier: Option<&str>,
    ) -> Result<Vec<TypeDef>>;

    async fn get_attribute_type_def_by_name(&self, name: &str) -> Result<Option<AttributeTypeDef>>;

    async fn get_attribute_type_def_by_guid(&self, guid: &str) -> Result<Option<AttributeTypeDef>>;

    async fn get_type_def_by_name(&self, name: &str) -> Result<Option<TypeDef>>;

    async fn get_type_def_by_guid(&self, guid: &str) -> Result<Option<TypeDef>>;

    /// Whether the repository supports this exact attribute type definition
    async fn verify_attribute_type_def(&self, def: &AttributeTypeDef) -> Result<bool>;

    /// Whether the repository supports this exact type definition
    async fn verify_type_def(&self, def: &TypeDef) -> Result<bool>;

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    async fn add_entity(
        &self,
        type_def_guid: &str,
        properties: Option<InstanceProperties>,
        classifications: Vec<Classification>,
        initial_status: Option<InstanceStatus>,
    ) -> Result<EntityDetail>;

    async fn get_entity_detail(&self, guid: &str) -> Result<Option<EntityDetail>>;

    async fn update_entity_properties(
        &self,
        guid: &str,
        properties: InstanceProperties,
    ) -> Result<EntityDetail>;

    /// Soft delete: the entity remains retrievable with status DELETED
    async fn delete_entity(&self, type_def_guid: &str, guid: &str) -> Result<EntityDetail>;

    /// Hard delete
    async fn purge_entity(&self, type_def_guid: &str, guid: &str) -> Result<()>;

    // ------------------------------------------------------------------
    // Classifications
    // ------------------------------------------------------------------

    async fn classify_entity(
        &self,
        entity_guid: &str,
        classification_name: &str,
        properties: Option<InstanceProperties>,
    ) -> Result<EntityDetail>;

    async fn update_entity_classification(
        &self,
        entity_guid: &str,
        classification_name: &str,
        properties: InstanceProperties,
    ) -> Result<EntityDetail>;

    async fn declassify_entity(
        &self,
        entity_guid: &str,
        classification_name: &str,
    ) -> Result<EntityDetail>;

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    async fn add_relationship(
        &self,
        type_def_guid: &str,
        properties: Option<InstanceProperties>,
        entity_one_guid: &str,
        entity_two_guid: &str,
        initial_status: Option<InstanceStatus>,
    ) -> Result<Relationship>;

    async fn get_relationship(&self, guid: &str) -> Result<Option<Relationship>>;

    async fn update_relationship_properties(
        &self,
        guid: &str,
        properties: InstanceProperties,
    ) -> Result<Relationship>;

    async fn delete_relationship(&self, type_def_guid: &str, guid: &str) -> Result<Relationship>;

    async fn purge_relationship(&self, type_def_guid: &str, guid: &str) -> Result<()>;
}

/// Source of metadata collections bound to a collection identifier.
///
/// Acquiring the connector itself (configuration, brokers, transport) happens
/// before the workbench runs; this trait is the hand-off point.
#[async_trait]
pub trait RepositoryConnector: Send + Sync {
    /// Bind a metadata collection to `metadata_collection_id`
    async fn metadata_collection(
        &self,
        metadata_collection_id: &str,
    ) -> Result<Arc<dyn MetadataCollection>>;
}
