//! In-memory reference repository.
//!
//! A small but complete metadata collection used by the `conformance` binary
//! as a self-check target and by the test suite as the baseline every fault
//! is injected into. It enforces the rules the workbench checks for: typed
//! instances, properties limited to the declared (and inherited) attributes,
//! relationship ends matching their entity types, classifications limited to
//! their valid entity types, and soft delete before purge being optional.

use crate::properties::TypeCatalog;
use async_trait::async_trait;
use conformance_core::{
    AttributeTypeDef, AttributeTypeDefCategory, Classification, CollectionDefCategory,
    ConformanceError, EntityDetail, EntityProxy, EnumElementDef, ExternalStandardMapping, Guid,
    InstanceProperties, InstanceStatus, InstanceType, MetadataCollection, PrimitiveDefCategory,
    Relationship, RelationshipEndDef, RepositoryConnector, Result, TypeDef, TypeDefAttribute,
    TypeDefCategory, TypeDefGallery,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Metadata collection id the sample repository reports
pub const SAMPLE_COLLECTION_ID: &str = "in-memory-reference-collection";

/// A metadata collection held entirely in memory.
pub struct InMemoryMetadataCollection {
    collection_id: Option<String>,
    gallery: TypeDefGallery,
    catalog: TypeCatalog,
    entities: RwLock<HashMap<String, EntityDetail>>,
    relationships: RwLock<HashMap<String, Relationship>>,
}

impl InMemoryMetadataCollection {
    pub fn new(collection_id: impl Into<String>, gallery: TypeDefGallery) -> Self {
        Self::build(Some(collection_id.into()), gallery)
    }

    /// A collection that never reports its id
    pub fn anonymous(gallery: TypeDefGallery) -> Self {
        Self::build(None, gallery)
    }

    /// The sample type system under [`SAMPLE_COLLECTION_ID`]
    pub fn sample() -> Self {
        Self::new(SAMPLE_COLLECTION_ID, sample_type_system())
    }

    fn build(collection_id: Option<String>, gallery: TypeDefGallery) -> Self {
        let catalog = TypeCatalog::new(&gallery.type_defs);
        Self {
            collection_id,
            gallery,
            catalog,
            entities: RwLock::new(HashMap::new()),
            relationships: RwLock::new(HashMap::new()),
        }
    }

    pub fn gallery(&self) -> &TypeDefGallery {
        &self.gallery
    }

    pub async fn entity_count(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn relationship_count(&self) -> usize {
        self.relationships.read().await.len()
    }

    fn type_def_by_guid(&self, guid: &str, category: TypeDefCategory) -> Result<&TypeDef> {
        self.gallery
            .type_defs
            .iter()
            .find(|d| d.guid.as_deref() == Some(guid) && d.category == Some(category))
            .ok_or_else(|| ConformanceError::type_def_not_known(format!("{} {}", category, guid)))
    }

    fn classification_def(&self, name: &str) -> Result<&TypeDef> {
        self.catalog
            .get(name)
            .filter(|d| d.category == Some(TypeDefCategory::ClassificationDef))
            .ok_or_else(|| ConformanceError::type_def_not_known(format!("classification {}", name)))
    }

    /// Whether `type_name` is `ancestor` or inherits from it
    fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
        let mut current = Some(type_name.to_string());
        let mut hops = 0;
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.catalog.len() {
                return false;
            }
            current = self
                .catalog
                .get(&name)
                .and_then(|d| d.super_type.as_ref())
                .and_then(|s| s.name.clone());
        }
        false
    }

    fn check_properties(&self, def: &TypeDef, properties: &InstanceProperties) -> Result<()> {
        let declared = self.catalog.all_property_defs(def);
        for name in properties.names() {
            if !declared.iter().any(|a| &a.attribute_name == name) {
                return Err(ConformanceError::property(format!(
                    "{} is not an attribute of {}",
                    name,
                    def.name.as_deref().unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    fn check_end(&self, end: Option<&RelationshipEndDef>, entity: &EntityDetail) -> Result<()> {
        let expected = end
            .and_then(|e| e.entity_type.as_ref())
            .and_then(|t| t.name.as_deref())
            .ok_or_else(|| ConformanceError::invalid_parameter("relationship end without entity type"))?;
        let actual = entity.type_name().unwrap_or_default();
        if self.is_a(actual, expected) {
            Ok(())
        } else {
            Err(ConformanceError::invalid_parameter(format!(
                "entity {} of type {} cannot be a {} end",
                entity.guid, actual, expected
            )))
        }
    }

    fn home(&self) -> Option<String> {
        self.collection_id.clone()
    }
}

fn live_entity<'a>(
    entities: &'a mut HashMap<String, EntityDetail>,
    guid: &str,
) -> Result<&'a mut EntityDetail> {
    match entities.get_mut(guid) {
        Some(entity) if entity.status != InstanceStatus::Deleted => Ok(entity),
        Some(_) => Err(ConformanceError::entity_not_known(format!("{} is deleted", guid))),
        None => Err(ConformanceError::entity_not_known(guid)),
    }
}

fn live_relationship<'a>(
    relationships: &'a mut HashMap<String, Relationship>,
    guid: &str,
) -> Result<&'a mut Relationship> {
    match relationships.get_mut(guid) {
        Some(r) if r.status != InstanceStatus::Deleted => Ok(r),
        Some(_) => Err(ConformanceError::relationship_not_known(format!("{} is deleted", guid))),
        None => Err(ConformanceError::relationship_not_known(guid)),
    }
}

fn starting_status(requested: Option<InstanceStatus>) -> Result<InstanceStatus> {
    match requested.unwrap_or(InstanceStatus::Active) {
        status if status.is_live() => Ok(status),
        status => Err(ConformanceError::invalid_parameter(format!(
            "{:?} is not a valid initial status",
            status
        ))),
    }
}

#[async_trait]
impl MetadataCollection for InMemoryMetadataCollection {
    async fn metadata_collection_id(&self) -> Result<Option<String>> {
        Ok(self.collection_id.clone())
    }

    async fn get_all_types(&self) -> Result<TypeDefGallery> {
        Ok(self.gallery.clone())
    }

    async fn find_attribute_type_defs_by_category(
        &self,
        category: AttributeTypeDefCategory,
    ) -> Result<Vec<AttributeTypeDef>> {
        Ok(self
            .gallery
            .attribute_type_defs
            .iter()
            .filter(|d| d.category == Some(category))
            .cloned()
            .collect())
    }

    async fn find_type_defs_by_category(&self, category: TypeDefCategory) -> Result<Vec<TypeDef>> {
        Ok(self
            .gallery
            .type_defs
            .iter()
            .filter(|d| d.category == Some(category))
            .cloned()
            .collect())
    }

    async fn find_type_defs_by_external_id(
        &self,
        standard: Option<&str>,
        organization: Option<&str>,
        identifier: Option<&str>,
    ) -> Result<Vec<TypeDef>> {
        if standard.is_none() && organization.is_none() && identifier.is_none() {
            return Err(ConformanceError::invalid_parameter(
                "at least one external identifier field is required",
            ));
        }

        let matches = |m: &ExternalStandardMapping| {
            standard.is_none_or(|s| m.standard_name.as_deref() == Some(s))
                && organization.is_none_or(|o| m.standard_organization.as_deref() == Some(o))
                && identifier.is_none_or(|i| m.standard_type_name.as_deref() == Some(i))
        };

        Ok(self
            .gallery
            .type_defs
            .iter()
            .filter(|d| d.external_standard_mappings.iter().any(matches))
            .cloned()
            .collect())
    }

    async fn get_attribute_type_def_by_name(&self, name: &str) -> Result<Option<AttributeTypeDef>> {
        Ok(self
            .gallery
            .attribute_type_defs
            .iter()
            .find(|d| d.name.as_deref() == Some(name))
            .cloned())
    }

    async fn get_attribute_type_def_by_guid(&self, guid: &str) -> Result<Option<AttributeTypeDef>> {
        Ok(self
            .gallery
            .attribute_type_defs
            .iter()
            .find(|d| d.guid.as_deref() == Some(guid))
            .cloned())
    }

    async fn get_type_def_by_name(&self, name: &str) -> Result<Option<TypeDef>> {
        Ok(self.catalog.get(name).cloned())
    }

    async fn get_type_def_by_guid(&self, guid: &str) -> Result<Option<TypeDef>> {
        Ok(self
            .gallery
            .type_defs
            .iter()
            .find(|d| d.guid.as_deref() == Some(guid))
            .cloned())
    }

    async fn verify_attribute_type_def(&self, def: &AttributeTypeDef) -> Result<bool> {
        Ok(self.gallery.attribute_type_defs.iter().any(|d| d == def))
    }

    async fn verify_type_def(&self, def: &TypeDef) -> Result<bool> {
        Ok(self.gallery.type_defs.iter().any(|d| d == def))
    }

    async fn add_entity(
        &self,
        type_def_guid: &str,
        properties: Option<InstanceProperties>,
        classifications: Vec<Classification>,
        initial_status: Option<InstanceStatus>,
    ) -> Result<EntityDetail> {
        let def = self.type_def_by_guid(type_def_guid, TypeDefCategory::EntityDef)?;
        let instance_type = InstanceType::from_type_def(def)
            .ok_or_else(|| ConformanceError::type_def_not_known(type_def_guid))?;
        if let Some(properties) = &properties {
            self.check_properties(def, properties)?;
        }
        for classification in &classifications {
            let classification_def = self.classification_def(&classification.name)?;
            if let Some(properties) = &classification.properties {
                self.check_properties(classification_def, properties)?;
            }
        }

        let entity = EntityDetail {
            guid: Guid::new().into_string(),
            metadata_collection_id: self.home(),
            instance_type: Some(instance_type),
            version: 1,
            status: starting_status(initial_status)?,
            properties,
            classifications: Some(classifications),
        };

        debug!("Adding entity {} of type {}", entity.guid, type_def_guid);
        self.entities
            .write()
            .await
            .insert(entity.guid.clone(), entity.clone());
        Ok(entity)
    }

    async fn get_entity_detail(&self, guid: &str) -> Result<Option<EntityDetail>> {
        Ok(self.entities.read().await.get(guid).cloned())
    }

    async fn update_entity_properties(
        &self,
        guid: &str,
        properties: InstanceProperties,
    ) -> Result<EntityDetail> {
        let mut entities = self.entities.write().await;
        let entity = live_entity(&mut entities, guid)?;
        let type_name = entity.type_name().unwrap_or_default().to_string();
        let def = self
            .catalog
            .get(&type_name)
            .ok_or_else(|| ConformanceError::type_def_not_known(type_name.clone()))?;
        self.check_properties(def, &properties)?;

        entity.properties = Some(properties);
        entity.version += 1;
        Ok(entity.clone())
    }

    async fn delete_entity(&self, type_def_guid: &str, guid: &str) -> Result<EntityDetail> {
        let mut entities = self.entities.write().await;
        let entity = live_entity(&mut entities, guid)?;
        if entity.instance_type.as_ref().map(|t| t.type_def_guid.as_str()) != Some(type_def_guid) {
            return Err(ConformanceError::invalid_parameter(format!(
                "entity {} is not of type {}",
                guid, type_def_guid
            )));
        }

        entity.status = InstanceStatus::Deleted;
        entity.version += 1;
        Ok(entity.clone())
    }

    async fn purge_entity(&self, type_def_guid: &str, guid: &str) -> Result<()> {
        let relationships = self.relationships.read().await;
        let attached = relationships.values().any(|r| {
            [&r.entity_one_proxy, &r.entity_two_proxy]
                .into_iter()
                .flatten()
                .any(|p| p.guid == guid)
        });
        if attached {
            return Err(ConformanceError::invalid_parameter(format!(
                "entity {} still has relationships",
                guid
            )));
        }
        drop(relationships);

        let mut entities = self.entities.write().await;
        let type_matches = entities
            .get(guid)
            .map(|e| e.instance_type.as_ref().map(|t| t.type_def_guid.as_str()) == Some(type_def_guid));
        match type_matches {
            Some(true) => {
                entities.remove(guid);
                Ok(())
            }
            Some(false) => Err(ConformanceError::invalid_parameter(format!(
                "entity {} is not of type {}",
                guid, type_def_guid
            ))),
            None => Err(ConformanceError::entity_not_known(guid)),
        }
    }

    async fn classify_entity(
        &self,
        entity_guid: &str,
        classification_name: &str,
        properties: Option<InstanceProperties>,
    ) -> Result<EntityDetail> {
        let classification_def = self.classification_def(classification_name)?;
        if let Some(properties) = &properties {
            self.check_properties(classification_def, properties)?;
        }

        let mut entities = self.entities.write().await;
        let entity = live_entity(&mut entities, entity_guid)?;
        let type_name = entity.type_name().unwrap_or_default().to_string();

        let allowed = classification_def.valid_entity_defs.is_empty()
            || classification_def
                .valid_entity_defs
                .iter()
                .filter_map(|l| l.name.as_deref())
                .any(|valid| self.is_a(&type_name, valid));
        if !allowed {
            return Err(ConformanceError::classification(format!(
                "{} cannot classify entities of type {}",
                classification_name, type_name
            )));
        }
        if entity.classifications_named(classification_name).next().is_some() {
            return Err(ConformanceError::classification(format!(
                "entity {} is already classified as {}",
                entity_guid, classification_name
            )));
        }

        entity
            .classifications
            .get_or_insert_with(Vec::new)
            .push(Classification {
                name: classification_name.to_string(),
                instance_type: InstanceType::from_type_def(classification_def),
                properties,
                status: InstanceStatus::Active,
                version: 1,
            });
        entity.version += 1;
        Ok(entity.clone())
    }

    async fn update_entity_classification(
        &self,
        entity_guid: &str,
        classification_name: &str,
        properties: InstanceProperties,
    ) -> Result<EntityDetail> {
        let classification_def = self.classification_def(classification_name)?;
        self.check_properties(classification_def, &properties)?;

        let mut entities = self.entities.write().await;
        let entity = live_entity(&mut entities, entity_guid)?;
        let classification = entity
            .classifications
            .iter_mut()
            .flatten()
            .find(|c| c.name == classification_name)
            .ok_or_else(|| {
                ConformanceError::classification(format!(
                    "entity {} is not classified as {}",
                    entity_guid, classification_name
                ))
            })?;

        classification.properties = Some(properties);
        classification.version += 1;
        entity.version += 1;
        Ok(entity.clone())
    }

    async fn declassify_entity(
        &self,
        entity_guid: &str,
        classification_name: &str,
    ) -> Result<EntityDetail> {
        let mut entities = self.entities.write().await;
        let entity = live_entity(&mut entities, entity_guid)?;
        let classifications = entity.classifications.get_or_insert_with(Vec::new);
        let before = classifications.len();
        classifications.retain(|c| c.name != classification_name);
        if classifications.len() == before {
            return Err(ConformanceError::classification(format!(
                "entity {} is not classified as {}",
                entity_guid, classification_name
            )));
        }

        entity.version += 1;
        Ok(entity.clone())
    }

    async fn add_relationship(
        &self,
        type_def_guid: &str,
        properties: Option<InstanceProperties>,
        entity_one_guid: &str,
        entity_two_guid: &str,
        initial_status: Option<InstanceStatus>,
    ) -> Result<Relationship> {
        let def = self.type_def_by_guid(type_def_guid, TypeDefCategory::RelationshipDef)?;
        let instance_type = InstanceType::from_type_def(def)
            .ok_or_else(|| ConformanceError::type_def_not_known(type_def_guid))?;
        if let Some(properties) = &properties {
            self.check_properties(def, properties)?;
        }

        let entities = self.entities.read().await;
        let proxy = |guid: &str, end: Option<&RelationshipEndDef>| -> Result<EntityProxy> {
            let entity = entities
                .get(guid)
                .filter(|e| e.status != InstanceStatus::Deleted)
                .ok_or_else(|| ConformanceError::entity_not_known(guid))?;
            self.check_end(end, entity)?;
            Ok(EntityProxy {
                guid: entity.guid.clone(),
                type_name: entity.type_name().map(str::to_string),
            })
        };
        let entity_one_proxy = proxy(entity_one_guid, def.end_def1.as_ref())?;
        let entity_two_proxy = proxy(entity_two_guid, def.end_def2.as_ref())?;
        drop(entities);

        let relationship = Relationship {
            guid: Guid::new().into_string(),
            metadata_collection_id: self.home(),
            instance_type: Some(instance_type),
            version: 1,
            status: starting_status(initial_status)?,
            properties,
            entity_one_proxy: Some(entity_one_proxy),
            entity_two_proxy: Some(entity_two_proxy),
        };

        debug!("Adding relationship {} of type {}", relationship.guid, type_def_guid);
        self.relationships
            .write()
            .await
            .insert(relationship.guid.clone(), relationship.clone());
        Ok(relationship)
    }

    async fn get_relationship(&self, guid: &str) -> Result<Option<Relationship>> {
        Ok(self.relationships.read().await.get(guid).cloned())
    }

    async fn update_relationship_properties(
        &self,
        guid: &str,
        properties: InstanceProperties,
    ) -> Result<Relationship> {
        let mut relationships = self.relationships.write().await;
        let relationship = live_relationship(&mut relationships, guid)?;
        let type_name = relationship.type_name().unwrap_or_default().to_string();
        let def = self
            .catalog
            .get(&type_name)
            .ok_or_else(|| ConformanceError::type_def_not_known(type_name.clone()))?;
        self.check_properties(def, &properties)?;

        relationship.properties = Some(properties);
        relationship.version += 1;
        Ok(relationship.clone())
    }

    async fn delete_relationship(&self, type_def_guid: &str, guid: &str) -> Result<Relationship> {
        let mut relationships = self.relationships.write().await;
        let relationship = live_relationship(&mut relationships, guid)?;
        if relationship.instance_type.as_ref().map(|t| t.type_def_guid.as_str()) != Some(type_def_guid) {
            return Err(ConformanceError::invalid_parameter(format!(
                "relationship {} is not of type {}",
                guid, type_def_guid
            )));
        }

        relationship.status = InstanceStatus::Deleted;
        relationship.version += 1;
        Ok(relationship.clone())
    }

    async fn purge_relationship(&self, type_def_guid: &str, guid: &str) -> Result<()> {
        let mut relationships = self.relationships.write().await;
        let type_matches = relationships
            .get(guid)
            .map(|r| r.instance_type.as_ref().map(|t| t.type_def_guid.as_str()) == Some(type_def_guid));
        match type_matches {
            Some(true) => {
                relationships.remove(guid);
                Ok(())
            }
            Some(false) => Err(ConformanceError::invalid_parameter(format!(
                "relationship {} is not of type {}",
                guid, type_def_guid
            ))),
            None => Err(ConformanceError::relationship_not_known(guid)),
        }
    }
}

/// Hands out one shared in-memory collection whatever id is requested.
pub struct InMemoryConnector {
    collection: Arc<dyn MetadataCollection>,
}

impl InMemoryConnector {
    pub fn new(collection: Arc<dyn MetadataCollection>) -> Self {
        Self { collection }
    }

    pub fn sample() -> Self {
        Self::new(Arc::new(InMemoryMetadataCollection::sample()))
    }
}

#[async_trait]
impl RepositoryConnector for InMemoryConnector {
    async fn metadata_collection(&self, metadata_collection_id: &str) -> Result<Arc<dyn MetadataCollection>> {
        debug!("Binding in-memory collection as {}", metadata_collection_id);
        Ok(Arc::clone(&self.collection))
    }
}

fn element(ordinal: i32, value: &str) -> EnumElementDef {
    EnumElementDef {
        ordinal,
        value: value.to_string(),
        description: None,
    }
}

/// Small type system covering every category the workbench checks.
///
/// Primitives, a map and an array collection, an enum, an entity hierarchy
/// `Referenceable <- Asset`, `Referenceable <- GlossaryTerm`, one relationship
/// and two classifications, one of them carrying properties. `Asset` maps to
/// the Dublin Core `Resource` type.
pub fn sample_type_system() -> TypeDefGallery {
    use PrimitiveDefCategory::*;

    let string = AttributeTypeDef::primitive("b34a64b9-554a-42b1-8f8a-7d5c2339f9c4", "string", OmPrimitiveTypeString);
    let int = AttributeTypeDef::primitive("7fc49104-fd3a-46c8-b6bf-f16b6074cd35", "int", OmPrimitiveTypeInt);
    let boolean = AttributeTypeDef::primitive("3863f010-611c-41fe-aaae-5d4d427f863b", "boolean", OmPrimitiveTypeBoolean);
    let date = AttributeTypeDef::primitive("1bef35ca-d4f9-48db-87c2-afce4649362d", "date", OmPrimitiveTypeDate);
    let string_map = AttributeTypeDef::collection(
        "005c7c14-ac84-4136-beed-959401b041f8",
        "map<string,string>",
        CollectionDefCategory::OmCollectionMap,
        vec![OmPrimitiveTypeString, OmPrimitiveTypeString],
    );
    let string_array = AttributeTypeDef::collection(
        "0428b5d3-f824-459c-b7f5-f8151de59707",
        "array<string>",
        CollectionDefCategory::OmCollectionArray,
        vec![OmPrimitiveTypeString],
    );
    let confidentiality_level = AttributeTypeDef::enumeration(
        "ecb48ca2-4d29-4de9-99a1-bc4db9816d68",
        "ConfidentialityLevel",
        vec![
            element(0, "Unclassified"),
            element(1, "Internal"),
            element(2, "Confidential"),
        ],
    );

    let referenceable = TypeDef::entity("a32316b8-dc8c-48c5-b12b-71c1b2a080bf", "Referenceable")
        .with_property(TypeDefAttribute::new("qualifiedName", string.clone()))
        .with_property(TypeDefAttribute::new("additionalProperties", string_map.clone()));
    let asset = TypeDef::entity("896d14c2-7522-4f6c-8519-757711943fe6", "Asset")
        .with_super_type(referenceable.link())
        .with_property(TypeDefAttribute::new("name", string.clone()))
        .with_property(TypeDefAttribute::new("description", string.clone()))
        .with_external_mapping(ExternalStandardMapping {
            standard_name: Some("Dublin Core".to_string()),
            standard_organization: Some("DCMI".to_string()),
            standard_type_name: Some("Resource".to_string()),
        });
    let glossary_term = TypeDef::entity("0db3e6ec-f5ef-4d75-ae38-b7ee6fd6ec0a", "GlossaryTerm")
        .with_super_type(referenceable.link())
        .with_property(TypeDefAttribute::new("displayName", string.clone()))
        .with_property(TypeDefAttribute::new("examples", string_array.clone()));

    let semantic_assignment = TypeDef::relationship(
        "e6670973-645f-441a-bec7-6f5570345b92",
        "SemanticAssignment",
        RelationshipEndDef::new(referenceable.link(), "assignedElements"),
        RelationshipEndDef::new(glossary_term.link(), "meanings"),
    )
    .with_property(TypeDefAttribute::new("description", string.clone()))
    .with_property(TypeDefAttribute::new("confidence", int.clone()));

    let confidentiality = TypeDef::classification(
        "742ddb7d-9a4a-4eb5-8ac2-1d69953bd2b6",
        "Confidentiality",
        vec![asset.link(), glossary_term.link()],
    )
    .with_property(TypeDefAttribute::new("level", confidentiality_level.clone()))
    .with_property(TypeDefAttribute::new("notes", string.clone()))
    .with_property(TypeDefAttribute::new("reviewed", boolean.clone()))
    .with_property(TypeDefAttribute::new("reviewDate", date.clone()));

    let template = TypeDef::classification(
        "25fad4a2-c2d6-440d-a5b1-e537881f84ee",
        "Template",
        vec![referenceable.link()],
    );

    TypeDefGallery {
        attribute_type_defs: vec![
            string,
            int,
            boolean,
            date,
            string_map,
            string_array,
            confidentiality_level,
        ],
        type_defs: vec![
            referenceable,
            asset,
            glossary_term,
            semantic_assignment,
            confidentiality,
            template,
        ],
    }
}
