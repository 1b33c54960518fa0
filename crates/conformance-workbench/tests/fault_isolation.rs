//! A broken contract clause fails its own test case and nothing else

mod common;

use common::{failed_ids, run_gallery, run_with_faults, Faults};
use conformance_core::{
    AttributeTypeDef, AttributeTypeDefCategory, CollectionDefCategory, InstanceStatus,
    PrimitiveDefCategory, TypeDef, TypeDefAttribute, TypeDefGallery,
};
use conformance_workbench::cases::{
    attribute_type_def, categories, classification_lifecycle, entity_lifecycle, external_mappings,
    relationship_lifecycle, type_def,
};
use conformance_workbench::{TestCaseRecord, TestOutcome, WorkbenchResult};

fn first_failure(record: &TestCaseRecord) -> Option<&str> {
    record.assertions.first_failure().map(|a| a.id.as_str())
}

fn attribute_types(defs: Vec<AttributeTypeDef>) -> TypeDefGallery {
    TypeDefGallery {
        attribute_type_defs: defs,
        type_defs: Vec::new(),
    }
}

/// First failed assertion of the attribute type case for `name`
fn attribute_failure(result: &WorkbenchResult, name: &str) -> Option<String> {
    let id = format!("{}-{}", attribute_type_def::TEST_CASE_ID, name);
    let record = result.find(&id).unwrap();
    assert_eq!(record.outcome, TestOutcome::Failed, "{} did not fail", id);
    first_failure(record).map(str::to_string)
}

// ============================================================================
// Type System Faults
// ============================================================================

#[tokio::test]
async fn test_panic_fails_only_its_case() {
    let faults = Faults {
        panic_on_verify: Some("Asset".to_string()),
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    let asset = format!("{}-Asset", type_def::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![asset.clone()]);

    let record = result.find(&asset).unwrap();
    assert!(record
        .failure_message
        .as_deref()
        .unwrap()
        .starts_with("Test case panicked: verify_type_def exploded on Asset"));

    // later stages still ran, including the Asset entity lifecycle
    let lifecycle = result
        .find(&format!("{}-Asset", entity_lifecycle::TEST_CASE_ID))
        .unwrap();
    assert_eq!(lifecycle.outcome, TestOutcome::Passed);
}

#[tokio::test]
async fn test_mismatched_lookup_by_guid() {
    let faults = Faults {
        rename_attribute_type_by_guid: Some("int".to_string()),
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    let int = format!("{}-int", attribute_type_def::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![int.clone()]);
    assert_eq!(first_failure(result.find(&int).unwrap()), Some("retrieved-by-guid"));
}

#[tokio::test]
async fn test_incomplete_category_listing() {
    let faults = Faults {
        drop_attribute_category: Some(AttributeTypeDefCategory::Collection),
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    assert_eq!(
        failed_ids(&result),
        vec![categories::ATTRIBUTE_TEST_CASE_ID.to_string()]
    );
    let record = result.find(categories::ATTRIBUTE_TEST_CASE_ID).unwrap();
    assert_eq!(first_failure(record), Some("COLLECTION-count-matches"));
}

#[tokio::test]
async fn test_unresolvable_external_mapping() {
    let faults = Faults {
        lose_external_mappings: true,
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    assert_eq!(
        failed_ids(&result),
        vec![external_mappings::TEST_CASE_ID.to_string()]
    );
    let record = result.find(external_mappings::TEST_CASE_ID).unwrap();
    assert_eq!(first_failure(record), Some("external-mapping-resolves"));
}

#[tokio::test]
async fn test_unverified_type_def() {
    let faults = Faults {
        reject_verify: Some("Asset".to_string()),
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    let asset = format!("{}-Asset", type_def::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![asset.clone()]);
    assert_eq!(first_failure(result.find(&asset).unwrap()), Some("verified"));
}

// ============================================================================
// Malformed Definitions
// ============================================================================

#[tokio::test]
async fn test_collection_argument_count_disagrees_with_types() {
    let mut map = AttributeTypeDef::collection(
        "map-guid",
        "map<string,string>",
        CollectionDefCategory::OmCollectionMap,
        vec![
            PrimitiveDefCategory::OmPrimitiveTypeString,
            PrimitiveDefCategory::OmPrimitiveTypeString,
        ],
    );
    map.argument_count = 3;

    let result = run_gallery(attribute_types(vec![map])).await;
    assert_eq!(
        attribute_failure(&result, "map<string,string>").as_deref(),
        Some("collection-argument-count-matches")
    );
}

#[tokio::test]
async fn test_collection_without_arguments() {
    let empty = AttributeTypeDef::collection(
        "array-guid",
        "array<>",
        CollectionDefCategory::OmCollectionArray,
        Vec::new(),
    );

    let result = run_gallery(attribute_types(vec![empty])).await;
    assert_eq!(
        attribute_failure(&result, "array<>").as_deref(),
        Some("collection-argument-count-positive")
    );
}

#[tokio::test]
async fn test_unknown_collection_category() {
    let unknown = AttributeTypeDef::collection(
        "unknown-guid",
        "unknown<string>",
        CollectionDefCategory::OmCollectionUnknown,
        vec![PrimitiveDefCategory::OmPrimitiveTypeString],
    );

    let result = run_gallery(attribute_types(vec![unknown])).await;
    assert_eq!(
        attribute_failure(&result, "unknown<string>").as_deref(),
        Some("collection-category-known")
    );
}

#[tokio::test]
async fn test_enum_without_elements() {
    let empty = AttributeTypeDef::enumeration("enum-guid", "EmptyEnum", Vec::new());

    let result = run_gallery(attribute_types(vec![empty])).await;
    assert_eq!(
        attribute_failure(&result, "EmptyEnum").as_deref(),
        Some("enum-elements-present")
    );
}

#[tokio::test]
async fn test_unknown_attribute_category() {
    let mut unknown = AttributeTypeDef::primitive(
        "odd-guid",
        "odd",
        PrimitiveDefCategory::OmPrimitiveTypeString,
    );
    unknown.category = Some(AttributeTypeDefCategory::UnknownDef);

    let result = run_gallery(attribute_types(vec![unknown])).await;
    assert_eq!(attribute_failure(&result, "odd").as_deref(), Some("category-known"));
}

#[tokio::test]
async fn test_nameless_attribute_type_fails_under_null_name() {
    let mut nameless = AttributeTypeDef::primitive(
        "lost-guid",
        "lost",
        PrimitiveDefCategory::OmPrimitiveTypeString,
    );
    nameless.name = None;
    nameless.guid = None;
    let string = AttributeTypeDef::primitive(
        "string-guid",
        "string",
        PrimitiveDefCategory::OmPrimitiveTypeString,
    );

    let result = run_gallery(attribute_types(vec![nameless, string])).await;

    // the partition still accounts for the nameless definition
    let null = format!("{}-<null>", attribute_type_def::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![null.clone()]);
    assert_eq!(first_failure(result.find(&null).unwrap()), Some("name-present"));

    let partition = result.find(categories::ATTRIBUTE_TEST_CASE_ID).unwrap();
    assert_eq!(partition.outcome, TestOutcome::Passed);
}

#[tokio::test]
async fn test_classification_usable_nowhere() {
    let orphan = TypeDef::classification("orphan-guid", "Orphan", Vec::new());
    let gallery = TypeDefGallery {
        attribute_type_defs: Vec::new(),
        type_defs: vec![orphan],
    };

    let result = run_gallery(gallery).await;

    let id = format!("{}-Orphan", classification_lifecycle::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![id.clone()]);
    assert_eq!(
        first_failure(result.find(&id).unwrap()),
        Some("valid-entity-defs-present")
    );
}

#[tokio::test]
async fn test_classification_with_unsynthesizable_properties_is_skipped() {
    let structure = AttributeTypeDef::collection(
        "struct-guid",
        "struct",
        CollectionDefCategory::OmCollectionStruct,
        Vec::new(),
    );
    let asset = TypeDef::entity("asset-guid", "Asset");
    let conf = TypeDef::classification("conf-guid", "Conf", vec![asset.link()])
        .with_property(TypeDefAttribute::new("level", structure));
    let gallery = TypeDefGallery {
        attribute_type_defs: Vec::new(),
        type_defs: vec![asset, conf],
    };

    let result = run_gallery(gallery).await;
    assert!(!result.has_failures(), "unexpected failures: {:#?}", result.failed);

    let record = result
        .find(&format!("{}-Conf", classification_lifecycle::TEST_CASE_ID))
        .unwrap();
    assert_eq!(record.outcome, TestOutcome::Skipped);
    assert!(record
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("can be synthesized"));
    assert!(record
        .assertions
        .iter()
        .all(|a| a.id != "classified-without-properties"));

    let entity = result
        .find(&format!("{}-Asset", entity_lifecycle::TEST_CASE_ID))
        .unwrap();
    assert_eq!(entity.outcome, TestOutcome::Passed);
}

// ============================================================================
// Instance Faults
// ============================================================================

#[tokio::test]
async fn test_retrieved_entity_differs_from_created() {
    let faults = Faults {
        entity_status_override: Some(InstanceStatus::Proposed),
        ..Faults::default()
    };
    let (result, collection) = run_with_faults(faults).await;

    let failed = failed_ids(&result);
    for name in ["Referenceable", "Asset", "GlossaryTerm"] {
        let id = format!("{}-{}", entity_lifecycle::TEST_CASE_ID, name);
        assert!(failed.contains(&id), "{} did not fail", id);
        assert_eq!(first_failure(result.find(&id).unwrap()), Some("entity-retrieved"));
    }

    // cleanup still ran for the failed cases
    assert_eq!(collection.inner().entity_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_classification_on_update() {
    let faults = Faults {
        duplicate_on_classification_update: true,
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    // only Confidentiality carries properties, so only it is updated
    let confidentiality = format!("{}-Confidentiality", classification_lifecycle::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![confidentiality.clone()]);
    assert_eq!(
        first_failure(result.find(&confidentiality).unwrap()),
        Some("classification-updated-in-place")
    );
}

#[tokio::test]
async fn test_classification_left_after_declassify() {
    let faults = Faults {
        keep_classification_on_declassify: true,
        ..Faults::default()
    };
    let (result, collection) = run_with_faults(faults).await;

    for name in ["Confidentiality", "Template"] {
        let id = format!("{}-{}", classification_lifecycle::TEST_CASE_ID, name);
        let record = result.find(&id).unwrap();
        assert_eq!(record.outcome, TestOutcome::Failed);
        assert_eq!(first_failure(record), Some("declassified-fully"));
    }
    assert_eq!(collection.inner().entity_count().await, 0);
}

#[tokio::test]
async fn test_classify_without_classification_list() {
    let faults = Faults {
        omit_classifications_on_classify: true,
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    let template = format!("{}-Template", classification_lifecycle::TEST_CASE_ID);
    assert_eq!(
        first_failure(result.find(&template).unwrap()),
        Some("classify-classifications-returned")
    );
}

#[tokio::test]
async fn test_soft_delete_is_optional() {
    let faults = Faults {
        no_soft_delete: true,
        ..Faults::default()
    };
    let (result, collection) = run_with_faults(faults).await;

    assert!(!result.has_failures(), "unexpected failures: {:#?}", result.failed);
    assert!(result.skipped.is_empty());

    let asset = result
        .find(&format!("{}-Asset", entity_lifecycle::TEST_CASE_ID))
        .unwrap();
    assert!(asset.assertions.iter().all(|a| a.id != "entity-soft-deleted"));
    assert!(asset.assertions.iter().any(|a| a.id == "entity-purged"));

    assert_eq!(collection.inner().entity_count().await, 0);
    assert_eq!(collection.inner().relationship_count().await, 0);
}

#[tokio::test]
async fn test_panicking_lifecycle_still_purges() {
    let faults = Faults {
        panic_on_add_relationship: true,
        ..Faults::default()
    };
    let (result, collection) = run_with_faults(faults).await;

    let id = format!("{}-SemanticAssignment", relationship_lifecycle::TEST_CASE_ID);
    assert_eq!(failed_ids(&result), vec![id.clone()]);
    assert!(result
        .find(&id)
        .unwrap()
        .failure_message
        .as_deref()
        .unwrap()
        .starts_with("Test case panicked: add_relationship exploded"));

    // both end entities were created before the panic and purged after it
    assert_eq!(collection.inner().entity_count().await, 0);
    assert_eq!(collection.inner().relationship_count().await, 0);
}
