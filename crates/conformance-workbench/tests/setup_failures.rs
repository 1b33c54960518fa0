//! Runs where the repository cannot be reached or does not identify itself

mod common;

use async_trait::async_trait;
use common::{run_against, run_with_faults, test_config, Faults};
use conformance_core::config::DEFAULT_PLACEHOLDER_COLLECTION_ID;
use conformance_core::{ConformanceError, MetadataCollection, RepositoryConnector, Result};
use conformance_workbench::cases::{categories, collection_id, external_mappings, type_discovery};
use conformance_workbench::reference::{sample_type_system, InMemoryMetadataCollection, SAMPLE_COLLECTION_ID};
use conformance_workbench::{TestOutcome, Workbench};
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Connector {}

    #[async_trait]
    impl RepositoryConnector for Connector {
        async fn metadata_collection(
            &self,
            metadata_collection_id: &str,
        ) -> Result<Arc<dyn MetadataCollection>>;
    }
}

/// Connector that never answers for one collection id
struct HangingConnector {
    hang_on: &'static str,
}

#[async_trait]
impl RepositoryConnector for HangingConnector {
    async fn metadata_collection(
        &self,
        metadata_collection_id: &str,
    ) -> Result<Arc<dyn MetadataCollection>> {
        if metadata_collection_id == self.hang_on {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(Arc::new(InMemoryMetadataCollection::sample()))
    }
}

const FIXED_STAGES: [&str; 4] = [
    type_discovery::TEST_CASE_ID,
    categories::ATTRIBUTE_TEST_CASE_ID,
    categories::TYPE_TEST_CASE_ID,
    external_mappings::TEST_CASE_ID,
];

#[tokio::test]
async fn test_connector_failure_yields_empty_result() {
    let mut connector = MockConnector::new();
    connector
        .expect_metadata_collection()
        .times(1)
        .returning(|_| Err(ConformanceError::connector("repository unreachable")));

    let result = Workbench::new(Arc::new(connector), test_config()).run().await;

    assert!(result.is_empty());
    assert!(!result.has_failures());
    assert_eq!(result.workbench_id, "test-workbench");
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_connector_yields_empty_result() {
    let connector = HangingConnector {
        hang_on: DEFAULT_PLACEHOLDER_COLLECTION_ID,
    };

    let result = Workbench::new(Arc::new(connector), test_config()).run().await;

    assert!(result.is_empty());
    assert!(!result.has_failures());
}

#[tokio::test]
async fn test_rebind_failure_marks_fixed_stages_not_run() {
    let mut connector = MockConnector::new();
    connector
        .expect_metadata_collection()
        .withf(|id: &str| id == DEFAULT_PLACEHOLDER_COLLECTION_ID)
        .times(1)
        .returning(|_| {
            Ok(Arc::new(InMemoryMetadataCollection::sample()) as Arc<dyn MetadataCollection>)
        });
    connector
        .expect_metadata_collection()
        .withf(|id: &str| id == SAMPLE_COLLECTION_ID)
        .times(1)
        .returning(|_| Err(ConformanceError::connector("collection moved")));

    let result = Workbench::new(Arc::new(connector), test_config()).run().await;

    assert_eq!(result.passed.len(), 1);
    assert_eq!(result.passed[0].full_id(), collection_id::TEST_CASE_ID);
    assert!(result.failed.is_empty());

    let skipped: Vec<String> = result.skipped.iter().map(|r| r.full_id()).collect();
    assert_eq!(skipped, FIXED_STAGES);
    assert!(result.skipped.iter().all(|r| r.outcome == TestOutcome::NotRun));
    assert!(result.skipped[0]
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("collection moved"));
}

#[tokio::test]
async fn test_missing_collection_id_skips_everything() {
    let collection = InMemoryMetadataCollection::anonymous(sample_type_system());
    let result = run_against(Arc::new(collection), test_config()).await;

    assert!(result.passed.is_empty());
    assert!(result.failed.is_empty());
    assert_eq!(result.skipped.len(), 5);

    let id_record = &result.skipped[0];
    assert_eq!(id_record.full_id(), collection_id::TEST_CASE_ID);
    assert_eq!(id_record.outcome, TestOutcome::Skipped);
    assert!(result.skipped[1..]
        .iter()
        .all(|r| r.outcome == TestOutcome::NotRun));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_discovery_times_out() {
    let faults = Faults {
        hang_on_get_all_types: true,
        ..Faults::default()
    };
    let (result, _) = run_with_faults(faults).await;

    assert_eq!(result.passed.len(), 1);
    assert_eq!(result.failed.len(), 1);

    let discovery = &result.failed[0];
    assert_eq!(discovery.full_id(), type_discovery::TEST_CASE_ID);
    assert!(discovery
        .failure_message
        .as_deref()
        .unwrap()
        .contains("getAllTypes did not complete"));

    // categories and external mappings had nothing to work from
    let skipped: Vec<String> = result.skipped.iter().map(|r| r.full_id()).collect();
    assert_eq!(skipped, FIXED_STAGES[1..]);
    assert!(result.skipped.iter().all(|r| r.outcome == TestOutcome::NotRun));
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_rebind_marks_fixed_stages_not_run() {
    let connector = HangingConnector {
        hang_on: SAMPLE_COLLECTION_ID,
    };

    let result = Workbench::new(Arc::new(connector), test_config()).run().await;

    assert_eq!(result.passed.len(), 1);
    assert_eq!(result.passed[0].full_id(), collection_id::TEST_CASE_ID);
    assert!(result.failed.is_empty());

    let skipped: Vec<String> = result.skipped.iter().map(|r| r.full_id()).collect();
    assert_eq!(skipped, FIXED_STAGES);
    assert!(result.skipped.iter().all(|r| r.outcome == TestOutcome::NotRun));
    assert!(result.skipped[0]
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("did not bind metadata collection"));
}
