//! Workbench orchestrator.
//!
//! Stages run in a fixed order and hand their discoveries forward through a
//! [`RunContext`]. Every stage takes the context by value and returns it,
//! together with the records of the cases it ran:
//!
//! 1. type discovery
//! 2. per-type contract checks (fan-out)
//! 3. category partition cross-checks
//! 4. entity, relationship and classification lifecycles (fan-out)
//! 5. external standard mappings
//!
//! A single-case stage whose inputs are missing is recorded as not run. A
//! fan-out stage with no inputs plans zero cases.

use crate::cases::{
    AttributeTypeDefCategoriesCase, ExternalMappingsCase, MetadataCollectionIdCase,
    TypeDefCategoriesCase, TypeDiscoveryCase,
};
use crate::handle::MetadataCollectionHandle;
use crate::planner::{self, TypeDefPartition};
use crate::properties::TypeCatalog;
use crate::result::WorkbenchResult;
use crate::test_case::{run_case, ConformanceTestCase, TestCaseRecord};
use conformance_core::{RepositoryConnector, TypeDefGallery, WorkbenchConfig};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// What earlier stages learned about the repository.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub collection_id: String,
    /// Complete type system, once discovery succeeded
    pub gallery: Option<TypeDefGallery>,
    /// Structural types split by category, once the partition stage ran
    pub partition: Option<TypeDefPartition>,
    pub catalog: Option<Arc<TypeCatalog>>,
}

impl RunContext {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            gallery: None,
            partition: None,
            catalog: None,
        }
    }
}

/// Drives one repository connector through the conformance contract.
pub struct Workbench {
    connector: Arc<dyn RepositoryConnector>,
    config: WorkbenchConfig,
}

impl Workbench {
    pub fn new(connector: Arc<dyn RepositoryConnector>, config: WorkbenchConfig) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// Run every stage and aggregate the outcome.
    ///
    /// Never fails: setup problems produce an empty or skipped-only result.
    pub async fn run(&self) -> WorkbenchResult {
        let span = info_span!("workbench", id = %self.config.workbench_id);
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> WorkbenchResult {
        let workbench_id = self.config.workbench_id.as_str();
        let mut records = Vec::new();

        let placeholder = match MetadataCollectionHandle::acquire(
            self.connector.as_ref(),
            &self.config.placeholder_collection_id,
            self.config.call_timeout(),
        )
        .await
        {
            Ok(handle) => handle,
            Err(e) => {
                error!("Could not obtain a metadata collection: {}", e);
                return WorkbenchResult::empty(workbench_id);
            }
        };

        let (record, collection_id) =
            run_case(&MetadataCollectionIdCase, &placeholder, &self.config).await;
        records.push(record);

        let Some(collection_id) = collection_id else {
            warn!("Metadata collection id unresolved, skipping remaining stages");
            records.extend(self.not_run_fixed_stages("metadata collection id was not resolved"));
            return WorkbenchResult::from_records(workbench_id, records);
        };
        info!("Testing metadata collection {}", collection_id);

        let handle = match MetadataCollectionHandle::acquire(
            self.connector.as_ref(),
            &collection_id,
            self.config.call_timeout(),
        )
        .await
        {
            Ok(handle) => handle,
            Err(e) => {
                error!("Could not rebind to metadata collection {}: {}", collection_id, e);
                records.extend(self.not_run_fixed_stages(&format!(
                    "metadata collection {} could not be obtained: {}",
                    collection_id, e
                )));
                return WorkbenchResult::from_records(workbench_id, records);
            }
        };

        let ctx = RunContext::new(collection_id);

        let (ctx, stage) = self.type_discovery_stage(ctx, &handle).await;
        records.extend(stage);

        let (ctx, stage) = self.type_contract_stage(ctx, &handle).await;
        records.extend(stage);

        let (ctx, stage) = self.category_stage(ctx, &handle).await;
        records.extend(stage);

        let (ctx, stage) = self.lifecycle_stage(ctx, &handle).await;
        records.extend(stage);

        let (_ctx, stage) = self.external_mapping_stage(ctx, &handle).await;
        records.extend(stage);

        let result = WorkbenchResult::from_records(workbench_id, records);
        let summary = result.summary();
        info!(
            "Workbench finished: {} passed, {} failed, {} skipped",
            summary.passed, summary.failed, summary.skipped
        );
        result
    }

    /// Placeholders for the single-case stages when nothing after collection
    /// id resolution can run
    fn not_run_fixed_stages(&self, reason: &str) -> Vec<TestCaseRecord> {
        let workbench_id = self.config.workbench_id.as_str();
        vec![
            TypeDiscoveryCase.not_run(workbench_id, reason),
            AttributeTypeDefCategoriesCase::new(Vec::new()).not_run(workbench_id, reason),
            TypeDefCategoriesCase::new(Vec::new()).not_run(workbench_id, reason),
            ExternalMappingsCase::new(Vec::new()).not_run(workbench_id, reason),
        ]
    }

    async fn type_discovery_stage(
        &self,
        mut ctx: RunContext,
        handle: &MetadataCollectionHandle,
    ) -> (RunContext, Vec<TestCaseRecord>) {
        let (record, gallery) = run_case(&TypeDiscoveryCase, handle, &self.config).await;

        match &gallery {
            Some(gallery) => info!(
                "Discovered {} attribute type definitions and {} type definitions",
                gallery.attribute_type_defs.len(),
                gallery.type_defs.len()
            ),
            None => warn!("Type discovery did not complete"),
        }
        ctx.gallery = gallery;
        (ctx, vec![record])
    }

    async fn type_contract_stage(
        &self,
        ctx: RunContext,
        handle: &MetadataCollectionHandle,
    ) -> (RunContext, Vec<TestCaseRecord>) {
        let Some(gallery) = &ctx.gallery else {
            return (ctx, Vec::new());
        };

        let attribute_cases = planner::plan_attribute_type_def_cases(&gallery.attribute_type_defs);
        let type_cases = planner::plan_type_def_cases(&gallery.type_defs);
        info!(
            "Checking {} attribute type definitions and {} type definitions",
            attribute_cases.len(),
            type_cases.len()
        );

        let mut records = self.run_fan_out(&attribute_cases, handle).await;
        records.extend(self.run_fan_out(&type_cases, handle).await);
        (ctx, records)
    }

    async fn category_stage(
        &self,
        mut ctx: RunContext,
        handle: &MetadataCollectionHandle,
    ) -> (RunContext, Vec<TestCaseRecord>) {
        let workbench_id = self.config.workbench_id.as_str();
        let Some(gallery) = &ctx.gallery else {
            let reason = "type discovery did not complete";
            let records = vec![
                AttributeTypeDefCategoriesCase::new(Vec::new()).not_run(workbench_id, reason),
                TypeDefCategoriesCase::new(Vec::new()).not_run(workbench_id, reason),
            ];
            return (ctx, records);
        };

        let attribute_case = AttributeTypeDefCategoriesCase::new(gallery.attribute_type_defs.clone());
        let type_case = TypeDefCategoriesCase::new(gallery.type_defs.clone());
        let (attribute_record, _) = run_case(&attribute_case, handle, &self.config).await;
        let (type_record, _) = run_case(&type_case, handle, &self.config).await;

        // Lifecycle inputs come from the discovered list, so a failed
        // cross-check does not starve the lifecycle stage.
        let partition = planner::partition_type_defs(&gallery.type_defs);
        info!(
            "{} entity, {} relationship and {} classification definitions to exercise",
            partition.entity_defs.len(),
            partition.relationship_defs.len(),
            partition.classification_defs.len()
        );
        ctx.catalog = Some(Arc::new(TypeCatalog::new(&gallery.type_defs)));
        ctx.partition = Some(partition);

        (ctx, vec![attribute_record, type_record])
    }

    async fn lifecycle_stage(
        &self,
        ctx: RunContext,
        handle: &MetadataCollectionHandle,
    ) -> (RunContext, Vec<TestCaseRecord>) {
        let (Some(partition), Some(catalog)) = (&ctx.partition, &ctx.catalog) else {
            return (ctx, Vec::new());
        };

        let entity_cases = planner::plan_entity_lifecycle_cases(partition, catalog);
        let relationship_cases = planner::plan_relationship_lifecycle_cases(partition, catalog);
        let classification_cases = planner::plan_classification_lifecycle_cases(partition, catalog);

        let mut records = self.run_fan_out(&entity_cases, handle).await;
        records.extend(self.run_fan_out(&relationship_cases, handle).await);
        records.extend(self.run_fan_out(&classification_cases, handle).await);
        (ctx, records)
    }

    async fn external_mapping_stage(
        &self,
        ctx: RunContext,
        handle: &MetadataCollectionHandle,
    ) -> (RunContext, Vec<TestCaseRecord>) {
        let Some(gallery) = &ctx.gallery else {
            let record = ExternalMappingsCase::new(Vec::new())
                .not_run(&self.config.workbench_id, "type discovery did not complete");
            return (ctx, vec![record]);
        };

        let case = ExternalMappingsCase::new(gallery.type_defs.clone());
        let (record, _) = run_case(&case, handle, &self.config).await;
        (ctx, vec![record])
    }

    /// Run independent cases with at most `max_parallel_cases` in flight.
    ///
    /// Records come back in plan order whatever the completion order.
    async fn run_fan_out<C>(&self, cases: &[C], handle: &MetadataCollectionHandle) -> Vec<TestCaseRecord>
    where
        C: ConformanceTestCase,
    {
        stream::iter(cases)
            .map(|case| async move { run_case(case, handle, &self.config).await.0 })
            .buffered(self.config.max_parallel_cases.max(1))
            .collect()
            .await
    }
}
