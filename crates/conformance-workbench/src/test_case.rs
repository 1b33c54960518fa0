//! Test case base behavior: assertion ledger, discovery property bag, the
//! per-case record and the runner that executes a case exactly once.
//!
//! A test case body is an async function returning [`CaseResult`]. Each
//! assertion goes through [`CaseContext::assert`], which records the check
//! and returns `Err` on a false condition, so `?` stops the body at the first
//! violated clause. Repository calls go through [`CaseContext::call`], which
//! applies the per-call deadline and classifies repository errors.

use crate::error::{CaseError, CaseResult};
use crate::handle::MetadataCollectionHandle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conformance_core::{MetadataCollection, WorkbenchConfig};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument};

// ============================================================================
// Assertion Ledger
// ============================================================================

/// One named contract check and its result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assertion {
    pub id: String,
    pub message: String,
    pub passed: bool,
}

/// Ordered record of the checks a test case made.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AssertionLedger(Vec<Assertion>);

impl AssertionLedger {
    /// Record a check. A false condition ends the test case.
    pub fn check(
        &mut self,
        condition: bool,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> CaseResult<()> {
        let id = id.into();
        let message = message.into();
        self.0.push(Assertion {
            id: id.clone(),
            message: message.clone(),
            passed: condition,
        });

        if condition {
            Ok(())
        } else {
            Err(CaseError::Assertion { id, message })
        }
    }

    pub fn all_passed(&self) -> bool {
        self.0.iter().all(|a| a.passed)
    }

    pub fn first_failure(&self) -> Option<&Assertion> {
        self.0.iter().find(|a| !a.passed)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Assertion> {
        self.0
    }
}

// ============================================================================
// Discovery Property Bag
// ============================================================================

/// Named values a test case publishes, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DiscoveredProperties(serde_json::Map<String, Value>);

impl DiscoveredProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a value; publishing the same key again replaces it in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Names published under `key`, when the value is a list of strings
    pub fn get_names(&self, key: &str) -> Option<Vec<String>> {
        self.0.get(key)?.as_array().map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

// ============================================================================
// Test Case Record
// ============================================================================

/// Terminal outcome of a test case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// Never executed
    NotRun,
    /// Every assertion held
    Passed,
    /// A contract clause was violated or the repository misbehaved
    Failed,
    /// Executed, but the repository does not offer what the case checks
    Skipped,
}

/// Identity of a test case within a workbench run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TestCaseId {
    pub workbench_id: String,
    pub test_case_id: String,
    /// Name of the type the case is parameterized by
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl TestCaseId {
    pub fn new(workbench_id: &str, test_case_id: &str, discriminator: Option<String>) -> Self {
        Self {
            workbench_id: workbench_id.to_string(),
            test_case_id: test_case_id.to_string(),
            discriminator,
        }
    }

    /// `test_case_id`, suffixed with the discriminator when there is one
    pub fn full_id(&self) -> String {
        match &self.discriminator {
            Some(discriminator) => format!("{}-{}", self.test_case_id, discriminator),
            None => self.test_case_id.clone(),
        }
    }
}

impl std::fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_id())
    }
}

/// Permanent record of one test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCaseRecord {
    pub id: TestCaseId,
    pub name: String,
    pub outcome: TestOutcome,
    pub assertions: AssertionLedger,
    pub discovered_properties: DiscoveredProperties,
    #[serde(default)]
    pub success_message: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub skip_reason: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl TestCaseRecord {
    /// Record for a test case that was never executed
    pub fn not_run(id: TestCaseId, name: &str, reason: impl Into<String>) -> Self {
        Self {
            id,
            name: name.to_string(),
            outcome: TestOutcome::NotRun,
            assertions: AssertionLedger::default(),
            discovered_properties: DiscoveredProperties::default(),
            success_message: None,
            failure_message: None,
            skip_reason: Some(reason.into()),
            started_at: None,
            duration_ms: 0,
        }
    }

    pub fn full_id(&self) -> String {
        self.id.full_id()
    }
}

// ============================================================================
// Test Case Contract
// ============================================================================

/// Execution context handed to a test case body.
pub struct CaseContext {
    handle: MetadataCollectionHandle,
    call_timeout: Duration,
    purge_instances: bool,
    ledger: AssertionLedger,
    properties: DiscoveredProperties,
}

impl CaseContext {
    pub fn new(handle: MetadataCollectionHandle, config: &WorkbenchConfig) -> Self {
        Self {
            handle,
            call_timeout: config.call_timeout(),
            purge_instances: config.purge_instances,
            ledger: AssertionLedger::default(),
            properties: DiscoveredProperties::default(),
        }
    }

    /// The metadata collection under test
    pub fn collection(&self) -> Arc<dyn MetadataCollection> {
        self.handle.collection()
    }

    /// Collection id the handle is bound to
    pub fn collection_id(&self) -> &str {
        self.handle.collection_id()
    }

    pub fn purge_instances(&self) -> bool {
        self.purge_instances
    }

    /// Await one repository call under the per-call deadline
    pub async fn call<T, F>(&self, operation: &'static str, call: F) -> CaseResult<T>
    where
        F: Future<Output = conformance_core::Result<T>>,
    {
        debug!("Calling {}", operation);
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(CaseError::from_repository(operation, error)),
            Err(_) => Err(CaseError::Timeout {
                operation,
                timeout: self.call_timeout,
            }),
        }
    }

    /// Record a check; a false condition ends the test case
    pub fn assert(
        &mut self,
        condition: bool,
        id: &str,
        message: impl Into<String>,
    ) -> CaseResult<()> {
        self.ledger.check(condition, id, message)
    }

    /// Record that a value is present and hand it back
    pub fn require<T>(
        &mut self,
        value: Option<T>,
        id: &str,
        message: impl Into<String>,
    ) -> CaseResult<T> {
        self.ledger.check(value.is_some(), id, message)?;
        value.ok_or_else(|| CaseError::Assertion {
            id: id.to_string(),
            message: "value vanished after check".to_string(),
        })
    }

    /// Publish a discovered property
    pub fn discover(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key, value);
    }

    pub fn ledger(&self) -> &AssertionLedger {
        &self.ledger
    }

    pub fn properties(&self) -> &DiscoveredProperties {
        &self.properties
    }

    fn into_parts(self) -> (AssertionLedger, DiscoveredProperties) {
        (self.ledger, self.properties)
    }
}

/// One contract clause run against a metadata collection.
///
/// Implementations are plain descriptors: they own the inputs planned for
/// them and nothing else. `Output` is what later stages consume.
#[async_trait]
pub trait ConformanceTestCase: Send + Sync {
    type Output: Send;

    /// Stable identifier shared by every case of this kind
    fn test_case_id(&self) -> &'static str;

    /// Human readable name of the contract clause
    fn test_case_name(&self) -> &'static str;

    /// Distinguishes cases of the same kind, normally a type name
    fn discriminator(&self) -> Option<String> {
        None
    }

    /// Message recorded when the case passes
    fn success_message(&self) -> String;

    async fn execute(&self, ctx: &mut CaseContext) -> CaseResult<Self::Output>;

    fn id(&self, workbench_id: &str) -> TestCaseId {
        TestCaseId::new(workbench_id, self.test_case_id(), self.discriminator())
    }

    /// Record for this case when it cannot be executed
    fn not_run(&self, workbench_id: &str, reason: impl Into<String>) -> TestCaseRecord
    where
        Self: Sized,
    {
        TestCaseRecord::not_run(self.id(workbench_id), self.test_case_name(), reason)
    }
}

/// Execute a test case exactly once and classify its outcome.
///
/// Errors and panics raised inside the case end only this case.
pub async fn run_case<C>(
    case: &C,
    handle: &MetadataCollectionHandle,
    config: &WorkbenchConfig,
) -> (TestCaseRecord, Option<C::Output>)
where
    C: ConformanceTestCase + ?Sized,
{
    let id = TestCaseId::new(&config.workbench_id, case.test_case_id(), case.discriminator());
    let span = info_span!("test_case", id = %id.full_id());

    async move {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut ctx = CaseContext::new(handle.clone(), config);

        let result = AssertUnwindSafe(case.execute(&mut ctx)).catch_unwind().await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let (ledger, properties) = ctx.into_parts();

        let mut record = TestCaseRecord {
            id,
            name: case.test_case_name().to_string(),
            outcome: TestOutcome::Passed,
            assertions: ledger,
            discovered_properties: properties,
            success_message: None,
            failure_message: None,
            skip_reason: None,
            started_at: Some(started_at),
            duration_ms,
        };

        let output = match result {
            Ok(Ok(output)) => {
                record.success_message = Some(case.success_message());
                debug!("Passed with {} assertions", record.assertions.len());
                Some(output)
            }
            Ok(Err(error)) if error.is_skip() => {
                record.outcome = TestOutcome::Skipped;
                record.skip_reason = Some(error.to_string());
                debug!("Skipped: {}", error);
                None
            }
            Ok(Err(error)) => {
                record.outcome = TestOutcome::Failed;
                record.failure_message = Some(error.to_string());
                warn!("Failed: {}", error);
                None
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                record.outcome = TestOutcome::Failed;
                record.failure_message = Some(format!("Test case panicked: {}", message));
                warn!("Panicked: {}", message);
                None
            }
        };

        (record, output)
    }
    .instrument(span)
    .await
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
