//! Aggregated outcome of a workbench run.

use crate::test_case::{TestCaseRecord, TestOutcome};
use serde::{Deserialize, Serialize};

/// Every test case of a run, split into three disjoint lists.
///
/// Cases that never ran and cases the repository declined both count as
/// skipped; only contract violations and repository faults are failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkbenchResult {
    pub workbench_id: String,
    pub passed: Vec<TestCaseRecord>,
    pub failed: Vec<TestCaseRecord>,
    pub skipped: Vec<TestCaseRecord>,
}

/// Counts for reporting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub assertions: usize,
}

impl WorkbenchResult {
    pub fn empty(workbench_id: &str) -> Self {
        Self {
            workbench_id: workbench_id.to_string(),
            ..Self::default()
        }
    }

    /// Partition records by outcome, keeping execution order within each list
    pub fn from_records(workbench_id: &str, records: impl IntoIterator<Item = TestCaseRecord>) -> Self {
        let mut result = Self::empty(workbench_id);
        for record in records {
            match record.outcome {
                TestOutcome::Passed => result.passed.push(record),
                TestOutcome::Failed => result.failed.push(record),
                TestOutcome::Skipped | TestOutcome::NotRun => result.skipped.push(record),
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.passed.len() + self.failed.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            total: self.len(),
            passed: self.passed.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
            assertions: self
                .records()
                .map(|r| r.assertions.len())
                .sum(),
        }
    }

    /// All records: passed, then failed, then skipped
    pub fn records(&self) -> impl Iterator<Item = &TestCaseRecord> {
        self.passed
            .iter()
            .chain(self.failed.iter())
            .chain(self.skipped.iter())
    }

    /// Look a record up by its full id, e.g. `repository-type-definition-Asset`
    pub fn find(&self, full_id: &str) -> Option<&TestCaseRecord> {
        self.records().find(|r| r.full_id() == full_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_case::TestCaseId;

    fn record(id: &str, outcome: TestOutcome) -> TestCaseRecord {
        let mut record = TestCaseRecord::not_run(TestCaseId::new("wb", id, None), id, "");
        record.outcome = outcome;
        record
    }

    #[test]
    fn test_partition_by_outcome() {
        let result = WorkbenchResult::from_records(
            "wb",
            vec![
                record("a", TestOutcome::Passed),
                record("b", TestOutcome::Failed),
                record("c", TestOutcome::Skipped),
                record("d", TestOutcome::NotRun),
                record("e", TestOutcome::Passed),
            ],
        );

        assert_eq!(result.passed.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.skipped.len(), 2);
        assert!(result.has_failures());
        assert_eq!(result.summary().total, 5);
        assert_eq!(result.find("d").map(|r| r.outcome), Some(TestOutcome::NotRun));
    }

    #[test]
    fn test_empty_result() {
        let result = WorkbenchResult::empty("wb");
        assert!(result.is_empty());
        assert!(!result.has_failures());
        assert_eq!(result.summary(), ResultSummary::default());
    }

    #[test]
    fn test_json_shape() {
        let result = WorkbenchResult::from_records("wb", vec![record("a", TestOutcome::Passed)]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["workbench_id"], "wb");
        assert_eq!(json["passed"][0]["outcome"], "passed");
        assert!(json["failed"].as_array().unwrap().is_empty());
    }
}
