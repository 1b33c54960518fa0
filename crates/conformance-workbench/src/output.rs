//! Terminal and JSON rendering of workbench results.

use crate::result::WorkbenchResult;
use crate::test_case::{TestCaseRecord, TestOutcome};
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Human,
    /// JSON for scripting
    Json,
}

/// Print a success message
pub fn success(msg: impl Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: impl Display) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print a section header
pub fn header(msg: impl Display) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: impl Display, value: impl Display) {
    println!("  {}: {}", style(key).cyan(), value);
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn outcome_cell(outcome: TestOutcome) -> Cell {
    match outcome {
        TestOutcome::Passed => Cell::new("passed").fg(Color::Green),
        TestOutcome::Failed => Cell::new("failed").fg(Color::Red),
        TestOutcome::Skipped => Cell::new("skipped").fg(Color::Yellow),
        TestOutcome::NotRun => Cell::new("not run").fg(Color::DarkGrey),
    }
}

/// One line explaining the outcome of a record
pub fn outcome_detail(record: &TestCaseRecord) -> String {
    match record.outcome {
        TestOutcome::Passed => record.success_message.clone().unwrap_or_default(),
        TestOutcome::Failed => record.failure_message.clone().unwrap_or_default(),
        TestOutcome::Skipped | TestOutcome::NotRun => record.skip_reason.clone().unwrap_or_default(),
    }
}

/// Table of every test case in the result
pub fn result_table(result: &WorkbenchResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Test case", "Outcome", "Assertions", "Time", "Detail"]
                .into_iter()
                .map(|h| Cell::new(h).fg(Color::Cyan)),
        );

    for record in result.records() {
        let passed = record.assertions.iter().filter(|a| a.passed).count();
        table.add_row(vec![
            Cell::new(record.full_id()),
            outcome_cell(record.outcome),
            Cell::new(format!("{}/{}", passed, record.assertions.len())),
            Cell::new(format_duration(Duration::from_millis(record.duration_ms))),
            Cell::new(outcome_detail(record)),
        ]);
    }

    table
}

/// Print a workbench result in the requested format
pub fn print_result(result: &WorkbenchResult, format: OutputFormat, verbose: bool) -> Result<()> {
    match format {
        OutputFormat::Json => output_json(result),
        OutputFormat::Human => {
            print_human(result, verbose);
            Ok(())
        }
    }
}

fn print_human(result: &WorkbenchResult, verbose: bool) {
    if result.is_empty() {
        warning("No test cases ran: the repository connector could not be obtained");
        return;
    }

    header(format!("Workbench {}", result.workbench_id));
    println!("{}", result_table(result));

    if verbose {
        for record in result.records().filter(|r| !r.discovered_properties.is_empty()) {
            header(record.full_id());
            for (key, value) in record.discovered_properties.iter() {
                kv(key, value);
            }
        }
    }

    let summary = result.summary();
    header("Summary");
    kv("Test cases", summary.total);
    kv("Passed", style(summary.passed).green());
    kv("Failed", style(summary.failed).red());
    kv("Skipped", style(summary.skipped).yellow());
    kv("Assertions", summary.assertions);

    if result.has_failures() {
        error(format!("{} test cases failed", summary.failed));
    } else {
        success("Repository conforms to every clause it supports");
    }
}

/// Output data as pretty JSON
pub fn output_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_case::TestCaseId;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_outcome_detail() {
        let record = TestCaseRecord::not_run(
            TestCaseId::new("wb", "repository-type-discovery", None),
            "Repository type definition discovery",
            "metadata collection id was not resolved",
        );
        assert_eq!(outcome_detail(&record), "metadata collection id was not resolved");
    }

    #[test]
    fn test_result_table_has_row_per_record() {
        let records = vec![
            TestCaseRecord::not_run(TestCaseId::new("wb", "a", None), "a", "x"),
            TestCaseRecord::not_run(TestCaseId::new("wb", "b", Some("Asset".into())), "b", "y"),
        ];
        let result = WorkbenchResult::from_records("wb", records);
        let rendered = result_table(&result).to_string();

        assert!(rendered.contains("b-Asset"));
        assert!(rendered.contains("not run"));
    }
}
