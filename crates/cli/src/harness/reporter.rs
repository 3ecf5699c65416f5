use anyhow::Result;
use serde::Serialize;

use super::executor::{RunResult, RunStatus};

/// Aggregated outcome of a suite run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub results: Vec<RunResult>,
}

impl SuiteResult {
    pub fn from_results(results: Vec<RunResult>) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.status == RunStatus::Pass)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == RunStatus::Fail)
            .count();
        let errors = results
            .iter()
            .filter(|r| r.status == RunStatus::Error)
            .count();
        Self {
            total,
            passed,
            failed,
            errors,
            results,
        }
    }
}

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Report a single run result in human-readable format
pub fn report_result(result: &RunResult, verbose: bool) {
    println!("Scenario: {}", result.scenario_name);
    if let Some(backend) = result.backend {
        println!("Backend: {}", backend);
    }

    match result.status {
        RunStatus::Pass => println!("Status: PASS"),
        RunStatus::Fail => println!("Status: FAIL"),
        RunStatus::Error => println!("Status: ERROR"),
    }

    println!(
        "Spans: {} substituted, {} failed, {} unresolved",
        result.substituted, result.failed, result.unresolved
    );

    match &result.parse_error {
        None => println!("Downstream parse: ok"),
        Some(error) => {
            println!("Downstream parse: FAILED ({error})");
            // The raw, partially substituted text is the diagnostic the
            // user needs to see what the model actually produced.
            println!();
            println!("Partially substituted output:");
            println!("{}", result.output);
        }
    }

    if !result.mismatches.is_empty() {
        println!();
        println!("Mismatches ({}):", result.mismatches.len());
        for mismatch in &result.mismatches {
            println!("  ✗ {}", mismatch);
        }
    }

    if let Some(error) = &result.error {
        println!();
        println!("Error ({:?}): {}", error.error_type, error.message);
    }

    if verbose && result.parse_error.is_none() {
        println!();
        println!("Output:");
        println!("{}", result.output);
    }
}

/// Report a single run result as JSON
pub fn report_result_json(result: &RunResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{}", json);
    Ok(())
}

/// Report suite results in human-readable format
pub fn report_suite_result(suite_result: &SuiteResult) {
    println!("Scenario Suite Results");
    println!("======================");
    println!();
    println!("Total:  {}", suite_result.total);
    println!("Passed: {}", suite_result.passed);
    println!("Failed: {}", suite_result.failed);
    println!("Errors: {}", suite_result.errors);
    println!();

    for result in &suite_result.results {
        let status_symbol = match result.status {
            RunStatus::Pass => "✓",
            RunStatus::Fail => "✗",
            RunStatus::Error => "⚠",
        };
        println!("{} {}", status_symbol, result.scenario_name);
    }
}

/// Report suite results as JSON
pub fn report_suite_result_json(suite_result: &SuiteResult) -> Result<()> {
    let json = serde_json::to_string_pretty(suite_result)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_status(status: RunStatus) -> RunResult {
        RunResult {
            run_id: uuid::Uuid::now_v7(),
            executed_at: chrono::Utc::now().to_rfc3339(),
            scenario_name: "s".to_string(),
            backend: None,
            status,
            substituted: 0,
            failed: 0,
            unresolved: 0,
            parse_error: None,
            mismatches: Vec::new(),
            output: String::new(),
            error: None,
        }
    }

    #[test]
    fn suite_result_tallies_statuses() {
        let suite = SuiteResult::from_results(vec![
            result_with_status(RunStatus::Pass),
            result_with_status(RunStatus::Pass),
            result_with_status(RunStatus::Fail),
            result_with_status(RunStatus::Error),
        ]);
        assert_eq!(suite.total, 4);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert_eq!(suite.errors, 1);
    }

    #[test]
    fn results_serialize_to_json() {
        let suite = SuiteResult::from_results(vec![result_with_status(RunStatus::Pass)]);
        let json = serde_json::to_string(&suite).unwrap();
        assert!(json.contains("\"passed\":1"));
    }
}
