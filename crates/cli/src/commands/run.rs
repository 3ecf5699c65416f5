use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::harness::{
    discover_scenarios, execute_scenario, parse_scenario, report_result, report_result_json,
    report_suite_result, report_suite_result_json, ErrorType, OutputFormat, RunErrorDetail,
    RunResult, RunStatus, SuiteResult,
};

const DEFAULT_SUITE_DIR: &str = "scenarios";

enum ExecutionTarget<'a> {
    Suite(&'a Path),
    Single(&'a Path),
}

/// Execute substitution scenarios
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Path to the scenario YAML file (for single scenario mode)
    #[arg(value_name = "SCENARIO")]
    pub scenario_path: Option<PathBuf>,

    /// Execute all scenarios in directory (suite mode)
    #[arg(long, value_name = "DIR")]
    pub suite: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (human, json)
    #[arg(long, value_name = "FORMAT", default_value = "human")]
    pub output: String,
}

impl RunCommand {
    pub fn execute(&self) -> Result<i32> {
        match self.execution_target() {
            ExecutionTarget::Suite(suite_path) => self.execute_suite(suite_path),
            ExecutionTarget::Single(scenario_path) => self.execute_single(scenario_path),
        }
    }

    fn execution_target(&self) -> ExecutionTarget<'_> {
        if let Some(suite_path) = &self.suite {
            ExecutionTarget::Suite(suite_path)
        } else if let Some(scenario_path) = &self.scenario_path {
            ExecutionTarget::Single(scenario_path)
        } else {
            ExecutionTarget::Suite(Path::new(DEFAULT_SUITE_DIR))
        }
    }

    fn execute_single(&self, scenario_path: &Path) -> Result<i32> {
        let output_format = self.output_format()?;

        let scenario = match parse_scenario(scenario_path) {
            Ok(scenario) => scenario,
            Err(error) => {
                let result = build_error_result(
                    scenario_path.display().to_string(),
                    ErrorType::ParseError,
                    error,
                );
                self.report_single(&result, output_format)?;
                return Ok(2);
            }
        };

        let result = match execute_scenario(&scenario, scenario_path.parent()) {
            Ok(result) => result,
            Err(error) => {
                let result =
                    build_error_result(scenario.name.clone(), ErrorType::ExecutionError, error);
                self.report_single(&result, output_format)?;
                return Ok(2);
            }
        };

        self.report_single(&result, output_format)?;

        Ok(match result.status {
            RunStatus::Pass => 0,
            RunStatus::Fail => 1,
            RunStatus::Error => 2,
        })
    }

    fn execute_suite(&self, suite_path: &Path) -> Result<i32> {
        let output_format = self.output_format()?;

        let scenario_paths = discover_scenarios(suite_path)?;
        if scenario_paths.is_empty() {
            eprintln!("No scenarios found in: {}", suite_path.display());
            return Ok(2);
        }

        if output_format == OutputFormat::Human {
            println!(
                "Discovered {} scenarios in: {}",
                scenario_paths.len(),
                suite_path.display()
            );
            println!();
        }

        let mut results = Vec::with_capacity(scenario_paths.len());
        for path in &scenario_paths {
            let result = match parse_scenario(path) {
                Ok(scenario) => execute_scenario(&scenario, path.parent())?,
                Err(error) => build_error_result(
                    path.display().to_string(),
                    ErrorType::ParseError,
                    error,
                ),
            };
            results.push(result);
        }

        let suite_result = SuiteResult::from_results(results);
        match output_format {
            OutputFormat::Human => report_suite_result(&suite_result),
            OutputFormat::Json => report_suite_result_json(&suite_result)?,
        }

        Ok(if suite_result.errors > 0 {
            2
        } else if suite_result.failed > 0 {
            1
        } else {
            0
        })
    }

    fn report_single(&self, result: &RunResult, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Human => report_result(result, self.verbose),
            OutputFormat::Json => report_result_json(result)?,
        }
        Ok(())
    }

    fn output_format(&self) -> Result<OutputFormat> {
        match self.output.as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown output format: {other} (expected human or json)"),
        }
    }
}

fn build_error_result(
    scenario_name: String,
    error_type: ErrorType,
    error: anyhow::Error,
) -> RunResult {
    RunResult {
        run_id: uuid::Uuid::now_v7(),
        executed_at: chrono::Utc::now().to_rfc3339(),
        scenario_name,
        backend: None,
        status: RunStatus::Error,
        substituted: 0,
        failed: 0,
        unresolved: 0,
        parse_error: None,
        mismatches: Vec::new(),
        output: String::new(),
        error: Some(RunErrorDetail {
            error_type,
            message: error.to_string(),
        }),
    }
}
