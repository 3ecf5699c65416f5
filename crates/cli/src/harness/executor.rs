use anyhow::{Context, Result};
use chatviz_core::engine::substitute;
use chatviz_core::extract::extract_spec_text;
use chatviz_core::model::ChartBackend;
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use super::parser::{ParseExpectation, Scenario};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pass,
    Fail,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    FileNotFound,
    ParseError,
    DataLoadError,
    ExecutionError,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunErrorDetail {
    pub error_type: ErrorType,
    pub message: String,
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunResult {
    pub run_id: Uuid,
    pub executed_at: String,
    pub scenario_name: String,
    pub backend: Option<ChartBackend>,
    pub status: RunStatus,
    pub substituted: usize,
    pub failed: usize,
    pub unresolved: usize,
    /// Downstream JSON parse failure, reported separately from any
    /// evaluation failure inside the engine.
    pub parse_error: Option<String>,
    pub mismatches: Vec<String>,
    /// The substituted text, kept so a bad model response can be diagnosed.
    pub output: String,
    pub error: Option<RunErrorDetail>,
}

impl RunResult {
    fn shell(scenario_name: String, backend: Option<ChartBackend>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            executed_at: Utc::now().to_rfc3339(),
            scenario_name,
            backend,
            status: RunStatus::Pass,
            substituted: 0,
            failed: 0,
            unresolved: 0,
            parse_error: None,
            mismatches: Vec::new(),
            output: String::new(),
            error: None,
        }
    }

    fn with_error(mut self, error_type: ErrorType, message: String) -> Self {
        self.status = RunStatus::Error;
        self.error = Some(RunErrorDetail {
            error_type,
            message,
        });
        self
    }
}

/// Execute a single scenario with scenario-relative file resolution.
pub fn execute_scenario(scenario: &Scenario, base_dir: Option<&Path>) -> Result<RunResult> {
    let mut result = RunResult::shell(scenario.name.clone(), scenario.backend);

    let data_path = resolve_path(&scenario.data, base_dir);
    let response_path = resolve_path(&scenario.response, base_dir);

    let frame = match load_csv(&data_path) {
        Ok(frame) => frame,
        Err(error) => {
            return Ok(result.with_error(ErrorType::DataLoadError, error.to_string()));
        }
    };

    let raw_response = match std::fs::read_to_string(&response_path) {
        Ok(text) => text,
        Err(error) => {
            return Ok(result.with_error(
                ErrorType::FileNotFound,
                format!("{}: {}", response_path.display(), error),
            ));
        }
    };

    let spec_text = extract_spec_text(&raw_response);

    // A pass-fatal engine error is an internal defect, distinct from any
    // per-span data problem.
    let substitution = match substitute(&spec_text, &frame) {
        Ok(substitution) => substitution,
        Err(error) => {
            return Ok(result.with_error(ErrorType::ExecutionError, error.to_string()));
        }
    };

    result.substituted = substitution.substituted_count();
    result.failed = substitution.failed_count();
    result.unresolved = substitution.unresolved_count();
    result.parse_error = parse_downstream(&substitution.output);
    result.output = substitution.output;

    result.mismatches = check_expectations(scenario, &result);
    if !result.mismatches.is_empty() {
        result.status = RunStatus::Fail;
    }

    Ok(result)
}

/// Hand the substituted output to the downstream JSON parser.
fn parse_downstream(output: &str) -> Option<String> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    match serde_path_to_error::deserialize::<_, serde_json::Value>(&mut deserializer) {
        Ok(_) => None,
        Err(error) => Some(error.to_string()),
    }
}

fn check_expectations(scenario: &Scenario, result: &RunResult) -> Vec<String> {
    let mut mismatches = Vec::new();
    let Some(expect) = &scenario.expect else {
        return mismatches;
    };

    if let Some(expected) = expect.substituted {
        if result.substituted != expected {
            mismatches.push(format!(
                "expected {expected} substituted spans, got {}",
                result.substituted
            ));
        }
    }
    if let Some(expected) = expect.failed {
        if result.failed != expected {
            mismatches.push(format!(
                "expected {expected} failed spans, got {}",
                result.failed
            ));
        }
    }
    if let Some(expected) = expect.unresolved {
        if result.unresolved != expected {
            mismatches.push(format!(
                "expected {expected} unresolved candidates, got {}",
                result.unresolved
            ));
        }
    }
    match (expect.parse, &result.parse_error) {
        (Some(ParseExpectation::Success), Some(error)) => {
            mismatches.push(format!("expected output to parse as JSON: {error}"));
        }
        (Some(ParseExpectation::Failure), None) => {
            mismatches.push("expected output to fail JSON parsing, but it parsed".to_string());
        }
        _ => {}
    }

    mismatches
}

fn resolve_path(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .finish()
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to load CSV: {}", path.display()))
}

/// Discover scenario YAML files under a directory, in stable order.
pub fn discover_scenarios(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        anyhow::bail!("Scenario directory not found: {}", dir.display());
    }
    let mut scenarios: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    scenarios.sort();
    Ok(scenarios)
}
