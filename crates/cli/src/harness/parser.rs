use anyhow::{Context, Result};
use chatviz_core::model::ChartBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A substitution scenario: dataset, saved model response, expectations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    /// CSV dataset, relative to the scenario file.
    pub data: PathBuf,
    /// Saved raw assistant response, relative to the scenario file.
    pub response: PathBuf,
    #[serde(default)]
    pub backend: Option<ChartBackend>,
    #[serde(default)]
    pub expect: Option<Expectations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Expectations {
    #[serde(default)]
    pub substituted: Option<usize>,
    #[serde(default)]
    pub failed: Option<usize>,
    #[serde(default)]
    pub unresolved: Option<usize>,
    /// Whether the substituted output must parse as JSON downstream.
    #[serde(default)]
    pub parse: Option<ParseExpectation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseExpectation {
    Success,
    Failure,
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("scenario name cannot be empty");
        }
        if self.data.as_os_str().is_empty() {
            anyhow::bail!("scenario data path cannot be empty");
        }
        if self.response.as_os_str().is_empty() {
            anyhow::bail!("scenario response path cannot be empty");
        }
        Ok(())
    }
}

/// Parse a scenario from a YAML file.
pub fn parse_scenario(path: &Path) -> Result<Scenario> {
    if !path.exists() {
        anyhow::bail!(
            "Scenario file not found: {}\nPlease check the file path and try again.",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

    // serde_path_to_error points at the offending field on a mismatch.
    let deserializer = serde_yaml::Deserializer::from_str(&content);
    let scenario: Scenario = serde_path_to_error::deserialize(deserializer).with_context(|| {
        format!(
            "Failed to parse YAML from: {}\n\
             This usually means there's a syntax error or missing required field.",
            path.display()
        )
    })?;

    scenario
        .validate()
        .with_context(|| format!("Validation failed for scenario: {}", path.display()))?;

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_scenario_reports_missing_file_with_context() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");

        let error = parse_scenario(&missing).unwrap_err().to_string();
        assert!(error.contains("Scenario file not found"));
        assert!(error.contains(&missing.display().to_string()));
    }

    #[test]
    fn parse_scenario_reports_yaml_parse_errors_with_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("invalid.yaml");
        fs::write(&path, "name: [\n").unwrap();

        let error = parse_scenario(&path).unwrap_err().to_string();
        assert!(error.contains("Failed to parse YAML"));
    }

    #[test]
    fn parse_scenario_accepts_minimal_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("minimal.yaml");
        fs::write(
            &path,
            "name: minimal\ndata: sales.csv\nresponse: response.txt\n",
        )
        .unwrap();

        let scenario = parse_scenario(&path).unwrap();
        assert_eq!(scenario.name, "minimal");
        assert!(scenario.backend.is_none());
        assert!(scenario.expect.is_none());
    }

    #[test]
    fn parse_scenario_reads_expectations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("full.yaml");
        fs::write(
            &path,
            "name: full\n\
             data: sales.csv\n\
             response: response.txt\n\
             backend: echarts\n\
             expect:\n\
             \x20 substituted: 2\n\
             \x20 parse: success\n",
        )
        .unwrap();

        let scenario = parse_scenario(&path).unwrap();
        assert_eq!(scenario.backend, Some(ChartBackend::Echarts));
        let expect = scenario.expect.unwrap();
        assert_eq!(expect.substituted, Some(2));
        assert_eq!(expect.parse, Some(ParseExpectation::Success));
    }

    #[test]
    fn empty_name_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noname.yaml");
        fs::write(&path, "name: \"\"\ndata: a.csv\nresponse: r.txt\n").unwrap();

        let error = parse_scenario(&path).unwrap_err().to_string();
        assert!(error.contains("Validation failed"));
    }
}
