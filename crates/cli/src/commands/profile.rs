use anyhow::{bail, Context, Result};
use chatviz_core::model::DatasetProfile;
use clap::Parser;
use polars::prelude::*;
use std::path::PathBuf;

/// Print the profile of a CSV dataset
#[derive(Debug, Parser)]
pub struct ProfileCommand {
    /// CSV file to profile
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Output format (human, json)
    #[arg(long, value_name = "FORMAT", default_value = "human")]
    pub output: String,
}

impl ProfileCommand {
    pub fn execute(&self) -> Result<i32> {
        let frame = LazyCsvReader::new(&self.data)
            .finish()
            .with_context(|| format!("Failed to open CSV: {}", self.data.display()))?
            .collect()
            .with_context(|| format!("Failed to load CSV: {}", self.data.display()))?;

        let profile = DatasetProfile::from_frame(&frame);
        match self.output.as_str() {
            "human" => print!("{}", profile.render_summary()),
            "json" => println!("{}", serde_json::to_string_pretty(&profile)?),
            other => bail!("Unknown output format: {other} (expected human or json)"),
        }
        Ok(0)
    }
}
