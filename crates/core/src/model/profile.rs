//! Dataset profiling: column listing and per-column classification.
//!
//! The profile is the read-only surface the surrounding system hands to the
//! prompt-template collaborator so the model knows which columns exist and
//! how they may be used.

use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};

/// Broad class of a column, derived from its physical dtype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    Numeric,
    Categorical,
    Temporal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub class: ColumnClass,
}

/// Summary of an uploaded dataset: shape, column classes, and a small
/// sample of leading values per column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
    /// First few values of each column, rendered as text, in column order.
    pub sample: Vec<(String, Vec<String>)>,
}

const SAMPLE_ROWS: usize = 3;

fn classify(dtype: &DataType) -> ColumnClass {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => ColumnClass::Numeric,
        DataType::Date | DataType::Datetime(_, _) | DataType::Time | DataType::Duration(_) => {
            ColumnClass::Temporal
        }
        _ => ColumnClass::Categorical,
    }
}

impl DatasetProfile {
    pub fn from_frame(frame: &DataFrame) -> Self {
        let row_count = frame.height();
        let mut columns = Vec::with_capacity(frame.width());
        let mut sample = Vec::with_capacity(frame.width());

        for column in frame.get_columns() {
            let dtype = column.dtype();
            columns.push(ColumnProfile {
                name: column.name().to_string(),
                dtype: format!("{dtype}"),
                class: classify(dtype),
            });

            let series = column.as_materialized_series();
            let values = (0..row_count.min(SAMPLE_ROWS))
                .map(|index| {
                    series
                        .get(index)
                        .map(|value| value.to_string())
                        .unwrap_or_else(|_| "null".to_string())
                })
                .collect();
            sample.push((column.name().to_string(), values));
        }

        Self {
            row_count,
            columns,
            sample,
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of(ColumnClass::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_of(ColumnClass::Categorical)
    }

    pub fn temporal_columns(&self) -> Vec<&str> {
        self.columns_of(ColumnClass::Temporal)
    }

    fn columns_of(&self, class: ColumnClass) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.class == class)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Render the plain-text context block handed to the prompt-template
    /// collaborator.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str("Dataset information:\n");
        out.push_str(&format!("Total records: {}\n", self.row_count));
        out.push_str(&format!("Columns: {}\n\n", self.column_names().join(", ")));
        out.push_str(&format!(
            "Numeric columns: {}\n",
            self.numeric_columns().join(", ")
        ));
        out.push_str(&format!(
            "Categorical columns: {}\n",
            self.categorical_columns().join(", ")
        ));
        out.push_str(&format!(
            "Temporal columns: {}\n\n",
            self.temporal_columns().join(", ")
        ));
        out.push_str(&format!("Sample data (first {SAMPLE_ROWS} rows):\n"));
        for (name, values) in &self.sample {
            out.push_str(&format!("  {}: {}\n", name, values.join(", ")));
        }
        out
    }
}
