use anyhow::Result;
use polars::prelude::DataFrame;

use crate::model::{ChartBackend, ChatMessage};

/// Request/response call to an external model endpoint.
///
/// Implementations own the transport; the engine only needs raw assistant
/// text for a system prompt plus conversation history.
pub trait ModelEndpoint {
    fn complete(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String>;
}

/// Rendering call for one charting back end.
///
/// Takes the final (substituted) JSON text plus the dataset and either
/// produces a visual artifact or raises a reportable rendering error.
/// Parsing and schema validation happen behind this trait, not in the
/// engine.
pub trait SpecRenderer {
    fn backend(&self) -> ChartBackend;
    fn render(&self, spec_json: &str, dataset: &DataFrame) -> Result<()>;
}
