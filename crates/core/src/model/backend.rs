use serde::{Deserialize, Serialize};

/// Charting back end that consumes the substituted JSON text.
///
/// The engine itself is schema-agnostic; the backend only tells the caller
/// which renderer the final document is destined for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartBackend {
    /// Imperative trace/layout figure spec.
    Plotly,
    /// Declarative option-tree spec.
    Echarts,
}

impl ChartBackend {
    pub fn name(&self) -> &'static str {
        match self {
            ChartBackend::Plotly => "plotly",
            ChartBackend::Echarts => "echarts",
        }
    }
}

impl std::fmt::Display for ChartBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
