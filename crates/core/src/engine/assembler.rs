//! The substitution pass: splice evaluated values into the output text.

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::debug;

use crate::dsl::evaluate_source;
use crate::engine::error::EngineError;
use crate::engine::resolver::{resolve_boundary, Resolution};
use crate::engine::scanner::scan;

/// What happened to one candidate span.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpanStatus {
    /// The span was replaced by its serialized value.
    Substituted,
    /// The span resolved but evaluation failed; the source was preserved.
    EvaluationFailed { error: String },
    /// No boundary could be determined; the candidate token was preserved.
    Unresolved,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SpanOutcome {
    pub start: usize,
    pub end: usize,
    /// Original source text of the span, kept for diagnostics.
    pub source: String,
    #[serde(flatten)]
    pub status: SpanStatus,
}

/// Result of one substitution pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Substitution {
    pub output: String,
    pub spans: Vec<SpanOutcome>,
}

impl Substitution {
    pub fn substituted_count(&self) -> usize {
        self.count(|s| matches!(s, SpanStatus::Substituted))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, SpanStatus::EvaluationFailed { .. }))
    }

    pub fn unresolved_count(&self) -> usize {
        self.count(|s| matches!(s, SpanStatus::Unresolved))
    }

    fn count(&self, matching: impl Fn(&SpanStatus) -> bool) -> usize {
        self.spans
            .iter()
            .filter(|span| matching(&span.status))
            .count()
    }
}

/// Run one substitution pass over `input` against `dataset`.
///
/// Per-span failures are recorded and swallowed; the pass always covers
/// the whole input. The only fatal condition is the cursor failing to
/// advance, which is an internal defect, never a data error.
pub fn substitute(input: &str, dataset: &DataFrame) -> Result<Substitution, EngineError> {
    let mut output = String::with_capacity(input.len());
    let mut spans = Vec::new();
    let mut cursor = 0usize;

    for candidate in scan(input) {
        // Skip candidates consumed by an earlier resolution.
        if candidate.start < cursor {
            continue;
        }
        let step_start = cursor;
        output.push_str(&input[cursor..candidate.start]);

        match resolve_boundary(input, candidate.start) {
            Resolution::Unresolved => {
                let token_end = candidate.start + candidate.token_len;
                output.push_str(&input[candidate.start..token_end]);
                spans.push(SpanOutcome {
                    start: candidate.start,
                    end: token_end,
                    source: input[candidate.start..token_end].to_string(),
                    status: SpanStatus::Unresolved,
                });
                cursor = token_end;
            }
            Resolution::Resolved { end } => {
                let source = &input[candidate.start..end];
                let status = match evaluate_source(source, dataset) {
                    Ok(json) => {
                        output.push_str(&json);
                        SpanStatus::Substituted
                    }
                    Err(error) => {
                        output.push_str(source);
                        SpanStatus::EvaluationFailed {
                            error: error.to_string(),
                        }
                    }
                };
                spans.push(SpanOutcome {
                    start: candidate.start,
                    end,
                    source: source.to_string(),
                    status,
                });
                cursor = end;
            }
        }

        if cursor <= step_start {
            return Err(EngineError::CursorStall { position: cursor });
        }
    }

    output.push_str(&input[cursor..]);

    let result = Substitution { output, spans };
    debug!(
        substituted = result.substituted_count(),
        failed = result.failed_count(),
        unresolved = result.unresolved_count(),
        "substitution pass complete"
    );
    Ok(result)
}
