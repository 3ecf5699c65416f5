use thiserror::Error;

/// Pass-fatal engine defects.
///
/// Per-span problems (unresolved boundaries, evaluation failures) are not
/// errors at this level; they are recorded in the span outcomes and the
/// pass continues. Only an internal invariant violation aborts a pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("substitution cursor failed to advance at byte {position}")]
    CursorStall { position: usize },
}
