//! Embedded-expression substitution engine
//!
//! Turns near-JSON model output into strictly valid JSON by locating
//! dataset-access expressions (scanner), determining where each one ends
//! (resolver), evaluating it against the dataset (the `dsl` module), and
//! splicing the results back into the text (assembler). Spans that cannot
//! be resolved or evaluated are preserved verbatim so one bad expression
//! never corrupts the rest of the document.

pub mod assembler;
pub mod error;
pub mod io_traits;
pub mod resolver;
pub mod scanner;

pub use assembler::{substitute, SpanOutcome, SpanStatus, Substitution};
pub use error::EngineError;
pub use io_traits::{ModelEndpoint, SpecRenderer};
pub use resolver::{resolve_boundary, Resolution, TERMINAL_SUFFIXES};
pub use scanner::{scan, Candidate};
