pub mod dsl;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;

pub use engine::assembler::{substitute, SpanOutcome, SpanStatus, Substitution};
pub use engine::io_traits::{ModelEndpoint, SpecRenderer};
pub use error::{CoreError, Result};
pub use extract::{extract_balanced_object, extract_spec_text};
pub use model::{ChartBackend, ChatMessage, ChatRole, DatasetProfile};
