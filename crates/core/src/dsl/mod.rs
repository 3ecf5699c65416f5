//! Dataset expression DSL
//!
//! This module parses and evaluates the dataset-access chains the model is
//! instructed to embed in its chart specs. The grammar is closed: the only
//! bindings are the dataset handle `df` and the helper namespace `pd`, and
//! the verb set is fixed (select, filter, group, aggregate, parse-date,
//! parse-numeric, sort, terminal conversions). Nothing outside the grammar
//! is ever executed, which is what makes evaluating model output safe.

use polars::prelude::DataFrame;

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod value;

pub use ast::*;
pub use error::{EvalError, ParseError};
pub use eval::evaluate;
pub use parser::parse_chain;
pub use value::{ResultValue, ScalarValue};

/// Parse and evaluate one resolved span against the dataset, producing
/// canonical JSON text.
pub fn evaluate_source(source: &str, dataset: &DataFrame) -> Result<String, EvalError> {
    let expr = parse_chain(source)?;
    let value = evaluate(&expr, dataset)?;
    value.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn evaluate_source_produces_json_text() {
        let frame = df!("Sales" => &[10i64, 20, 30]).unwrap();
        let json = evaluate_source(r#"df["Sales"].tolist()"#, &frame).unwrap();
        assert_eq!(json, "[10,20,30]");
    }

    #[test]
    fn evaluate_source_propagates_parse_failures() {
        let frame = df!("Sales" => &[1i64]).unwrap();
        let err = evaluate_source("df.sample(5)", &frame).unwrap_err();
        assert!(matches!(err, EvalError::Parse(_)));
    }
}
