//! Error types for expression parsing and evaluation

use thiserror::Error;

/// Errors that can occur while parsing an expression chain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid number format '{value}'")]
    InvalidNumber { value: String },

    #[error("Invalid arguments to '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error("Parser internal error: {message}")]
    InternalError { message: String },
}

/// Errors that can occur while evaluating a parsed chain against the dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Parse failure: {0}")]
    Parse(#[from] ParseError),

    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("'{operation}' cannot be applied to {state}")]
    IncompatibleChain { operation: String, state: String },

    #[error("Chain does not end in a terminal conversion")]
    IncompleteChain,

    #[error("Unsupported result shape: {reason}")]
    UnsupportedShape { reason: String },

    #[error("Malformed value '{value}' for {operation}")]
    MalformedValue { operation: String, value: String },

    #[error("Dataset engine error: {message}")]
    Frame { message: String },

    #[error("Serialization error: {message}")]
    Serialize { message: String },
}

impl EvalError {
    pub(crate) fn frame(error: polars::error::PolarsError) -> Self {
        EvalError::Frame {
            message: error.to_string(),
        }
    }

    pub(crate) fn incompatible(operation: impl Into<String>, state: impl Into<String>) -> Self {
        EvalError::IncompatibleChain {
            operation: operation.into(),
            state: state.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::SyntaxError {
            line: 1,
            column: 5,
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("line 1"));
        assert!(err.to_string().contains("column 5"));
    }

    #[test]
    fn eval_error_display() {
        let err = EvalError::UnknownColumn {
            column: "Revenue".to_string(),
        };
        assert!(err.to_string().contains("Revenue"));
    }

    #[test]
    fn parse_error_converts_to_eval_error() {
        let err: EvalError = ParseError::InternalError {
            message: "empty".to_string(),
        }
        .into();
        assert!(matches!(err, EvalError::Parse(_)));
    }
}
