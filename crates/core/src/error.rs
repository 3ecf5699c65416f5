use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Engine(#[from] crate::engine::EngineError),
}

impl CoreError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;

    #[test]
    fn message_constructor_formats_plainly() {
        let err = CoreError::message("no dataset loaded");
        assert_eq!(err.to_string(), "no dataset loaded");
    }

    #[test]
    fn engine_errors_convert_transparently() {
        let err: CoreError = EngineError::CursorStall { position: 3 }.into();
        assert!(err.to_string().contains("byte 3"));
    }
}
