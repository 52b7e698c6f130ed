use thiserror::Error;

#[derive(Debug, Error)]
pub enum TupleError {
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid field index: {0}")]
    InvalidFieldIndex(usize),

    #[error("No field named {0}")]
    FieldNotFound(String),
}

pub type TupleResult<T> = Result<T, TupleError>;
