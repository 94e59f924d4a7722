use thiserror::Error;

#[derive(Error, Debug)]
pub enum NnError {
    #[error("Model must be fitted before prediction")]
    NotFitted,

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}: backward called without a preceding forward")]
    MissingForwardCache(&'static str),

    #[error("Reshape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NnError {
    pub(crate) fn shape(expected: &[usize], actual: &[usize]) -> Self {
        NnError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NnError>;
