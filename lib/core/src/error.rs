use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Encoder timed out after {0} ms")]
    EncoderTimeout(u64),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the error came from the text encoder (failure or timeout)
    pub fn is_encoder_error(&self) -> bool {
        matches!(
            self,
            Error::Encoder(_) | Error::EncoderTimeout(_) | Error::InvalidDimension { .. }
        )
    }
}
