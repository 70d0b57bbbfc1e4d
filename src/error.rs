use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrinityError {
    #[error("API Error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Generation Failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),
}

impl TrinityError {
    /// True when the failure came from the caller's input rather than the model backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TrinityError::InvalidInput(_))
    }
}
