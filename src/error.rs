use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    #[error("Unknown sampler: {0}")]
    UnknownSampler(String),

    #[error("No history entry with id {0}")]
    UnknownRecord(String),

    #[error("A generation request is already in flight")]
    GenerationInFlight,

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Response error: HTTP {status}: {message}")]
    ResponseError { status: u16, message: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => StudioError::ResponseError {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => StudioError::RequestError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
