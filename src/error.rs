use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QdataError>;

#[derive(Error, Debug)]
pub enum QdataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unsupported archive format: {path}")]
    UnsupportedArchive { path: PathBuf },

    #[error("Deletion of existing data in {dir} was declined")]
    DeletionDeclined { dir: PathBuf },

    #[error("Invalid dataset request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Home directory not found")]
    HomeDirectoryNotFound,

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },
}

impl QdataError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        QdataError::ConfigError {
            message: message.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        QdataError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether the operator chose not to clear existing data.
    pub fn is_declined(&self) -> bool {
        matches!(self, QdataError::DeletionDeclined { .. })
    }
}
