use thiserror::Error;

pub type Result<T> = std::result::Result<T, LaunchError>;

/// Errors from validation, acquisition and launch preparation
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Download endpoint returned HTTP {status} for {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize validation record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Meta(#[from] em_meta::MetaError),
}
