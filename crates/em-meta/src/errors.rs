use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetaError>;

/// Errors from manifest resolution
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Manifest endpoint returned HTTP {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Failed to parse manifest JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Unknown game version: {0}")]
    UnknownVersion(String),

    #[error("No Java runtime is published for {os}/{arch}")]
    UnsupportedHost { os: String, arch: String },

    #[error("Asset hash {0:?} is too short to derive a content-addressed path")]
    MalformedAssetHash(String),
}
