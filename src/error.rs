use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing or invalid embedding provider credential")]
    Auth,

    #[error("embedding request failed: {0}")]
    Network(String),

    #[error("malformed embedding response: {0}")]
    Parse(String),

    #[error("unsupported file kind: {0}")]
    UnsupportedFileKind(String),

    #[error("resource access denied: {0}")]
    ResourceAccessDenied(String),

    #[error("document already exists for locator: {0}")]
    DuplicateLocator(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("data directory does not exist and could not be created: {}", .0.display())]
    DataDir(PathBuf),
}

impl Error {
    /// Whether this error came from the embedding provider boundary.
    ///
    /// The search ranker degrades to substring matching on these instead of
    /// surfacing the error to the caller.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Error::Auth | Error::Network(_) | Error::Parse(_))
    }
}
