use thiserror::Error;

/// Unified error type for ci-excellence operations
#[derive(Error, Debug)]
pub enum CiError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Unknown release type: {0}")]
    UnknownReleaseType(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Rollback error: {0}")]
    Rollback(String),

    #[error("Step failed: {0}")]
    Step(String),

    #[error("Step timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in ci-excellence
pub type Result<T> = std::result::Result<T, CiError>;

/// Exit code used for real and simulated timeouts
pub const EXIT_TIMEOUT: u8 = 124;

impl CiError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        CiError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        CiError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        CiError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        CiError::Remote(msg.into())
    }

    /// Create a rollback error with context
    pub fn rollback(msg: impl Into<String>) -> Self {
        CiError::Rollback(msg.into())
    }

    /// Create a step failure with context
    pub fn step(msg: impl Into<String>) -> Self {
        CiError::Step(msg.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CiError::Timeout(_) => EXIT_TIMEOUT,
            _ => 1,
        }
    }
}
