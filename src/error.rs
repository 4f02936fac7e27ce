//! Error types for the upload engine and its storage backends.

use thiserror::Error;

/// Boxed error returned by caller-supplied resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Diagnostic reported when a removal targets a container that cannot be used.
pub const CONTAINER_UNAVAILABLE_MESSAGE: &str =
    "Cannot use container. Check if provided options are correct.";

/// Blob service error codes observable by the upload engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BlobNotFound,
    ContainerNotFound,
    InvalidResourceName,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BlobNotFound => "BlobNotFound",
            ErrorCode::ContainerNotFound => "ContainerNotFound",
            ErrorCode::InvalidResourceName => "InvalidResourceName",
        }
    }

    /// Returns the default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::BlobNotFound => "The specified blob does not exist.",
            ErrorCode::ContainerNotFound => "The specified container does not exist.",
            ErrorCode::InvalidResourceName => {
                "The specified resource name contains invalid characters."
            }
        }
    }
}

/// A required configuration value that was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingParameter {
    #[error("Missing required parameter: Azure blob storage access key.")]
    AccessKey,
    #[error("Missing required parameter: Azure blob storage account name.")]
    AccountName,
    #[error("Missing required parameter: Azure container name.")]
    ContainerName,
}

/// Every configuration violation found while building an engine.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigError {
    pub errors: Vec<MissingParameter>,
    pub message: String,
}

impl ConfigError {
    /// Builds the aggregate with a summary that agrees with the violation count.
    pub fn new(errors: Vec<MissingParameter>) -> Self {
        let count = errors.len();
        let (verb, suffix) = if count > 1 { ("are", "s") } else { ("is", "") };
        Self {
            message: format!("There {verb} {count} missing required parameter{suffix}."),
            errors,
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Errors surfaced by engine construction and per-file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot use container. Check if provided options are correct.")]
    ContainerUnavailable { container: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("resolver failed: {0}")]
    Resolver(#[source] BoxError),

    #[error("{}: {message}", code.as_str())]
    Service { code: ErrorCode, message: String },

    #[error(transparent)]
    Azure(#[from] azure_core::Error),
}

impl StorageError {
    /// Creates a service error with the code's default message.
    pub fn new(code: ErrorCode) -> Self {
        StorageError::Service {
            message: code.default_message().to_string(),
            code,
        }
    }

    /// Creates a service error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        StorageError::Service {
            code,
            message: message.into(),
        }
    }

    /// Returns the service error code, if this error came from the blob service.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            StorageError::Service { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
