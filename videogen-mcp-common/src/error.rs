//! Error types for the video generation MCP server.
//!
//! Every tool operation returns [`Result`]; errors are rendered to text only
//! at the MCP boundary.
//!
//! # Error Categories
//!
//! - Request errors: `UnknownModel`, `MissingImageInput`, `UnsupportedImageInput`
//! - `MissingCredential`: a required API key is not configured
//! - Provider errors: `ProviderRejected`, `ProviderUnreachable`
//! - Prediction outcomes: `GenerationFailed`, `GenerationCanceled`, `GenerationTimedOut`
//! - Artifact errors: `ArtifactDownloadFailed`, `LocalWriteFailed`
//! - `StorageError`: image upload to object storage
//! - `Error::Api`, `Error::Validation`, `Error::Io`, `Error::Ffmpeg`, `Error::Timeout`

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all tool operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (invalid values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Object storage upload errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The requested model id is not in the registry
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// An image-to-video model was called without an image
    #[error("Model {0} requires an image input")]
    MissingImageInput(String),

    /// A text-to-video model was called with an image
    #[error("Model {0} is text-to-video only and doesn't accept image input")]
    UnsupportedImageInput(String),

    /// A credential needed for the operation is not configured
    #[error("{0} environment variable is required")]
    MissingCredential(String),

    /// The inference provider answered with a non-success status
    #[error("Provider rejected the request (HTTP {status_code}): {message}")]
    ProviderRejected {
        /// HTTP status code returned by the provider
        status_code: u16,
        /// Provider error detail, or the status text when none was given
        message: String,
    },

    /// The inference provider could not be reached
    #[error("Provider unreachable at {endpoint}: {message}")]
    ProviderUnreachable {
        /// The endpoint that was called
        endpoint: String,
        /// Transport error description
        message: String,
    },

    /// The prediction reached the `failed` status
    #[error("Video generation failed: {0}")]
    GenerationFailed(String),

    /// The prediction reached the `canceled` status
    #[error("Video generation was canceled")]
    GenerationCanceled,

    /// No terminal status within the time budget
    #[error("Video generation timed out after {seconds} seconds")]
    GenerationTimedOut {
        /// The exhausted budget in seconds
        seconds: u64,
    },

    /// Fetching the generated artifact failed
    #[error("Failed to download video from {url}: {message}")]
    ArtifactDownloadFailed {
        /// Artifact URL reported by the provider
        url: String,
        /// Failure description
        message: String,
    },

    /// Writing the artifact to disk failed
    #[error("Failed to save video to {}: {source}", .path.display())]
    LocalWriteFailed {
        /// Destination path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// API errors with endpoint and HTTP status context
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API (0 when no response arrived)
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// FFmpeg/FFprobe execution errors
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// Subprocess timeout errors
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

impl Error {
    /// Create a provider rejection from a status code and detail message.
    ///
    /// # Example
    ///
    /// ```
    /// use videogen_mcp_common::error::Error;
    ///
    /// let err = Error::provider_rejected(422, "Invalid version");
    /// assert!(err.to_string().contains("422"));
    /// assert!(err.to_string().contains("Invalid version"));
    /// ```
    pub fn provider_rejected(status_code: u16, message: impl Into<String>) -> Self {
        Error::ProviderRejected {
            status_code,
            message: message.into(),
        }
    }

    pub fn provider_unreachable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ProviderUnreachable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn artifact_download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ArtifactDownloadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn local_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::LocalWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a missing credential error naming the environment variable.
    ///
    /// # Example
    ///
    /// ```
    /// use videogen_mcp_common::error::Error;
    ///
    /// let err = Error::missing_credential("REPLICATE_API_TOKEN");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "REPLICATE_API_TOKEN environment variable is required"
    /// );
    /// ```
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Error::MissingCredential(var.into())
    }

    /// Create a new API error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use videogen_mcp_common::error::Error;
    ///
    /// let err = Error::api(
    ///     "https://api.example.com/v1/generate",
    ///     500,
    ///     "Internal server error"
    /// );
    /// assert!(err.to_string().contains("api.example.com"));
    /// assert!(err.to_string().contains("500"));
    /// ```
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn ffmpeg(message: impl Into<String>) -> Self {
        Error::Ffmpeg(message.into())
    }

    pub fn timeout(seconds: u64) -> Self {
        Error::Timeout(seconds)
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "Config",
            Error::Storage(_) => "Storage",
            Error::UnknownModel(_) => "UnknownModel",
            Error::MissingImageInput(_) => "MissingImageInput",
            Error::UnsupportedImageInput(_) => "UnsupportedImageInput",
            Error::MissingCredential(_) => "MissingCredential",
            Error::ProviderRejected { .. } => "ProviderRejected",
            Error::ProviderUnreachable { .. } => "ProviderUnreachable",
            Error::GenerationFailed(_) => "GenerationFailed",
            Error::GenerationCanceled => "GenerationCanceled",
            Error::GenerationTimedOut { .. } => "GenerationTimedOut",
            Error::ArtifactDownloadFailed { .. } => "ArtifactDownloadFailed",
            Error::LocalWriteFailed { .. } => "LocalWriteFailed",
            Error::Api { .. } => "Api",
            Error::Validation(_) => "Validation",
            Error::Io(_) => "Io",
            Error::Ffmpeg(_) => "Ffmpeg",
            Error::Timeout(_) => "Timeout",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Object storage errors raised while uploading a local image.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The local file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// The file is not an accepted image type
    #[error("Invalid image file type: {extension}. Supported formats: {supported}")]
    InvalidImage {
        /// Offending extension, with leading dot (empty when none)
        extension: String,
        /// Comma-separated list of accepted extensions
        supported: String,
    },

    /// The upload request failed
    #[error("Failed to upload {object} to storage (HTTP {status_code}): {message}")]
    UploadFailed {
        /// Object path inside the bucket
        object: String,
        /// HTTP status code (0 when no response arrived)
        status_code: u16,
        message: String,
    },
}

impl StorageError {
    pub fn upload_failed(
        object: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        StorageError::UploadFailed {
            object: object.into(),
            status_code,
            message: message.into(),
        }
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;
