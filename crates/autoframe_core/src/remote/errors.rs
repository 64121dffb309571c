//! Remote job errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the render service.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Object storage is disabled; upload through the service instead.
    #[error("Upload slot unavailable")]
    SlotUnavailable,

    #[error("Upload failed for {name}: {message}")]
    Upload { name: String, message: String },

    #[error("Could not create job: {0}")]
    JobCreate(String),

    #[error("Could not start job: {0}")]
    JobStart(String),

    #[error("Could not fetch job status: {0}")]
    JobStatus(String),

    #[error("Render job failed: {0}")]
    JobFailed(String),

    /// The async job pipeline is down; the legacy upload path may still work.
    #[error("Async rendering unavailable: {0}")]
    AsyncUnavailable(String),

    /// Legacy single-shot processing of one file failed.
    #[error("{name}: {message}")]
    Process { name: String, message: String },

    #[error("Invalid service URL '{0}'")]
    InvalidUrl(String),

    #[error("Unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Cancelled")]
    Cancelled,
}

impl RemoteError {
    pub fn upload(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn process(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Process {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::JobCreate(msg)
            | Self::JobStart(msg)
            | Self::JobStatus(msg)
            | Self::JobFailed(msg)
            | Self::AsyncUnavailable(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
