//! Local transcoding errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Message shown to users for every engine failure; ffmpeg diagnostics go to the log.
pub const GENERIC_ENGINE_MESSAGE: &str = "Rendering failed on this device.";

/// Failures of the in-process render path.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Transcode exited with {status}: {tail}")]
    Failed { status: String, tail: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Transcode cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn failed(status: impl Into<String>, tail: impl Into<String>) -> Self {
        Self::Failed {
            status: status.into(),
            tail: tail.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Text for the user. Engine output is not structured enough to show.
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "Rendering was cancelled.".to_string(),
            _ => GENERIC_ENGINE_MESSAGE.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_engine_details() {
        let err = EngineError::failed("exit code 1", "Invalid data found when processing input");
        assert_eq!(err.user_message(), GENERIC_ENGINE_MESSAGE);
        assert!(err.to_string().contains("Invalid data"));
    }
}
