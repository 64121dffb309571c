//! Selection errors.

use thiserror::Error;

/// A selection that cannot start a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Select at least one compatible video.")]
    NoCompatibleFiles { notices: Vec<String> },

    #[error("Choose at least one output aspect ratio.")]
    NoRatios,

    #[error("{name} is longer than {limit} seconds ({seconds:.0} s).")]
    DurationExceeded {
        name: String,
        seconds: f64,
        limit: u32,
    },

    #[error("Daily limit reached: {used} of {limit} renders used today.")]
    DailyLimitReached { used: u32, limit: u32 },
}

impl SelectionError {
    pub fn no_compatible_files(notices: Vec<String>) -> Self {
        Self::NoCompatibleFiles { notices }
    }

    pub fn duration_exceeded(name: impl Into<String>, seconds: f64, limit: u32) -> Self {
        Self::DurationExceeded {
            name: name.into(),
            seconds,
            limit,
        }
    }

    /// Notices gathered while filtering, if any.
    pub fn notices(&self) -> &[String] {
        match self {
            Self::NoCompatibleFiles { notices } => notices,
            _ => &[],
        }
    }
}

/// Result type for selection checks.
pub type SelectionResult<T> = Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_error_names_the_file() {
        let err = SelectionError::duration_exceeded("long.mp4", 200.4, 75);
        let msg = err.to_string();
        assert!(msg.contains("long.mp4"));
        assert!(msg.contains("75 seconds"));
        assert!(msg.contains("200 s"));
    }
}
