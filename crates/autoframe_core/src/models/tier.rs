//! Tier limits.

use serde::{Deserialize, Serialize};

use super::enums::TierMode;

/// Admission limits for one session. Supplied by the host, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub max_files: usize,
    pub max_file_size_bytes: u64,
    pub max_duration_seconds: u32,
    pub max_ratios: usize,
    pub mode: TierMode,
    /// Renders allowed per day; `None` means unlimited.
    pub daily_limit: Option<u32>,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_file_size_bytes: 120 * 1024 * 1024,
            max_duration_seconds: 75,
            max_ratios: 3,
            mode: TierMode::Local,
            daily_limit: None,
        }
    }
}

impl TierLimits {
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / (1024 * 1024)
    }
}
