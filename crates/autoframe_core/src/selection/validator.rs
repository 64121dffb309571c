//! Tier-limit admission for a file selection.

use super::errors::{SelectionError, SelectionResult};
use super::probe::DurationProbe;
use crate::models::{SourceFile, TierLimits};

/// Outcome of filtering a raw selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReview {
    /// Files that passed, in selection order.
    pub accepted: Vec<SourceFile>,
    /// Human readable notes about what was dropped.
    pub notices: Vec<String>,
}

/// Applies [`TierLimits`] to file and ratio selections.
#[derive(Debug, Clone)]
pub struct SelectionValidator {
    limits: TierLimits,
}

impl SelectionValidator {
    pub fn new(limits: TierLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &TierLimits {
        &self.limits
    }

    /// Filter by extension and size, then truncate to `max_files`.
    pub fn validate(&self, files: Vec<SourceFile>) -> SelectionReview {
        let mut notices = Vec::new();

        let (compatible, unsupported): (Vec<_>, Vec<_>) =
            files.into_iter().partition(SourceFile::has_video_extension);
        if !unsupported.is_empty() {
            let names: Vec<&str> = unsupported.iter().map(|f| f.name.as_str()).collect();
            notices.push(format!("Skipped unsupported files: {}", names.join(", ")));
        }

        let max_size = self.limits.max_file_size_bytes;
        let (mut accepted, oversized): (Vec<_>, Vec<_>) =
            compatible.into_iter().partition(|f| f.size <= max_size);
        if !oversized.is_empty() {
            let names: Vec<String> = oversized
                .iter()
                .map(|f| format!("{} ({:.1} MB)", f.name, f.size_mb()))
                .collect();
            notices.push(format!(
                "Skipped files over {} MB: {}",
                self.limits.max_file_size_mb(),
                names.join(", ")
            ));
        }

        let max_files = self.limits.max_files;
        if accepted.len() > max_files {
            let picked = accepted.len();
            accepted.truncate(max_files);
            notices.push(format!(
                "Max {} videos can be selected at once. You picked {}, so {} were left out.",
                max_files,
                picked,
                picked - max_files
            ));
        }

        for notice in &notices {
            tracing::debug!("Selection notice: {}", notice);
        }

        SelectionReview { accepted, notices }
    }

    /// Maximum number of aspect ratios per batch.
    pub fn ratio_cap(&self) -> usize {
        self.limits.max_ratios
    }

    /// Whether a ratio selection of `count` items exceeds the cap.
    pub fn ratios_over_limit(&self, count: usize) -> bool {
        count > self.limits.max_ratios
    }

    /// Keep the first `max_ratios` selections, with a notice if any were dropped.
    pub fn cap_ratios<T: Clone>(&self, selected: &[T]) -> (Vec<T>, Option<String>) {
        let cap = self.limits.max_ratios;
        if selected.len() <= cap {
            return (selected.to_vec(), None);
        }
        (
            selected[..cap].to_vec(),
            Some(format!("Pick up to {} aspect ratios per batch.", cap)),
        )
    }

    /// Reject the batch if any file is longer than `max_duration_seconds`.
    ///
    /// Returns the probed durations, aligned with `files`. Files whose
    /// duration cannot be read are let through.
    pub async fn check_durations(
        &self,
        files: &[SourceFile],
        probe: &dyn DurationProbe,
    ) -> SelectionResult<Vec<Option<f64>>> {
        let limit = self.limits.max_duration_seconds;
        let mut durations = Vec::with_capacity(files.len());
        for file in files {
            let duration = probe.probe_duration(&file.path).await;
            match duration {
                Some(secs) if secs > f64::from(limit) => {
                    return Err(SelectionError::duration_exceeded(&file.name, secs, limit));
                }
                Some(_) => {}
                None => tracing::warn!("Could not read duration of {}, allowing it", file.name),
            }
            durations.push(duration);
        }
        Ok(durations)
    }

    /// Reject the batch once the daily render allowance is used up.
    pub fn check_daily_limit(&self, used: u32) -> SelectionResult<()> {
        match self.limits.daily_limit {
            Some(limit) if used >= limit => Err(SelectionError::DailyLimitReached { used, limit }),
            _ => Ok(()),
        }
    }
}
