//! Per-run context shared by the orchestrator and its strategies.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::logging::BatchLogger;
use crate::progress::ProgressAggregator;

/// State a strategy needs besides the plan.
///
/// Owned by one run; nothing in here outlives it except the shared
/// aggregator.
pub struct RunContext {
    pub batch_id: String,
    pub progress: Arc<ProgressAggregator>,
    pub logger: Arc<BatchLogger>,
    pub cancel: CancellationToken,
    /// Batch outputs go to `output_root/{batch_id}`.
    pub output_root: PathBuf,
}

impl RunContext {
    pub fn new(
        batch_id: impl Into<String>,
        progress: Arc<ProgressAggregator>,
        logger: Arc<BatchLogger>,
        cancel: CancellationToken,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            progress,
            logger,
            cancel,
            output_root: output_root.into(),
        }
    }

    /// Folder receiving this batch's local outputs.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.batch_id)
    }

    /// Push a new progress target and log it.
    pub fn report(&self, percent: f64, title: &str, subtitle: &str) {
        self.progress.set_target(percent, title, subtitle);
        self.logger.progress(percent);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;

    #[test]
    fn report_raises_target() {
        let ctx = RunContext::new(
            "b1",
            Arc::new(ProgressAggregator::default()),
            Arc::new(BatchLogger::detached("b1", LogConfig::default(), None)),
            CancellationToken::new(),
            "/tmp/out",
        );
        ctx.report(40.0, "Uploading", "a.mp4");
        ctx.report(20.0, "Uploading", "b.mp4");
        assert_eq!(ctx.progress.target(), 40.0);
        assert_eq!(ctx.progress.snapshot().subtitle, "b.mp4");
        assert_eq!(ctx.output_dir(), PathBuf::from("/tmp/out/b1"));
    }
}
