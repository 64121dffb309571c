//! In-process rendering of every target, one after another.

use async_trait::async_trait;

use crate::engine::{LocalRenderRequest, LocalRenderer};
use crate::models::{BatchResult, FileResult, OutputArtifact};
use crate::orchestrator::context::RunContext;
use crate::orchestrator::errors::StrategyError;
use crate::orchestrator::plan::BatchPlan;
use crate::orchestrator::strategy::RenderStrategy;
use crate::progress::combine_overall;

/// Renders with a [`LocalRenderer`]. Any target failure ends the run.
pub struct LocalStrategy {
    renderer: LocalRenderer,
}

impl LocalStrategy {
    pub fn new(renderer: LocalRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl RenderStrategy for LocalStrategy {
    fn name(&self) -> &str {
        "local"
    }

    async fn execute(&self, ctx: &RunContext, plan: &BatchPlan) -> Result<BatchResult, StrategyError> {
        let total = plan.target_count();
        let output_dir = ctx.output_dir();
        let label_mode = plan.naming.label_mode;
        let style_label = plan.style.label();

        let mut files: Vec<FileResult> = plan
            .files
            .iter()
            .map(|f| FileResult::new(&f.source.name, style_label))
            .collect();

        ctx.logger
            .info(&format!("Rendering {} target(s) with {}", total, self.renderer.engine_name()));

        for (index, planned) in plan.targets.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(StrategyError::Cancelled);
            }

            let file = &plan.files[planned.target.file_index];
            let aspect = &planned.target.aspect;
            let title = format!("Rendering {}", file.source.name);
            let subtitle = format!("{} of {} output(s): {}", index + 1, total, aspect.friendly_label);
            ctx.report(combine_overall(index, 0.0, total), &title, &subtitle);

            let request = LocalRenderRequest {
                source: &file.source,
                aspect,
                style: planned.target.style,
                filename: &planned.filename,
                output_dir: &output_dir,
                duration: file.duration,
            };
            let on_progress = |fraction: f64| {
                ctx.report(combine_overall(index, fraction, total), &title, &subtitle);
            };
            let on_command = |line: &str| ctx.logger.command(line);

            let rendered = self
                .renderer
                .render(&request, &on_progress, &on_command, &ctx.cancel)
                .await
                .map_err(|e| {
                    ctx.logger.error(&format!("{} ({}): {}", file.source.name, aspect.key, e));
                    StrategyError::from(e)
                })?;

            files[planned.target.file_index].push_output(OutputArtifact {
                url: rendered.url,
                filename: planned.filename.clone(),
                ratio_label: aspect.label(label_mode).to_string(),
                style_label: style_label.to_string(),
                label: format!("{} • {}", aspect.friendly_label, style_label),
            });
            ctx.logger.success(&format!("Wrote {}", planned.filename));

            // Let the host run between targets.
            tokio::task::yield_now().await;
        }

        let mut result = BatchResult::new(&plan.batch_id, self.name());
        result.processed_count = files.iter().filter(|f| !f.outputs.is_empty()).count();
        result.files = files;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    use crate::engine::{EngineError, EngineProgress, EngineResult, TranscodeEngine, TranscodeJob};
    use crate::logging::{BatchLogger, LogConfig};
    use crate::models::{AspectCatalog, RenderStyle, SourceFile};
    use crate::naming::{NamingConfig, NamingSnapshot};
    use crate::progress::ProgressAggregator;

    struct StubEngine {
        fail_on: Option<usize>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl TranscodeEngine for StubEngine {
        fn name(&self) -> &str {
            "stub"
        }

        fn command_line(&self, job: &TranscodeJob) -> Option<String> {
            Some(format!("stub {}x{}", job.width, job.height))
        }

        async fn transcode(
            &self,
            job: &TranscodeJob,
            on_progress: EngineProgress<'_>,
            _cancel: &CancellationToken,
        ) -> EngineResult<()> {
            let call = {
                let mut calls = self.calls.lock();
                *calls += 1;
                *calls
            };
            if self.fail_on == Some(call) {
                return Err(EngineError::failed("exit code 1", "bad input"));
            }
            on_progress(0.5);
            fs::write(&job.output, format!("{}x{}", job.width, job.height))
                .map_err(|e| EngineError::io(&job.output, e))
        }
    }

    fn run_setup(fail_on: Option<usize>) -> (tempfile::TempDir, LocalStrategy, RunContext, BatchPlan) {
        run_setup_with(fail_on, BatchLogger::detached("b1", LogConfig::default(), None))
    }

    fn run_setup_with(
        fail_on: Option<usize>,
        logger: BatchLogger,
    ) -> (tempfile::TempDir, LocalStrategy, RunContext, BatchPlan) {
        let dir = tempdir().unwrap();
        let mut sources = Vec::new();
        for name in ["one.mp4", "two.mov"] {
            let path = dir.path().join(name);
            fs::write(&path, b"video").unwrap();
            sources.push(SourceFile::from_path(&path).unwrap());
        }
        fs::create_dir_all(dir.path().join("tmp")).unwrap();

        let engine = Arc::new(StubEngine {
            fail_on,
            calls: Mutex::new(0),
        });
        let strategy = LocalStrategy::new(LocalRenderer::new(engine, dir.path().join("tmp")));
        let ctx = RunContext::new(
            "b1",
            Arc::new(ProgressAggregator::default()),
            Arc::new(logger),
            CancellationToken::new(),
            dir.path().join("out"),
        );
        let plan = BatchPlan::build(
            "b1",
            sources,
            &[Some(4.0), Some(8.0)],
            AspectCatalog::builtin().resolve(&["square", "landscape"]),
            RenderStyle::Fill,
            &NamingSnapshot::new(NamingConfig::default().with_date_stamp("2024-05-01")),
        );
        (dir, strategy, ctx, plan)
    }

    #[tokio::test]
    async fn renders_every_target_in_order() {
        let (dir, strategy, ctx, plan) = run_setup(None);
        let result = strategy.execute(&ctx, &plan).await.unwrap();

        assert_eq!(result.processed_count, 2);
        assert_eq!(result.download_all_url, None);
        assert_eq!(result.files[0].ratio_labels, vec!["1x1", "16x9"]);
        let names: Vec<&str> = result.files[1]
            .outputs
            .iter()
            .map(|o| o.filename.as_str())
            .collect();
        assert_eq!(names, vec!["two_1x1.mp4", "two_16x9.mp4"]);

        let written = fs::read_to_string(dir.path().join("out/b1/one_16x9.mp4")).unwrap();
        assert_eq!(written, "1920x1080");
        assert!(ctx.progress.target() >= 75.0);
    }

    #[tokio::test]
    async fn one_failed_target_fails_the_run() {
        let (dir, strategy, ctx, plan) = run_setup(Some(2));
        let err = strategy.execute(&ctx, &plan).await.unwrap_err();

        assert!(matches!(err, StrategyError::Engine(_)));
        assert!(!dir.path().join("out/b1/two_1x1.mp4").exists());
        assert_eq!(ctx.logger.tail().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_target() {
        let (_dir, strategy, ctx, plan) = run_setup(None);
        ctx.cancel.cancel();
        let err = strategy.execute(&ctx, &plan).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn debug_logs_record_each_engine_command() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let logger = BatchLogger::detached(
            "b1",
            LogConfig::debug(),
            Some(Box::new(move |line: &str| sink.lock().push(line.to_string()))),
        );
        let (_dir, strategy, ctx, plan) = run_setup_with(None, logger);
        strategy.execute(&ctx, &plan).await.unwrap();

        let commands: Vec<String> = lines
            .lock()
            .iter()
            .filter_map(|line| line.split_once("$ ").map(|(_, cmd)| cmd.to_string()))
            .collect();
        assert_eq!(
            commands,
            vec!["stub 1080x1080", "stub 1920x1080", "stub 1080x1080", "stub 1920x1080"]
        );
    }

    #[tokio::test]
    async fn default_logs_leave_commands_out() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let logger = BatchLogger::detached(
            "b1",
            LogConfig::default(),
            Some(Box::new(move |line: &str| sink.lock().push(line.to_string()))),
        );
        let (_dir, strategy, ctx, plan) = run_setup_with(None, logger);
        strategy.execute(&ctx, &plan).await.unwrap();
        assert!(!lines.lock().iter().any(|line| line.contains("$ stub")));
    }
}
