//! Batch state machine.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::context::RunContext;
use super::errors::{BatchError, StrategyError, SubmitResult};
use super::plan::BatchPlan;
use super::state::{BatchPhase, PhaseTracker};
use super::strategies::{LegacyStrategy, LocalStrategy, RemoteJobStrategy};
use super::strategy::RenderStrategy;
use super::usage::UsageCounter;
use crate::config::Settings;
use crate::engine::{FfmpegEngine, LocalRenderer};
use crate::logging::{BatchLogger, LogConfig};
use crate::models::{
    AspectCatalog, BatchOutcome, BatchResult, RenderStyle, SourceFile, TierLimits, TierMode,
};
use crate::naming::NamingSnapshot;
use crate::progress::ProgressAggregator;
use crate::remote::{NoRewardGate, RemoteJobClient, RemoteResult, RewardGate, StaticTokenGate};
use crate::selection::{DurationProbe, FfprobeProbe, SelectionError, SelectionValidator};

/// Host callback receiving every batch log line.
pub type HostLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// One submission from the host.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Raw selection, in the order the user picked it.
    pub files: Vec<SourceFile>,
    /// Aspect keys in selection order.
    pub ratios: Vec<String>,
    pub style: RenderStyle,
    pub naming: NamingSnapshot,
}

/// Marks the input form disabled for as long as it is alive.
struct FormGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FormGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FormGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Runs batches through validation, naming, dispatch and finalization.
///
/// Only one batch runs at a time; a second [`submit`](Self::submit) while
/// one is in flight returns [`BatchError::Busy`].
pub struct BatchOrchestrator {
    validator: SelectionValidator,
    catalog: AspectCatalog,
    progress: Arc<ProgressAggregator>,
    form_disabled: AtomicBool,
    cancel: Mutex<CancellationToken>,
    phase: PhaseTracker,
    probe: Arc<dyn DurationProbe>,
    strategy: Arc<dyn RenderStrategy>,
    fallback: Option<Arc<dyn RenderStrategy>>,
    usage: Option<Arc<dyn UsageCounter>>,
    output_root: PathBuf,
    logs_dir: Option<PathBuf>,
    log_config: LogConfig,
    log_callback: Option<HostLogCallback>,
}

impl BatchOrchestrator {
    pub fn new(limits: TierLimits, strategy: Arc<dyn RenderStrategy>) -> Self {
        Self {
            validator: SelectionValidator::new(limits),
            catalog: AspectCatalog::builtin(),
            progress: Arc::new(ProgressAggregator::default()),
            form_disabled: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            phase: PhaseTracker::new(),
            probe: Arc::new(FfprobeProbe::default()),
            strategy,
            fallback: None,
            usage: None,
            output_root: PathBuf::from("autoframe_output"),
            logs_dir: None,
            log_config: LogConfig::default(),
            log_callback: None,
        }
    }

    /// Build the orchestrator the tier mode in `settings` calls for.
    pub fn from_settings(settings: &Settings) -> RemoteResult<Self> {
        let limits = settings.tier.limits();
        let orchestrator = match limits.mode {
            TierMode::Local => {
                let engine = FfmpegEngine::new(&settings.engine.ffmpeg_path).with_encoding(
                    settings.engine.video_preset.clone(),
                    settings.engine.crf,
                    settings.engine.audio_bitrate.clone(),
                );
                let renderer = LocalRenderer::new(Arc::new(engine), settings.paths.temp_root());
                Self::new(limits.clone(), Arc::new(LocalStrategy::new(renderer)))
            }
            TierMode::Remote => {
                let remote = &settings.remote;
                let client = Arc::new(
                    RemoteJobClient::new(&remote.base_url)?
                        .with_api_prefix(&remote.api_prefix)
                        .with_poll_interval(remote.poll_interval()),
                );
                let reward: Arc<dyn RewardGate> = match &remote.reward_token {
                    Some(token) => Arc::new(StaticTokenGate::new(token.clone())),
                    None => Arc::new(NoRewardGate),
                };

                let mut orchestrator = Self::new(
                    limits.clone(),
                    Arc::new(RemoteJobStrategy::new(Arc::clone(&client), reward)),
                );
                if remote.legacy_fallback {
                    orchestrator = orchestrator.with_fallback(Arc::new(
                        LegacyStrategy::new(Arc::clone(&client))
                            .with_poll_interval(remote.legacy_poll_interval()),
                    ));
                }
                if limits.daily_limit.is_some() {
                    orchestrator = orchestrator.with_usage_counter(client);
                }
                orchestrator
            }
        };

        Ok(orchestrator
            .with_progress(Arc::new(ProgressAggregator::new(settings.progress.tick_interval())))
            .with_probe(Arc::new(FfprobeProbe::new(&settings.engine.ffprobe_path)))
            .with_output_root(settings.paths.output_folder())
            .with_logs_dir(settings.paths.logs_folder())
            .with_log_config(settings.logging.log_config()))
    }

    pub fn with_catalog(mut self, catalog: AspectCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_progress(mut self, progress: Arc<ProgressAggregator>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Strategy to hand over to when the primary one reports the job queue down.
    pub fn with_fallback(mut self, fallback: Arc<dyn RenderStrategy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_usage_counter(mut self, usage: Arc<dyn UsageCounter>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Folder that receives one subfolder of outputs per local batch.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Write a `{batch_id}.log` file per batch into `dir`.
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = Some(dir.into());
        self
    }

    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    pub fn with_log_callback(mut self, callback: HostLogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    pub fn limits(&self) -> &TierLimits {
        self.validator.limits()
    }

    pub fn catalog(&self) -> &AspectCatalog {
        &self.catalog
    }

    pub fn progress(&self) -> &Arc<ProgressAggregator> {
        &self.progress
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase.current()
    }

    /// Whether input is locked because a batch is running.
    pub fn is_busy(&self) -> bool {
        self.form_disabled.load(Ordering::SeqCst)
    }

    /// Abandon the running batch, if any, and return to idle.
    ///
    /// No cancel request reaches the render service; a started remote job
    /// keeps running there and its results are never collected.
    pub fn reset(&self) {
        self.cancel.lock().cancel();
        self.progress.reset();
        self.phase.reset();
        tracing::info!("Batch reset");
    }

    /// Run one batch to a terminal phase.
    pub async fn submit(&self, request: BatchRequest) -> SubmitResult<BatchResult> {
        let Some(_form) = FormGuard::acquire(&self.form_disabled) else {
            tracing::warn!("Rejected submission while a batch is running");
            return Err(BatchError::Busy);
        };

        let batch_id = uuid::Uuid::new_v4().to_string();
        let cancel = {
            let mut token = self.cancel.lock();
            *token = CancellationToken::new();
            token.clone()
        };
        let logger = Arc::new(self.open_logger(&batch_id)?);
        logger.info(&format!(
            "Batch {} submitted: {} file(s), {} ratio(s), style {}",
            batch_id,
            request.files.len(),
            request.ratios.len(),
            request.style.key()
        ));

        let outcome = self.run(request, &batch_id, &logger, cancel).await;
        match &outcome {
            Ok(result) => {
                let terminal = match result.outcome() {
                    BatchOutcome::Completed => BatchPhase::Completed,
                    BatchOutcome::PartiallyFailed => BatchPhase::PartiallyFailed,
                    BatchOutcome::Failed => BatchPhase::Failed,
                };
                self.phase.advance(terminal);
                let summary = result.summary();
                if result.processed_count > 0 {
                    self.progress.finalize("Batch complete", &summary);
                    logger.success(&summary);
                } else {
                    self.progress.reset();
                    logger.error(&summary);
                }
            }
            Err(BatchError::Cancelled { .. }) => {
                self.progress.reset();
                self.phase.reset();
                logger.warn("Batch cancelled");
            }
            Err(e) => {
                self.phase.advance(BatchPhase::Failed);
                self.progress.reset();
                match e {
                    BatchError::Validation(_) => logger.validation(&e.user_message()),
                    _ => {
                        logger.error(&e.to_string());
                        logger.show_tail("Recent errors");
                    }
                }
            }
        }
        logger.close();
        outcome
    }

    fn open_logger(&self, batch_id: &str) -> SubmitResult<BatchLogger> {
        let callback = self.log_callback.clone().map(|host| {
            Box::new(move |line: &str| host(line)) as crate::logging::LogCallback
        });
        match &self.logs_dir {
            Some(dir) => BatchLogger::new(batch_id, dir, self.log_config.clone(), callback)
                .map_err(|e| BatchError::setup(batch_id, format!("Could not open batch log: {}", e))),
            None => Ok(BatchLogger::detached(batch_id, self.log_config.clone(), callback)),
        }
    }

    async fn run(
        &self,
        request: BatchRequest,
        batch_id: &str,
        logger: &Arc<BatchLogger>,
        cancel: CancellationToken,
    ) -> SubmitResult<BatchResult> {
        self.phase.advance(BatchPhase::Validating);
        logger.phase("Validating");

        let review = self.validator.validate(request.files);
        let mut warnings = review.notices.clone();
        if review.accepted.is_empty() {
            return Err(SelectionError::no_compatible_files(review.notices).into());
        }
        let (ratios, ratio_notice) = self.validator.cap_ratios(&request.ratios);
        if let Some(notice) = ratio_notice {
            warnings.push(notice);
        }
        let aspects = self.catalog.resolve(&ratios);
        if aspects.is_empty() {
            return Err(SelectionError::NoRatios.into());
        }
        for warning in &warnings {
            logger.warn(warning);
        }

        let durations = self
            .validator
            .check_durations(&review.accepted, self.probe.as_ref())
            .await?;
        self.check_usage(logger).await?;
        if cancel.is_cancelled() {
            return Err(BatchError::cancelled(batch_id));
        }

        self.phase.advance(BatchPhase::NamingResolution);
        logger.phase("Naming");
        let plan = BatchPlan::build(
            batch_id,
            review.accepted,
            &durations,
            aspects,
            request.style,
            &request.naming,
        );
        for target in &plan.targets {
            logger.debug(&format!(
                "{} -> {}",
                plan.files[target.target.file_index].source.name, target.filename
            ));
        }

        self.phase.advance(BatchPhase::Dispatching);
        let ctx = RunContext::new(
            batch_id,
            Arc::clone(&self.progress),
            Arc::clone(logger),
            cancel,
            self.output_root.clone(),
        );
        self.progress
            .begin("Starting", &format!("{} clip(s) queued", plan.files.len()));
        let _animation = self.progress.animate();

        let mut result = self.dispatch(&ctx, &plan).await?;

        self.phase.advance(BatchPhase::Finalizing);
        logger.phase("Finalizing");
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    async fn check_usage(&self, logger: &BatchLogger) -> SubmitResult<()> {
        let Some(counter) = &self.usage else {
            return Ok(());
        };
        if self.validator.limits().daily_limit.is_none() {
            return Ok(());
        }
        match counter.renders_today().await {
            Ok(used) => self.validator.check_daily_limit(used)?,
            Err(e) => logger.warn(&format!("Could not check today's usage: {}", e)),
        }
        Ok(())
    }

    async fn dispatch(&self, ctx: &RunContext, plan: &BatchPlan) -> SubmitResult<BatchResult> {
        self.phase.advance(BatchPhase::Running);
        ctx.logger.phase(&format!("Running {}", self.strategy.name()));

        match self.strategy.execute(ctx, plan).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_async_unavailable() => {
                let Some(fallback) = &self.fallback else {
                    return Err(self.strategy_error(ctx, self.strategy.name(), e));
                };
                ctx.logger
                    .warn(&format!("{}, switching to {}", e, fallback.name()));
                self.phase.advance(BatchPhase::Dispatching);
                self.phase.advance(BatchPhase::Running);
                ctx.logger.phase(&format!("Running {}", fallback.name()));
                fallback
                    .execute(ctx, plan)
                    .await
                    .map_err(|e| self.strategy_error(ctx, fallback.name(), e))
            }
            Err(e) => Err(self.strategy_error(ctx, self.strategy.name(), e)),
        }
    }

    fn strategy_error(&self, ctx: &RunContext, strategy: &str, err: StrategyError) -> BatchError {
        if err.is_cancelled() {
            BatchError::cancelled(&ctx.batch_id)
        } else {
            BatchError::strategy_failed(&ctx.batch_id, strategy, err)
        }
    }
}
