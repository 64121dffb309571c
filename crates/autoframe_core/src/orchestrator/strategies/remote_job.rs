//! Unified remote job: upload everything, create one job, unlock, start, poll.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{BatchResult, FileResult, JobStatus, OutputArtifact};
use crate::orchestrator::context::RunContext;
use crate::orchestrator::errors::StrategyError;
use crate::orchestrator::plan::BatchPlan;
use crate::orchestrator::strategy::RenderStrategy;
use crate::progress::{combine_overall, ProgressBand};
use crate::remote::{
    CreateJobRequest, FileRecord, Job, RemoteError, RemoteJobClient, RewardGate, RewardRequest,
    UploadProgress,
};

/// Upload share of the progress bar.
pub const UPLOAD_BAND: ProgressBand = ProgressBand::new(5.0, 45.0);
/// Shown while the reward gate is open.
pub const REWARD_PERCENT: f64 = 55.0;
/// Server-side rendering share of the progress bar.
pub const RENDER_BAND: ProgressBand = ProgressBand::new(60.0, 100.0);

/// Runs the whole batch as one server job. A job failure fails the batch.
pub struct RemoteJobStrategy {
    client: Arc<RemoteJobClient>,
    reward: Arc<dyn RewardGate>,
}

impl RemoteJobStrategy {
    pub fn new(client: Arc<RemoteJobClient>, reward: Arc<dyn RewardGate>) -> Self {
        Self { client, reward }
    }

    async fn upload_all(&self, ctx: &RunContext, plan: &BatchPlan) -> Result<(String, Vec<FileRecord>), StrategyError> {
        let total = plan.files.len();
        let mut job_id = plan.batch_id.clone();
        let mut records = Vec::with_capacity(total);

        for (index, file) in plan.files.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(StrategyError::Cancelled);
            }
            let title = format!("Uploading {}", file.source.name);
            let subtitle = format!("{} of {} clip(s)", index + 1, total);
            ctx.report(UPLOAD_BAND.map(combine_overall(index, 0.0, total)), &title, &subtitle);

            let progress = Arc::clone(&ctx.progress);
            let on_progress: UploadProgress = Arc::new(move |fraction| {
                progress.set_target(
                    UPLOAD_BAND.map(combine_overall(index, fraction, total)),
                    &title,
                    &subtitle,
                );
            });

            let (assigned, key) = tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(StrategyError::Cancelled),
                uploaded = self.client.upload_file(&file.source, &job_id, Some(on_progress)) => uploaded?,
            };
            if assigned != job_id {
                ctx.logger.debug(&format!("Service assigned job id {}", assigned));
                job_id = assigned;
            }

            ctx.logger.info(&format!("Uploaded {} as {}", file.source.name, key));
            records.push(FileRecord {
                key,
                original_name: file.source.name.clone(),
                size: file.source.size,
                content_type: file.source.content_type.clone(),
                base_override: file.base_override.clone(),
            });
        }

        ctx.report(UPLOAD_BAND.end, "Upload complete", &format!("{} clip(s) uploaded", total));
        Ok((job_id, records))
    }

    fn collect_results(&self, ctx: &RunContext, plan: &BatchPlan, job: &Job) -> BatchResult {
        let style_label = plan.style.label();
        let mut result = BatchResult::new(&plan.batch_id, self.name());

        for remote in &job.results {
            let mut file = FileResult::new(&remote.original_name, style_label);
            for output in &remote.outputs {
                let url = match &output.url {
                    Some(url) => self.client.resolve_url(url),
                    None => self
                        .client
                        .resolve_url(&format!("/download/{}/{}", job.id, output.filename)),
                };
                let ratio_label = output
                    .ratio_label
                    .clone()
                    .or_else(|| output.label.clone())
                    .unwrap_or_default();
                file.push_output(OutputArtifact {
                    url,
                    filename: output.filename.clone(),
                    label: output
                        .label
                        .clone()
                        .unwrap_or_else(|| format!("{} • {}", ratio_label, style_label)),
                    ratio_label,
                    style_label: style_label.to_string(),
                });
            }
            result.files.push(file);
        }

        result.processed_count = result.files.iter().filter(|f| !f.outputs.is_empty()).count();
        if result.processed_count < plan.files.len() {
            let msg = format!(
                "The service returned outputs for {} of {} clip(s).",
                result.processed_count,
                plan.files.len()
            );
            ctx.logger.warn(&msg);
            result.warnings.push(msg);
        }
        result.download_all_url = Some(self.client.download_all_url(&job.id));
        result
    }
}

#[async_trait]
impl RenderStrategy for RemoteJobStrategy {
    fn name(&self) -> &str {
        "remote-job"
    }

    async fn execute(&self, ctx: &RunContext, plan: &BatchPlan) -> Result<BatchResult, StrategyError> {
        let (job_id, records) = self.upload_all(ctx, plan).await?;

        let ratios = plan.ratio_keys();
        let naming = plan.naming_payload();
        let request = CreateJobRequest {
            job_id: &job_id,
            files: &records,
            ratios: &ratios,
            style: plan.style.key(),
            naming: &naming,
        };
        let job = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(StrategyError::Cancelled),
            created = self.client.create_job(&request) => created?,
        };
        ctx.logger.info(&format!("Created job {}", job.id));

        ctx.report(REWARD_PERCENT, "Awaiting rewarded ad", "Unlocking your render");
        let unlock = RewardRequest {
            job_id: job.id.clone(),
            file_count: records.len(),
            ratio_count: ratios.len(),
        };
        let outcome = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(StrategyError::Cancelled),
            outcome = self.reward.request_unlock(&unlock) => outcome,
        };
        let token = match outcome.token {
            Some(token) => token,
            None => {
                ctx.logger
                    .warn(&format!("Reward gate answered '{}' without a token", outcome.status));
                String::new()
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(StrategyError::Cancelled),
            started = self.client.start_job(&job.id, &token) => { started?; }
        }
        ctx.report(RENDER_BAND.start, "Rendering", "Job started");

        let finished = self
            .client
            .poll_job_status(&job.id, &ctx.cancel, |update| {
                let status = match update.status {
                    JobStatus::Queued => "Queued",
                    JobStatus::Rendering => "Rendering",
                    JobStatus::Done => "Finalising",
                    JobStatus::Failed => "Failed",
                };
                let fraction = update.progress.clamp(0.0, 1.0);
                ctx.report(
                    RENDER_BAND.map(fraction * 100.0),
                    status,
                    &format!("{}% rendered", (fraction * 100.0).round()),
                );
            })
            .await
            .map_err(|e| {
                if let RemoteError::JobFailed(msg) = &e {
                    ctx.logger.error(msg);
                }
                StrategyError::from(e)
            })?;

        Ok(self.collect_results(ctx, plan, &finished))
    }
}
