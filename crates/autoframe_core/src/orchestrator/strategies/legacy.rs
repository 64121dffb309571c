//! Per-file synchronous processing through the legacy `/api/process` endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{BatchResult, FileResult, OutputArtifact};
use crate::orchestrator::context::RunContext;
use crate::orchestrator::errors::StrategyError;
use crate::orchestrator::plan::BatchPlan;
use crate::orchestrator::strategy::RenderStrategy;
use crate::progress::combine_overall;
use crate::remote::{LegacyProcessRequest, ProcessResponse, RemoteError, RemoteJobClient, UploadProgress};

/// Share of one file's progress slot spent uploading; the rest tracks rendering.
const UPLOAD_SHARE: f64 = 0.3;

fn upload_partial(fraction: f64) -> f64 {
    fraction.clamp(0.0, 1.0) * UPLOAD_SHARE
}

fn processing_partial(fraction: f64) -> f64 {
    UPLOAD_SHARE + fraction.clamp(0.0, 1.0) * (1.0 - UPLOAD_SHARE)
}

/// Feeds upload fractions of file `index` into the batch progress.
fn upload_reporter(ctx: &RunContext, name: &str, index: usize, processed: usize, total: usize) -> UploadProgress {
    let progress = Arc::clone(&ctx.progress);
    let title = format!("Uploading {}", name);
    Arc::new(move |fraction| {
        progress.set_target(
            combine_overall(processed, upload_partial(fraction), total),
            &title,
            &format!(
                "{} of {} clip(s): {}% uploaded",
                index + 1,
                total,
                (fraction.clamp(0.0, 1.0) * 100.0).round()
            ),
        );
    })
}

/// Uploads and renders one file per request. A failing file is recorded
/// and skipped; the rest of the batch continues.
pub struct LegacyStrategy {
    client: Arc<RemoteJobClient>,
    poll_interval: Duration,
}

impl LegacyStrategy {
    pub fn new(client: Arc<RemoteJobClient>) -> Self {
        Self {
            client,
            poll_interval: Duration::from_millis(500),
        }
    }

    /// Interval of `/progress` polls while a file is processing.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run one `/api/process` request while polling its progress.
    async fn process_one(
        &self,
        ctx: &RunContext,
        request: &LegacyProcessRequest<'_>,
        index: usize,
        processed: usize,
        total: usize,
    ) -> Result<ProcessResponse, StrategyError> {
        let name = &request.file.name;
        let on_upload = upload_reporter(ctx, name, index, processed, total);
        let process = self.client.process_legacy(request, Some(on_upload));
        tokio::pin!(process);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(StrategyError::Cancelled),
                outcome = &mut process => return outcome.map_err(StrategyError::from),
                _ = ticker.tick() => {
                    // Polling errors are ignored; the next tick retries.
                    if let Ok(progress) = self.client.legacy_progress(request.batch_id).await {
                        let fraction = progress.progress.clamp(0.0, 1.0);
                        let label = if progress.status == "done" { "Finalising" } else { "Processing" };
                        ctx.report(
                            combine_overall(processed, processing_partial(fraction), total),
                            &format!("{} {}", label, name),
                            &format!(
                                "{} of {} clip(s) rendering ({}%)",
                                index + 1,
                                total,
                                (fraction * 100.0).round()
                            ),
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl RenderStrategy for LegacyStrategy {
    fn name(&self) -> &str {
        "legacy"
    }

    async fn execute(&self, ctx: &RunContext, plan: &BatchPlan) -> Result<BatchResult, StrategyError> {
        let total = plan.files.len();
        let ratios = plan.ratio_keys();
        let naming = plan.naming_payload();
        let style_label = plan.style.label();

        let mut result = BatchResult::new(&plan.batch_id, self.name());
        let mut batch_id = plan.batch_id.clone();

        for (index, file) in plan.files.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(StrategyError::Cancelled);
            }
            let processed = result.processed_count;
            ctx.report(
                combine_overall(processed, 0.0, total),
                &format!("Preparing {}", file.source.name),
                &format!("{} of {} clip(s) queued", index + 1, total),
            );

            let request = LegacyProcessRequest {
                batch_id: &batch_id,
                file: &file.source,
                ratios: &ratios,
                style: plan.style.key(),
                naming: &naming,
                base_override: file.base_override.as_deref(),
            };

            let response = match self.process_one(ctx, &request, index, processed, total).await {
                Ok(response) => response,
                Err(StrategyError::Cancelled) => return Err(StrategyError::Cancelled),
                Err(e) => {
                    let message = match &e {
                        StrategyError::Remote(RemoteError::Network(_)) => {
                            format!("{}: network error", file.source.name)
                        }
                        StrategyError::Remote(RemoteError::Process { .. }) => e.to_string(),
                        other => format!("{}: {}", file.source.name, other.user_message()),
                    };
                    ctx.logger.error(&message);
                    result.errors.push(message);
                    ctx.report(
                        combine_overall(processed, 0.0, total),
                        "Error",
                        &format!("{} of {} clip(s) failed", index + 1, total),
                    );
                    continue;
                }
            };

            batch_id = response.batch_id.clone();
            let processed_file = response.result;
            let file_style = processed_file
                .style_label
                .clone()
                .unwrap_or_else(|| style_label.to_string());
            let mut file_result = FileResult::new(&file.source.name, &file_style);
            for output in processed_file.outputs {
                let ratio_label = output
                    .ratio_label
                    .clone()
                    .or_else(|| output.label.clone())
                    .unwrap_or_default();
                let url = output
                    .url
                    .as_deref()
                    .map(|u| self.client.resolve_url(u))
                    .unwrap_or_else(|| {
                        self.client
                            .resolve_url(&format!("/download/{}/{}", batch_id, output.filename))
                    });
                file_result.push_output(OutputArtifact {
                    url,
                    label: output
                        .label
                        .clone()
                        .unwrap_or_else(|| format!("{} • {}", ratio_label, file_style)),
                    filename: output.filename,
                    ratio_label,
                    style_label: file_style.clone(),
                });
            }
            result.files.push(file_result);
            result.processed_count += 1;
            if let Some(bundle) = response.downloads.bundle.as_deref() {
                result.download_all_url = Some(self.client.resolve_url(bundle));
            }

            ctx.logger.success(&format!("Processed {}", file.source.name));
            ctx.report(
                combine_overall(result.processed_count, 0.0, total),
                &format!("Finished {}", file.source.name),
                &format!("{} of {} clip(s) rendered", result.processed_count, total),
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use mockito::{Matcher, Server};
    use serde_json::json;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    use crate::logging::{BatchLogger, LogConfig};
    use crate::models::{AspectCatalog, BatchOutcome, RenderStyle, SourceFile};
    use crate::naming::{NamingConfig, NamingSnapshot};
    use crate::progress::ProgressAggregator;

    fn context() -> RunContext {
        RunContext::new(
            "b1",
            Arc::new(ProgressAggregator::default()),
            Arc::new(BatchLogger::detached("b1", LogConfig::default(), None)),
            CancellationToken::new(),
            "/tmp/unused",
        )
    }

    #[tokio::test]
    async fn failing_file_is_skipped() {
        let mut server = Server::new_async().await;
        let form_route = server
            .mock("POST", "/process")
            .with_status(302)
            .with_header("location", "/")
            .with_body("<html>Redirecting</html>")
            .expect(0)
            .create_async()
            .await;
        server
            .mock("POST", "/api/process")
            .match_body(Matcher::Regex(r#"filename="good.mp4""#.to_string()))
            .with_body(
                json!({
                    "batch_id": "b1",
                    "result": {
                        "original_name": "good.mp4",
                        "outputs": [{"filename": "good_1x1.mp4", "ratio_label": "1x1", "url": "/download/b1/good_1x1.mp4"}]
                    },
                    "downloads": {"bundle": "/download/b1/bundle"}
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/api/process")
            .match_body(Matcher::Regex(r#"filename="bad.mp4""#.to_string()))
            .with_status(422)
            .with_body(r#"{"error":"Unreadable video"}"#)
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(r"^/progress/".to_string()))
            .with_status(404)
            .with_body(r#"{"progress":0.0,"status":"unknown"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let mut files = Vec::new();
        for name in ["bad.mp4", "good.mp4"] {
            let path = dir.path().join(name);
            fs::write(&path, b"data").unwrap();
            files.push(SourceFile::from_path(&path).unwrap());
        }
        let plan = BatchPlan::build(
            "b1",
            files,
            &[],
            AspectCatalog::builtin().resolve(&["square"]),
            RenderStyle::Fill,
            &NamingSnapshot::new(NamingConfig::default()),
        );

        let strategy = LegacyStrategy::new(Arc::new(RemoteJobClient::new(&server.url()).unwrap()))
            .with_poll_interval(Duration::from_millis(5));
        let ctx = context();
        let result = strategy.execute(&ctx, &plan).await.unwrap();

        assert_eq!(result.processed_count, 1);
        assert_eq!(result.errors, vec!["bad.mp4: Unreadable video"]);
        assert_eq!(result.outcome(), BatchOutcome::PartiallyFailed);
        assert_eq!(result.files[0].outputs[0].filename, "good_1x1.mp4");
        assert_eq!(
            result.download_all_url,
            Some(format!("{}/download/b1/bundle", server.url()))
        );
        form_route.assert_async().await;
    }

    #[test]
    fn upload_then_render_fill_one_file_slot_in_order() {
        assert_eq!(upload_partial(0.0), 0.0);
        assert!((upload_partial(1.0) - UPLOAD_SHARE).abs() < 1e-9);
        assert!((processing_partial(0.0) - UPLOAD_SHARE).abs() < 1e-9);
        assert!((processing_partial(1.0) - 1.0).abs() < 1e-9);
        assert_eq!(upload_partial(2.0), upload_partial(1.0));
    }

    #[test]
    fn upload_fractions_move_the_batch_target() {
        let ctx = context();
        let report = upload_reporter(&ctx, "a.mp4", 1, 1, 2);
        report(0.5);

        let expected = combine_overall(1, 0.5 * UPLOAD_SHARE, 2);
        assert!((ctx.progress.target() - expected).abs() < 1e-9);
        let snapshot = ctx.progress.snapshot();
        assert_eq!(snapshot.title, "Uploading a.mp4");
        assert_eq!(snapshot.subtitle, "2 of 2 clip(s): 50% uploaded");
    }
}
