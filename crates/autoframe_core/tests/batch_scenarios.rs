//! End-to-end batch runs with a fake transcoder and a mock render service.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockito::{Matcher, Server};
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use autoframe_core::engine::{EngineProgress, EngineResult, LocalRenderer, TranscodeEngine, TranscodeJob};
use autoframe_core::models::{BatchOutcome, NamingMode, RenderStyle, SourceFile, TierLimits, TierMode};
use autoframe_core::naming::{MemoryStore, NamingConfig, NamingSession, NamingSnapshot};
use autoframe_core::orchestrator::{
    BatchError, BatchOrchestrator, BatchPhase, BatchRequest, LocalStrategy, RemoteJobStrategy,
};
use autoframe_core::remote::{RemoteJobClient, StaticTokenGate};
use autoframe_core::selection::{DurationProbe, SelectionError};

struct FixedProbe(HashMap<String, f64>);

impl FixedProbe {
    fn new(durations: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self(
            durations.iter().map(|(n, d)| (n.to_string(), *d)).collect(),
        ))
    }
}

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let name = path.file_name()?.to_string_lossy().to_string();
        self.0.get(&name).copied()
    }
}

/// Writes the input bytes to the output and records what it was asked to do.
#[derive(Default)]
struct FakeEngine {
    jobs: Mutex<Vec<TranscodeJob>>,
}

#[async_trait]
impl TranscodeEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        on_progress: EngineProgress<'_>,
        _cancel: &CancellationToken,
    ) -> EngineResult<()> {
        on_progress(0.5);
        fs::copy(&job.input, &job.output).unwrap();
        on_progress(1.0);
        self.jobs.lock().push(job.clone());
        Ok(())
    }
}

fn write_clip(dir: &TempDir, name: &str) -> SourceFile {
    let path = dir.path().join(name);
    fs::write(&path, b"fake video bytes").unwrap();
    SourceFile::from_path(&path).unwrap()
}

fn local_orchestrator(dir: &TempDir, engine: Arc<FakeEngine>, probe: Arc<FixedProbe>) -> BatchOrchestrator {
    let limits = TierLimits {
        max_files: 1,
        max_ratios: 1,
        mode: TierMode::Local,
        ..TierLimits::default()
    };
    let renderer = LocalRenderer::new(engine, dir.path().join(".temp"));
    BatchOrchestrator::new(limits, Arc::new(LocalStrategy::new(renderer)))
        .with_probe(probe)
        .with_output_root(dir.path().join("out"))
}

#[tokio::test]
async fn local_single_clip_renders_one_output() {
    autoframe_core::logging::init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakeEngine::default());
    let orchestrator = local_orchestrator(&dir, Arc::clone(&engine), FixedProbe::new(&[("clip.mp4", 10.0)]));

    let result = orchestrator
        .submit(BatchRequest {
            files: vec![write_clip(&dir, "clip.mp4")],
            ratios: vec!["square".to_string()],
            style: RenderStyle::Fill,
            naming: NamingSnapshot::new(NamingConfig::default()),
        })
        .await
        .unwrap();

    assert_eq!(result.processed_count, 1);
    assert_eq!(result.outcome(), BatchOutcome::Completed);
    assert_eq!(result.download_all_url, None);
    let outputs = &result.files[0].outputs;
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].filename, "clip_1x1.mp4");
    assert!(outputs[0].url.starts_with("file://"));
    assert!(dir
        .path()
        .join("out")
        .join(&result.batch_id)
        .join("clip_1x1.mp4")
        .exists());

    let jobs = engine.jobs.lock();
    assert_eq!(jobs.len(), 1);
    assert_eq!((jobs[0].width, jobs[0].height), (1080, 1080));
    assert_eq!(jobs[0].style, RenderStyle::Fill);
    assert_eq!(jobs[0].duration_hint, Some(10.0));

    assert_eq!(orchestrator.phase(), BatchPhase::Completed);
    assert_eq!(orchestrator.progress().displayed(), 100.0);
}

#[tokio::test]
async fn custom_override_survives_mode_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = NamingSession::load(Arc::new(MemoryStore::new()));
    session.set_files(["Trip_1920x1080.mov"]);
    session.set_mode(NamingMode::Custom);
    assert!(session.edit_override("Trip_1920x1080.mov", "Holiday"));

    session.set_mode(NamingMode::Auto);
    assert!(session.snapshot().overrides.is_empty());
    session.set_mode(NamingMode::Custom);
    assert_eq!(
        session.override_for("Trip_1920x1080.mov").map(|o| o.value.as_str()),
        Some("Holiday")
    );

    let orchestrator = local_orchestrator(
        &dir,
        Arc::new(FakeEngine::default()),
        FixedProbe::new(&[("Trip_1920x1080.mov", 20.0)]),
    );
    let result = orchestrator
        .submit(BatchRequest {
            files: vec![write_clip(&dir, "Trip_1920x1080.mov")],
            ratios: vec!["square".to_string()],
            style: RenderStyle::Blur,
            naming: session.snapshot(),
        })
        .await
        .unwrap();
    assert_eq!(result.files[0].outputs[0].filename, "Holiday_1x1.mp4");
}

fn remote_orchestrator(url: &str, probe: Arc<FixedProbe>) -> BatchOrchestrator {
    let client = RemoteJobClient::new(url)
        .unwrap()
        .with_poll_interval(Duration::from_millis(5));
    let strategy = RemoteJobStrategy::new(Arc::new(client), Arc::new(StaticTokenGate::new("tok")));
    let limits = TierLimits {
        mode: TierMode::Remote,
        ..TierLimits::default()
    };
    BatchOrchestrator::new(limits, Arc::new(strategy)).with_probe(probe)
}

#[tokio::test]
async fn disabled_upload_slots_fall_back_to_direct_upload() {
    let mut server = Server::new_async().await;
    let slots = server
        .mock("POST", "/api/upload-url")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;
    let direct = server
        .mock("POST", "/api/local-upload")
        .with_status(201)
        .with_body(r#"{"job_id":"job-7","file":{"key":"job-7/upload"}}"#)
        .expect(2)
        .create_async()
        .await;
    server
        .mock("POST", "/api/jobs")
        .match_body(Matcher::PartialJson(json!({
            "job_id": "job-7",
            "ratios": ["portrait", "square"],
            "style": "black"
        })))
        .with_status(201)
        .with_body(r#"{"job":{"id":"job-7","status":"queued"}}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/jobs/job-7/start")
        .with_body(r#"{"job":{"id":"job-7","status":"rendering"}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/jobs/job-7/status")
        .with_body(
            json!({"job": {
                "id": "job-7",
                "status": "done",
                "progress": 1.0,
                "results": [
                    {"original_name": "a.mp4", "outputs": [
                        {"filename": "a_9x16.mp4", "ratio_label": "9x16"},
                        {"filename": "a_1x1.mp4", "ratio_label": "1x1"}
                    ]},
                    {"original_name": "b.mp4", "outputs": [
                        {"filename": "b_9x16.mp4", "ratio_label": "9x16"},
                        {"filename": "b_1x1.mp4", "ratio_label": "1x1"}
                    ]}
                ]
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = remote_orchestrator(&server.url(), FixedProbe::new(&[("a.mp4", 12.0), ("b.mp4", 30.0)]));
    let result = orchestrator
        .submit(BatchRequest {
            files: vec![write_clip(&dir, "a.mp4"), write_clip(&dir, "b.mp4")],
            ratios: vec!["portrait".to_string(), "square".to_string()],
            style: RenderStyle::Black,
            naming: NamingSnapshot::new(NamingConfig::default()),
        })
        .await
        .unwrap();

    slots.assert_async().await;
    direct.assert_async().await;
    assert_eq!(result.processed_count, 2);
    assert_eq!(result.outcome(), BatchOutcome::Completed);
    assert_eq!(
        result.download_all_url,
        Some(format!("{}/download/job-7/bundle", server.url()))
    );
    assert_eq!(
        result.files[1].outputs[1].url,
        format!("{}/download/job-7/b_1x1.mp4", server.url())
    );
    assert_eq!(orchestrator.phase(), BatchPhase::Completed);
}

#[tokio::test]
async fn over_long_file_is_rejected_before_any_upload() {
    let mut server = Server::new_async().await;
    let slots = server
        .mock("POST", "/api/upload-url")
        .expect(0)
        .create_async()
        .await;
    let direct = server
        .mock("POST", "/api/local-upload")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = remote_orchestrator(&server.url(), FixedProbe::new(&[("long.mp4", 240.0)]));
    let err = orchestrator
        .submit(BatchRequest {
            files: vec![write_clip(&dir, "long.mp4")],
            ratios: vec!["square".to_string()],
            style: RenderStyle::Blur,
            naming: NamingSnapshot::new(NamingConfig::default()),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BatchError::Validation(SelectionError::DurationExceeded { .. })
    ));
    assert_eq!(err.user_message(), "long.mp4 is longer than 75 seconds (240 s).");
    slots.assert_async().await;
    direct.assert_async().await;
    assert_eq!(orchestrator.phase(), BatchPhase::Failed);
    assert!(!orchestrator.is_busy());
}
