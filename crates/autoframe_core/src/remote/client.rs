//! HTTP client for the render service job lifecycle.
//!
//! Every call is a single request/response. Polling loops take a
//! [`CancellationToken`] so the caller decides how long to wait.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::errors::{RemoteError, RemoteResult};
use super::types::{
    CreateJobRequest, DirectUpload, ErrorBody, Job, JobEnvelope, LegacyProgress,
    ProcessResponse, StartJobRequest, UploadSlot, UploadSlotRequest, UploadSpec, UsageStats,
};
use crate::models::{JobStatus, SourceFile};
use crate::naming::NamingPayload;

/// Error code the service sends with a 503 when the async pipeline is down.
pub const ASYNC_UNAVAILABLE_CODE: &str = "ASYNC_UNAVAILABLE";

/// Receives the uploaded fraction (0..=1) of the file in flight.
pub type UploadProgress = Arc<dyn Fn(f64) + Send + Sync>;

/// One file for the legacy single-shot `/process` endpoint.
#[derive(Debug, Clone)]
pub struct LegacyProcessRequest<'a> {
    pub batch_id: &'a str,
    pub file: &'a SourceFile,
    pub ratios: &'a [String],
    pub style: &'a str,
    pub naming: &'a NamingPayload,
    pub base_override: Option<&'a str>,
}

/// Client for the render service.
#[derive(Debug, Clone)]
pub struct RemoteJobClient {
    http: reqwest::Client,
    base_url: String,
    api_prefix: String,
    poll_interval: Duration,
}

impl RemoteJobClient {
    /// Create a client for the service at `base_url` (e.g. `https://render.example.com`).
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        reqwest::Url::parse(base_url).map_err(|_| RemoteError::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: "/api".to_string(),
            poll_interval: Duration::from_secs(3),
        })
    }

    /// Path prefix of the JSON API (default `/api`).
    pub fn with_api_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        self.api_prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    /// Interval between job status polls (default 3 s).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn site_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a service-relative URL absolute.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            self.site_url(url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// Bundle download for a finished job.
    pub fn download_all_url(&self, job_id: &str) -> String {
        self.site_url(&format!("/download/{}/bundle", job_id))
    }

    /// Ask for a pre-signed upload slot.
    ///
    /// A 503 means object storage is disabled and maps to
    /// [`RemoteError::SlotUnavailable`]; use [`upload_direct`](Self::upload_direct).
    pub async fn request_upload_slot(&self, file: &SourceFile, job_id: &str) -> RemoteResult<UploadSlot> {
        let body = UploadSlotRequest {
            job_id,
            filename: &file.name,
            size: file.size,
            content_type: &file.content_type,
        };
        let response = self.http.post(self.api_url("/upload-url")).json(&body).send().await?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            debug!("Upload slots disabled for {}", file.name);
            return Err(RemoteError::SlotUnavailable);
        }
        if !status.is_success() {
            let (message, _) = error_message(response, "Could not prepare upload").await;
            return Err(RemoteError::upload(&file.name, message));
        }
        parse_json(response, "/upload-url").await
    }

    /// Send the file bytes to a pre-signed slot.
    pub async fn upload_bytes(
        &self,
        file: &SourceFile,
        spec: &UploadSpec,
        on_progress: Option<UploadProgress>,
    ) -> RemoteResult<()> {
        let mut form = Form::new();
        for (name, value) in &spec.fields {
            form = form.text(name.clone(), value.clone());
        }
        form = form.part("file", file_part(file, on_progress).await?);

        let response = self.http.post(&spec.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::upload(
                &file.name,
                format!("HTTP {}", status.as_u16()),
            ));
        }
        Ok(())
    }

    /// Upload the file through the service itself.
    pub async fn upload_direct(
        &self,
        file: &SourceFile,
        job_id: &str,
        on_progress: Option<UploadProgress>,
    ) -> RemoteResult<DirectUpload> {
        let form = Form::new()
            .text("job_id", job_id.to_string())
            .part("video", file_part(file, on_progress).await?);

        let response = self
            .http
            .post(self.api_url("/local-upload"))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let (message, _) = error_message(response, "Upload failed").await;
            return Err(RemoteError::upload(&file.name, message));
        }
        parse_json(response, "/local-upload").await
    }

    /// Upload one file, falling back to a direct upload when slots are disabled.
    ///
    /// Returns the job id the service associated with the upload and the
    /// storage key of the file.
    pub async fn upload_file(
        &self,
        file: &SourceFile,
        job_id: &str,
        on_progress: Option<UploadProgress>,
    ) -> RemoteResult<(String, String)> {
        match self.request_upload_slot(file, job_id).await {
            Ok(slot) => {
                self.upload_bytes(file, &slot.upload, on_progress).await?;
                Ok((slot.job_id, slot.file.key))
            }
            Err(RemoteError::SlotUnavailable) => {
                info!("Object storage disabled, uploading {} directly", file.name);
                let direct = self.upload_direct(file, job_id, on_progress).await?;
                Ok((direct.job_id, direct.file.key))
            }
            Err(e) => Err(e),
        }
    }

    /// Create a job covering every uploaded file and ratio.
    pub async fn create_job(&self, request: &CreateJobRequest<'_>) -> RemoteResult<Job> {
        let response = self.http.post(self.api_url("/jobs")).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let (message, code) = error_message(response, "Could not create job").await;
            if status == StatusCode::SERVICE_UNAVAILABLE
                && code.as_deref() == Some(ASYNC_UNAVAILABLE_CODE)
            {
                return Err(RemoteError::AsyncUnavailable(message));
            }
            return Err(RemoteError::JobCreate(message));
        }
        let envelope: JobEnvelope = parse_json(response, "/jobs").await?;
        Ok(envelope.job)
    }

    /// Start a created job. An empty token is sent when the gate gave none.
    pub async fn start_job(&self, job_id: &str, reward_token: &str) -> RemoteResult<Job> {
        let path = format!("/jobs/{}/start", job_id);
        let response = self
            .http
            .post(self.api_url(&path))
            .json(&StartJobRequest { reward_token })
            .send()
            .await?;
        if !response.status().is_success() {
            let (message, _) = error_message(response, "Could not start job").await;
            return Err(RemoteError::JobStart(message));
        }
        let envelope: JobEnvelope = parse_json(response, &path).await?;
        Ok(envelope.job)
    }

    /// Fetch the current job record once.
    pub async fn job_status(&self, job_id: &str) -> RemoteResult<Job> {
        let path = format!("/jobs/{}/status", job_id);
        let response = self.http.get(self.api_url(&path)).send().await?;
        if !response.status().is_success() {
            let (message, _) = error_message(response, "Status check failed").await;
            return Err(RemoteError::JobStatus(message));
        }
        let envelope: JobEnvelope = parse_json(response, &path).await?;
        Ok(envelope.job)
    }

    /// Poll until the job is `done` or `failed`, or `cancel` fires.
    ///
    /// `on_update` sees every record fetched, including the terminal one.
    pub async fn poll_job_status<F>(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> RemoteResult<Job>
    where
        F: FnMut(&Job) + Send,
    {
        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => return Err(RemoteError::Cancelled),
                job = self.job_status(job_id) => job?,
            };
            on_update(&job);

            match job.status {
                JobStatus::Done => return Ok(job),
                JobStatus::Failed => {
                    let message = job
                        .message
                        .clone()
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| "Rendering failed.".to_string());
                    warn!("Job {} failed: {}", job_id, message);
                    return Err(RemoteError::JobFailed(message));
                }
                JobStatus::Queued | JobStatus::Rendering => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(RemoteError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Legacy per-batch progress (`GET /progress/{id}`).
    ///
    /// The service answers 404 with a zero record until work begins, so the
    /// body is read regardless of status.
    pub async fn legacy_progress(&self, batch_id: &str) -> RemoteResult<LegacyProgress> {
        let path = format!("/progress/{}", batch_id);
        let response = self.http.get(self.site_url(&path)).send().await?;
        parse_json(response, &path).await
    }

    /// Upload and render one file through the legacy `/api/process` endpoint.
    pub async fn process_legacy(
        &self,
        request: &LegacyProcessRequest<'_>,
        on_progress: Option<UploadProgress>,
    ) -> RemoteResult<ProcessResponse> {
        let naming = request.naming;
        let flag = |value: bool| String::from(if value { "1" } else { "0" });

        let mut form = Form::new()
            .text("style", request.style.to_string())
            .text("batch_id", request.batch_id.to_string());
        for ratio in request.ratios {
            form = form.text("ratios", ratio.clone());
        }
        form = form
            .text("naming_mode", naming.mode.to_string())
            .text("naming_preset", naming.pattern_choice.clone())
            .text("naming_custom_pattern", naming.custom_pattern.clone())
            .text("naming_auto_clean", flag(naming.auto_clean))
            .text("naming_keep_tokens", flag(naming.keep_tokens))
            .text("naming_add_sequence", flag(naming.add_sequence))
            .text("naming_append_date", flag(naming.append_date))
            .text("naming_label_mode", naming.label_mode.to_string());
        if let Some(base) = request.base_override {
            form = form.text("base_override", base.to_string());
        }
        form = form.part("video", file_part(request.file, on_progress).await?);

        let response = self
            .http
            .post(self.api_url("/process"))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let (message, _) = error_message(response, "Processing failed").await;
            return Err(RemoteError::process(&request.file.name, message));
        }
        parse_json(response, "/api/process").await
    }

    /// Renders used today by this client.
    pub async fn fetch_usage(&self) -> RemoteResult<UsageStats> {
        let response = self.http.get(self.api_url("/usage")).send().await?;
        if !response.status().is_success() {
            let (message, _) = error_message(response, "Usage check failed").await;
            return Err(RemoteError::invalid_response("/usage", message));
        }
        parse_json(response, "/usage").await
    }
}

/// Multipart part streaming the file from disk, reporting progress per chunk.
async fn file_part(file: &SourceFile, on_progress: Option<UploadProgress>) -> RemoteResult<Part> {
    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(|e| RemoteError::io(&file.path, e))?;
    let total = file.size.max(1) as f64;
    let mut sent: u64 = 0;
    let stream = ReaderStream::new(handle).map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            if let Some(callback) = &on_progress {
                callback((sent as f64 / total).min(1.0));
            }
        }
        chunk
    });

    let part = Part::stream_with_length(Body::wrap_stream(stream), file.size)
        .file_name(file.name.clone())
        .mime_str(&file.content_type)?;
    Ok(part)
}

/// Server-provided error text, else `"{fallback} (HTTP {status})"`, plus the error code.
async fn error_message(response: Response, fallback: &str) -> (String, Option<String>) {
    let status = response.status().as_u16();
    let body: ErrorBody = response
        .text()
        .await
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default();
    let message = body
        .error
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("{} (HTTP {})", fallback, status));
    (message, body.code)
}

async fn parse_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> RemoteResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| RemoteError::invalid_response(endpoint, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingConfig;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn source(dir: &tempfile::TempDir, name: &str) -> SourceFile {
        let path = dir.path().join(name);
        std::fs::write(&path, b"not really a video").unwrap();
        SourceFile::from_path(&path).unwrap()
    }

    fn client(server: &ServerGuard) -> RemoteJobClient {
        RemoteJobClient::new(&server.url())
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            RemoteJobClient::new("not a url"),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn builds_urls() {
        let client = RemoteJobClient::new("https://render.example.com/")
            .unwrap()
            .with_api_prefix("v2/");
        assert_eq!(client.api_url("/jobs"), "https://render.example.com/v2/jobs");
        assert_eq!(
            client.download_all_url("j1"),
            "https://render.example.com/download/j1/bundle"
        );
        assert_eq!(
            client.resolve_url("/download/j1/a.mp4"),
            "https://render.example.com/download/j1/a.mp4"
        );
        assert_eq!(client.resolve_url("https://cdn/x.mp4"), "https://cdn/x.mp4");
    }

    #[tokio::test]
    async fn disabled_storage_maps_to_slot_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/upload-url")
            .with_status(503)
            .with_body(r#"{"error":"Object storage not configured."}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let err = client(&server)
            .request_upload_slot(&source(&dir, "a.mp4"), "j1")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::SlotUnavailable));
    }

    #[tokio::test]
    async fn upload_file_uses_presigned_slot() {
        let mut server = Server::new_async().await;
        let slot = server
            .mock("POST", "/api/upload-url")
            .match_body(Matcher::PartialJson(json!({"job_id": "j1", "filename": "a.mp4"})))
            .with_status(201)
            .with_body(
                json!({
                    "job_id": "j1",
                    "upload": {"url": format!("{}/bucket", server.url()), "fields": {"key": "uploads/j1/a.mp4"}},
                    "file": {"key": "uploads/j1/a.mp4"}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let bucket = server
            .mock("POST", "/bucket")
            .match_body(Matcher::Regex("not really a video".to_string()))
            .with_status(204)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = seen.clone();
        let progress: UploadProgress = Arc::new(move |fraction| {
            seen_clone.store((fraction * 100.0) as u64, Ordering::SeqCst);
        });

        let (job_id, key) = client(&server)
            .upload_file(&source(&dir, "a.mp4"), "j1", Some(progress))
            .await
            .unwrap();
        assert_eq!(job_id, "j1");
        assert_eq!(key, "uploads/j1/a.mp4");
        assert_eq!(seen.load(Ordering::SeqCst), 100);
        slot.assert_async().await;
        bucket.assert_async().await;
    }

    #[tokio::test]
    async fn upload_file_falls_back_to_direct_upload() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/upload-url")
            .with_status(503)
            .create_async()
            .await;
        let direct = server
            .mock("POST", "/api/local-upload")
            .with_status(201)
            .with_body(r#"{"job_id":"j1","file":{"key":"j1/a.mp4"}}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let (_, key) = client(&server)
            .upload_file(&source(&dir, "a.mp4"), "j1", None)
            .await
            .unwrap();
        assert_eq!(key, "j1/a.mp4");
        direct.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_upload_reports_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/bucket")
            .with_status(403)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = UploadSpec {
            url: format!("{}/bucket", server.url()),
            fields: Default::default(),
        };

        let err = client(&server)
            .upload_bytes(&source(&dir, "a.mp4"), &spec, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Upload failed for a.mp4: HTTP 403");
    }

    #[tokio::test]
    async fn create_job_distinguishes_async_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/jobs")
            .with_status(503)
            .with_body(r#"{"error":"Async rendering is unavailable.","code":"ASYNC_UNAVAILABLE"}"#)
            .create_async()
            .await;
        let naming = NamingPayload::from(&NamingConfig::default());
        let request = CreateJobRequest {
            job_id: "j1",
            files: &[],
            ratios: &["square".to_string()],
            style: "fill",
            naming: &naming,
        };

        let err = client(&server).create_job(&request).await.unwrap_err();
        assert!(matches!(err, RemoteError::AsyncUnavailable(ref m) if m == "Async rendering is unavailable."));
    }

    #[tokio::test]
    async fn create_job_surfaces_server_message_or_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/jobs")
            .with_status(400)
            .with_body(r#"{"error":"Select at least one aspect ratio."}"#)
            .create_async()
            .await;
        let naming = NamingPayload::from(&NamingConfig::default());
        let request = CreateJobRequest {
            job_id: "j1",
            files: &[],
            ratios: &[],
            style: "fill",
            naming: &naming,
        };
        let err = client(&server).create_job(&request).await.unwrap_err();
        assert_eq!(err.user_message(), "Select at least one aspect ratio.");

        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/jobs/j1/start")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;
        let err = client(&server).start_job("j1", "").await.unwrap_err();
        assert_eq!(err.user_message(), "Could not start job (HTTP 500)");
    }

    #[tokio::test]
    async fn start_job_sends_reward_token() {
        let mut server = Server::new_async().await;
        let start = server
            .mock("POST", "/api/jobs/j1/start")
            .match_body(Matcher::PartialJson(json!({"reward_token": "tok"})))
            .with_status(202)
            .with_body(r#"{"job":{"id":"j1","status":"queued"}}"#)
            .create_async()
            .await;

        let job = client(&server).start_job("j1", "tok").await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        start.assert_async().await;
    }

    #[tokio::test]
    async fn poll_returns_done_job() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/jobs/j1/status")
            .with_status(200)
            .with_body(
                json!({"job": {"id": "j1", "status": "completed", "progress": 1.0, "results": [
                    {"original_name": "a.mp4", "outputs": [{"filename": "a_1x1.mp4", "ratio_label": "1:1 Square", "url": "/download/j1/a_1x1.mp4"}]}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let mut updates = 0;
        let job = client(&server)
            .poll_job_status("j1", &CancellationToken::new(), |_| updates += 1)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.results[0].outputs[0].filename, "a_1x1.mp4");
        assert_eq!(updates, 1);
    }

    #[tokio::test]
    async fn poll_raises_server_failure_message() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/jobs/j1/status")
            .with_status(200)
            .with_body(r#"{"job":{"id":"j1","status":"failed","message":"Clip too long"}}"#)
            .create_async()
            .await;

        let err = client(&server)
            .poll_job_status("j1", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::JobFailed(ref m) if m == "Clip too long"));
    }

    #[tokio::test]
    async fn poll_stops_when_cancelled() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/jobs/j1/status")
            .with_status(200)
            .with_body(r#"{"job":{"id":"j1","status":"rendering","progress":0.3}}"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client(&server)
            .poll_job_status("j1", &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Cancelled));
    }

    #[tokio::test]
    async fn legacy_progress_reads_404_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/progress/b1")
            .with_status(404)
            .with_body(r#"{"progress":0.0,"status":"unknown"}"#)
            .create_async()
            .await;

        let progress = client(&server).legacy_progress("b1").await.unwrap();
        assert_eq!(progress.status, "unknown");
        assert_eq!(progress.progress, 0.0);
    }

    #[tokio::test]
    async fn legacy_process_sends_naming_fields() {
        let mut server = Server::new_async().await;
        let form_route = server
            .mock("POST", "/process")
            .with_status(302)
            .with_header("location", "/")
            .with_body("<html>Redirecting</html>")
            .expect(0)
            .create_async()
            .await;
        let process = server
            .mock("POST", "/api/process")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="naming_mode"\s+custom"#.to_string()),
                Matcher::Regex(r#"name="base_override"\s+Promo"#.to_string()),
                Matcher::Regex(r#"name="ratios"\s+square"#.to_string()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "batch_id": "b1",
                    "result": {"original_name": "a.mp4", "style_label": "Fill & crop",
                               "outputs": [{"filename": "Promo_1x1.mp4", "ratio_label": "1:1 Square", "url": "/download/b1/Promo_1x1.mp4"}]},
                    "downloads": {"bundle": "/download/b1/bundle"}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let file = source(&dir, "a.mp4");
        let naming = NamingPayload::from(&NamingConfig::custom_defaults());
        let ratios = vec!["square".to_string()];

        let response = client(&server)
            .process_legacy(
                &LegacyProcessRequest {
                    batch_id: "b1",
                    file: &file,
                    ratios: &ratios,
                    style: "fill",
                    naming: &naming,
                    base_override: Some("Promo"),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.result.outputs[0].filename, "Promo_1x1.mp4");
        assert_eq!(response.downloads.bundle.as_deref(), Some("/download/b1/bundle"));
        process.assert_async().await;
        form_route.assert_async().await;
    }
}
