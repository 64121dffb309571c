//! Wire types for the render service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::JobStatus;
use crate::naming::NamingPayload;

/// Body of `POST /upload-url`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSlotRequest<'a> {
    pub job_id: &'a str,
    pub filename: &'a str,
    pub size: u64,
    pub content_type: &'a str,
}

/// Pre-signed form upload: POST the fields plus the file to `url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSpec {
    pub url: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// Storage reference for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredFile {
    pub key: String,
}

/// Reply from `POST /upload-url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSlot {
    pub job_id: String,
    pub upload: UploadSpec,
    pub file: StoredFile,
}

/// Reply from `POST /local-upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectUpload {
    pub job_id: String,
    pub file: StoredFile,
}

/// One uploaded source, as listed in a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub key: String,
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    /// Custom base name (custom naming mode only).
    #[serde(default)]
    pub base_override: Option<String>,
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateJobRequest<'a> {
    pub job_id: &'a str,
    pub files: &'a [FileRecord],
    pub ratios: &'a [String],
    pub style: &'a str,
    pub naming: &'a NamingPayload,
}

/// Body of `POST /jobs/{id}/start`.
#[derive(Debug, Clone, Serialize)]
pub struct StartJobRequest<'a> {
    pub reward_token: &'a str,
}

/// A rendered output as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RemoteOutput {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ratio_label: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Outputs for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RemoteFileResult {
    pub original_name: String,
    #[serde(default)]
    pub outputs: Vec<RemoteOutput>,
}

/// Server-side job record.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub ratios: Vec<String>,
    /// Fraction in `[0, 1]`.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<RemoteFileResult>,
}

/// `{ "job": {...} }` wrapper used by the job endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEnvelope {
    pub job: Job,
}

/// Error body: `{ "error": "...", "code": "..." }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Reply from the legacy `GET /progress/{batch_id}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LegacyProgress {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub progress: f64,
    #[serde(default)]
    pub status: String,
}

/// `result` block of a legacy `/api/process` reply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProcessedFile {
    pub original_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub style_label: Option<String>,
    #[serde(default)]
    pub ratio_labels: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<RemoteOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProcessDownloads {
    #[serde(default)]
    pub bundle: Option<String>,
}

/// Reply from legacy `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessResponse {
    pub batch_id: String,
    pub result: ProcessedFile,
    #[serde(default)]
    pub downloads: ProcessDownloads,
}

/// Reply from `GET /usage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub renders_today: u32,
}

/// Accept numbers, numeric strings and null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_parses_with_missing_fields() {
        let job: Job = serde_json::from_str(r#"{"id":"j1","status":"processing"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Rendering);
        assert_eq!(job.progress, 0.0);
        assert!(job.results.is_empty());
    }

    #[test]
    fn job_progress_accepts_strings_and_null() {
        let job: Job = serde_json::from_str(r#"{"id":"j1","progress":"0.5"}"#).unwrap();
        assert_eq!(job.progress, 0.5);
        let job: Job = serde_json::from_str(r#"{"id":"j1","progress":null}"#).unwrap();
        assert_eq!(job.progress, 0.0);
    }

    #[test]
    fn file_record_serializes_snake_case() {
        let record = FileRecord {
            key: "uploads/j1/a.mp4".into(),
            original_name: "a.mp4".into(),
            size: 10,
            content_type: "video/mp4".into(),
            base_override: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["original_name"], "a.mp4");
        assert!(value["base_override"].is_null());
    }
}
