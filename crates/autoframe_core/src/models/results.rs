//! Per-batch results.

use serde::{Deserialize, Serialize};

/// One rendered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Fetchable location (`file://` for local renders).
    pub url: String,
    /// Unique within the batch.
    pub filename: String,
    pub ratio_label: String,
    pub style_label: String,
    /// Display caption, e.g. `1:1 Square • Fill & crop`.
    #[serde(default)]
    pub label: String,
}

/// Everything rendered for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileResult {
    pub original_name: String,
    pub style_label: String,
    /// Ratio labels in selection order, without repeats.
    pub ratio_labels: Vec<String>,
    pub outputs: Vec<OutputArtifact>,
}

impl FileResult {
    pub fn new(original_name: impl Into<String>, style_label: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            style_label: style_label.into(),
            ratio_labels: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append an output, recording its ratio label once.
    pub fn push_output(&mut self, artifact: OutputArtifact) {
        if !self.ratio_labels.contains(&artifact.ratio_label) {
            self.ratio_labels.push(artifact.ratio_label.clone());
        }
        self.outputs.push(artifact);
    }
}

/// Terminal state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed,
    PartiallyFailed,
    Failed,
}

/// Aggregate result of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    /// Name of the strategy that produced the result.
    pub strategy: String,
    pub files: Vec<FileResult>,
    /// Source files that rendered successfully.
    pub processed_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub download_all_url: Option<String>,
}

impl BatchResult {
    pub fn new(batch_id: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            strategy: strategy.into(),
            files: Vec::new(),
            processed_count: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
            download_all_url: None,
        }
    }

    pub fn output_count(&self) -> usize {
        self.files.iter().map(|f| f.outputs.len()).sum()
    }

    pub fn outcome(&self) -> BatchOutcome {
        if self.errors.is_empty() {
            BatchOutcome::Completed
        } else if self.processed_count > 0 {
            BatchOutcome::PartiallyFailed
        } else {
            BatchOutcome::Failed
        }
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        let outputs = self.output_count();
        let mut parts = Vec::new();
        if outputs > 0 {
            parts.push(format!("Rendered {} clip(s).", outputs));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("Warnings: {}", self.warnings.join(" • ")));
        }
        if !self.errors.is_empty() {
            parts.push(format!("Errors: {}", self.errors.join(" • ")));
        }
        if outputs == 0 {
            parts.push("Nothing was rendered.".to_string());
        }
        parts.join(" • ")
    }
}
