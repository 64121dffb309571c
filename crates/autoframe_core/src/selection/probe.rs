//! Duration probing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

/// Reads a media file's duration.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds, or `None` when it cannot be determined.
    async fn probe_duration(&self, path: &Path) -> Option<f64>;
}

/// Probe backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        if !path.exists() {
            tracing::warn!("Cannot probe missing file {}", path.display());
            return None;
        }

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.binary.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            tracing::warn!(
                "ffprobe exited with {} for {}: {}",
                output.status.code().unwrap_or(-1),
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse ffprobe's bare duration output (`12.345000`, or `N/A`).
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_duration("12.500000\n"), Some(12.5));
        assert_eq!(parse_duration("\n  3\n"), Some(3.0));
    }

    #[test]
    fn rejects_unknown_duration() {
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("-1"), None);
    }

    #[tokio::test]
    async fn missing_file_has_no_duration() {
        let probe = FfprobeProbe::default();
        assert_eq!(probe.probe_duration(Path::new("/definitely/not/here.mp4")).await, None);
    }
}
