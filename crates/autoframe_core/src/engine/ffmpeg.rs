//! ffmpeg-backed [`TranscodeEngine`].

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::errors::{EngineError, EngineResult};
use super::filters::filter_graph;
use super::transcode::{EngineProgress, TranscodeEngine, TranscodeJob};

/// Lines of ffmpeg stderr kept for failure reports.
const STDERR_TAIL_LINES: usize = 20;

/// One parsed line of ffmpeg's `-progress` key=value stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressLine {
    /// Output timestamp in seconds.
    OutTime(f64),
    /// `progress=end`.
    End,
}

/// Parse a `-progress pipe:1` line. Unrelated keys yield `None`.
///
/// `out_time_ms` is reported in microseconds despite its name.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_ms" | "out_time_us" => value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|micros| *micros >= 0)
            .map(|micros| ProgressLine::OutTime(micros as f64 / 1_000_000.0)),
        "progress" if value.trim() == "end" => Some(ProgressLine::End),
        _ => None,
    }
}

/// Fraction of `duration` covered by `seconds`, clamped to `[0, 1]`.
pub fn progress_fraction(seconds: f64, duration: Option<f64>) -> Option<f64> {
    let duration = duration.filter(|d| *d > 0.0)?;
    Some((seconds / duration).clamp(0.0, 1.0))
}

/// Runs the `ffmpeg` binary with H.264/AAC output.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_path: PathBuf,
    video_preset: String,
    crf: u8,
    audio_bitrate: String,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            video_preset: "veryfast".to_string(),
            crf: 20,
            audio_bitrate: "128k".to_string(),
        }
    }

    pub fn with_encoding(mut self, preset: impl Into<String>, crf: u8, audio_bitrate: impl Into<String>) -> Self {
        self.video_preset = preset.into();
        self.crf = crf;
        self.audio_bitrate = audio_bitrate.into();
        self
    }

    /// Full argument list for `job`.
    pub fn build_args(&self, job: &TranscodeJob) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            job.input.to_string_lossy().into_owned(),
            "-filter_complex".to_string(),
            filter_graph(job.style, job.width, job.height),
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.video_preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-nostats".to_string(),
            job.output.to_string_lossy().into_owned(),
        ]
    }
}

/// Quote `arg` for display when it holds anything beyond plain path characters.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:+=,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn command_line(&self, job: &TranscodeJob) -> Option<String> {
        let mut parts = vec![shell_quote(&self.ffmpeg_path.to_string_lossy())];
        parts.extend(self.build_args(job).iter().map(|arg| shell_quote(arg)));
        Some(parts.join(" "))
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        on_progress: EngineProgress<'_>,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        let program = self.ffmpeg_path.display().to_string();
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(self.build_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running ffmpeg: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| EngineError::spawn(&program, e))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::spawn(&program, io::Error::other("stdout not captured")))?;
        let stderr = child.stderr.take();

        let stderr_task = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            Vec::from(tail).join("\n")
        });

        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to stop ffmpeg: {}", e);
                    }
                    return Err(EngineError::Cancelled);
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match parse_progress_line(&line) {
                        Some(ProgressLine::OutTime(seconds)) => {
                            if let Some(fraction) = progress_fraction(seconds, job.duration_hint) {
                                on_progress(fraction);
                            }
                        }
                        Some(ProgressLine::End) => on_progress(1.0),
                        None => {}
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Lost ffmpeg progress stream: {}", e);
                        break;
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::io(&job.output, e))?;
        let tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let status = status
                .code()
                .map(|code| format!("exit code {}", code))
                .unwrap_or_else(|| "a signal".to_string());
            return Err(EngineError::failed(status, tail));
        }

        on_progress(1.0);
        Ok(())
    }
}
