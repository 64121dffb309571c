//! Settings struct with TOML-based sections.
//!
//! Sections map to TOML tables and can be saved independently.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};
use crate::models::{TierLimits, TierMode};

/// Root settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tier: TierSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub progress: ProgressSettings,

    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Admission limits and execution mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSettings {
    #[serde(default)]
    pub mode: TierMode,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: u32,

    #[serde(default = "default_max_ratios")]
    pub max_ratios: usize,

    /// Renders per day; absent means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,
}

fn default_max_files() -> usize {
    10
}

fn default_max_file_size_bytes() -> u64 {
    120 * 1024 * 1024
}

fn default_max_duration_seconds() -> u32 {
    75
}

fn default_max_ratios() -> usize {
    3
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            mode: TierMode::Local,
            max_files: default_max_files(),
            max_file_size_bytes: default_max_file_size_bytes(),
            max_duration_seconds: default_max_duration_seconds(),
            max_ratios: default_max_ratios(),
            daily_limit: None,
        }
    }
}

impl TierSettings {
    pub fn limits(&self) -> TierLimits {
        TierLimits {
            max_files: self.max_files,
            max_file_size_bytes: self.max_file_size_bytes,
            max_duration_seconds: self.max_duration_seconds,
            max_ratios: self.max_ratios,
            mode: self.mode,
            daily_limit: self.daily_limit,
        }
    }
}

/// Render service connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Progress polling interval while a legacy `/api/process` request runs.
    #[serde(default = "default_legacy_poll_interval_ms")]
    pub legacy_poll_interval_ms: u64,

    /// Fall back to per-file processing when the job queue is unavailable.
    #[serde(default = "default_true")]
    pub legacy_fallback: bool,

    /// Fixed unlock token; without one the job starts with an empty token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_legacy_poll_interval_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            poll_interval_ms: default_poll_interval_ms(),
            legacy_poll_interval_ms: default_legacy_poll_interval_ms(),
            legacy_fallback: true,
            reward_token: None,
        }
    }
}

impl RemoteSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn legacy_poll_interval(&self) -> Duration {
        Duration::from_millis(self.legacy_poll_interval_ms.max(1))
    }
}

/// Local transcoder binaries and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    #[serde(default = "default_video_preset")]
    pub video_preset: String,

    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_video_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    20
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            video_preset: default_video_preset(),
            crf: default_crf(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// Progress indicator animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    200
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl ProgressSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Output, scratch, log and naming-store folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Folder holding persisted naming options.
    #[serde(default = "default_naming_store")]
    pub naming_store: String,
}

fn default_output_folder() -> String {
    "autoframe_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_naming_store() -> String {
    ".state".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
            naming_store: default_naming_store(),
        }
    }
}

impl PathSettings {
    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(&self.output_folder)
    }

    pub fn temp_root(&self) -> PathBuf {
        PathBuf::from(&self.temp_root)
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.logs_folder)
    }

    pub fn naming_store(&self) -> PathBuf {
        PathBuf::from(&self.naming_store)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,

    /// Throttle progress lines in batch logs.
    #[serde(default = "default_true")]
    pub compact: bool,

    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    #[serde(default = "default_error_tail")]
    pub error_tail: u32,
}

fn default_progress_step() -> u32 {
    20
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: default_progress_step(),
            error_tail: default_error_tail(),
        }
    }
}

impl LoggingSettings {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            progress_step: self.progress_step,
            error_tail: self.error_tail as usize,
            show_timestamps: true,
        }
    }
}

/// Config sections for targeted saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Tier,
    Remote,
    Engine,
    Progress,
    Paths,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Tier,
        ConfigSection::Remote,
        ConfigSection::Engine,
        ConfigSection::Progress,
        ConfigSection::Paths,
        ConfigSection::Logging,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tier => "tier",
            ConfigSection::Remote => "remote",
            ConfigSection::Engine => "engine",
            ConfigSection::Progress => "progress",
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the table in a fresh config file.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Tier => "Batch limits and render mode (local | remote)",
            ConfigSection::Remote => "Render service",
            ConfigSection::Engine => "Local ffmpeg rendering",
            ConfigSection::Progress => "Progress indicator",
            ConfigSection::Paths => "Output, scratch and log directories",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
