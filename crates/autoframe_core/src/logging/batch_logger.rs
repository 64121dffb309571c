//! Per-batch log file.
//!
//! Each batch run writes `{batch_id}.log` in the logs folder. Lines are also
//! forwarded to an optional host callback. Warnings and errors are kept in a
//! tail buffer that is replayed when the batch fails.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

pub struct BatchLogger {
    batch_id: String,
    log_path: Option<PathBuf>,
    writer: Mutex<Option<BufWriter<File>>>,
    callback: Option<LogCallback>,
    config: LogConfig,
    tail: Mutex<VecDeque<String>>,
    last_progress: Mutex<Option<u32>>,
}

impl BatchLogger {
    /// Create a logger writing to `log_dir/{batch_id}.log`.
    pub fn new(
        batch_id: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let batch_id = batch_id.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_log_name(&batch_id)));
        let file = File::create(&log_path)?;

        let mut logger = Self::detached(batch_id, config, callback);
        logger.log_path = Some(log_path);
        logger.writer = Mutex::new(Some(BufWriter::new(file)));
        Ok(logger)
    }

    /// A logger without a file; lines only reach the callback.
    pub fn detached(batch_id: impl Into<String>, config: LogConfig, callback: Option<LogCallback>) -> Self {
        let tail_len = config.error_tail;
        Self {
            batch_id: batch_id.into(),
            log_path: None,
            writer: Mutex::new(None),
            callback,
            config,
            tail: Mutex::new(VecDeque::with_capacity(tail_len)),
            last_progress: Mutex::new(None),
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        self.output(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        tracing::info!(batch = %self.batch_id, "{}", message);
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(batch = %self.batch_id, "{}", message);
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(batch = %self.batch_id, "{}", message);
        let msg = MessagePrefix::Warning.format(message);
        self.remember(&msg);
        self.log(LogLevel::Warn, &msg);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(batch = %self.batch_id, "{}", message);
        let msg = MessagePrefix::Error.format(message);
        self.remember(&msg);
        self.log(LogLevel::Error, &msg);
    }

    pub fn phase(&self, name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(name));
    }

    pub fn command(&self, command: &str) {
        self.log(LogLevel::Debug, &MessagePrefix::Command.format(command));
    }

    pub fn validation(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Validation.format(message));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log overall progress. In compact mode only step boundaries and 100 %
    /// are written. Returns whether the line was written.
    pub fn progress(&self, percent: f64) -> bool {
        let percent = percent.clamp(0.0, 100.0).floor() as u32;
        {
            let mut last = self.last_progress.lock();
            if self.config.compact {
                let step = self.config.progress_step.max(1);
                if let Some(prev) = *last {
                    if percent / step <= prev / step && !(percent == 100 && prev < 100) {
                        return false;
                    }
                }
            } else if *last == Some(percent) {
                return false;
            }
            *last = Some(percent);
        }
        self.log(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// Replay remembered warnings and errors under a header.
    pub fn show_tail(&self, header: &str) {
        let lines: Vec<String> = self.tail.lock().iter().cloned().collect();
        if lines.is_empty() {
            return;
        }
        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in lines {
            self.output(&self.format_message(&line));
        }
    }

    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.writer.lock() {
            let _ = writer.flush();
        }
    }

    pub fn close(&self) {
        self.flush();
        *self.writer.lock() = None;
    }

    fn remember(&self, line: &str) {
        if self.config.error_tail == 0 {
            return;
        }
        let mut tail = self.tail.lock();
        if tail.len() >= self.config.error_tail {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(ref callback) = self.callback {
            callback(formatted);
        }
    }
}

impl Drop for BatchLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn sanitize_log_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
