//! Logging for AutoFrame.
//!
//! - Process-wide `tracing` subscriber ([`init_tracing`])
//! - Per-batch log files with host callback and error tail ([`BatchLogger`])
//!
//! ```no_run
//! use autoframe_core::logging::{BatchLogger, LogConfig};
//!
//! let logger = BatchLogger::new("b1", "/tmp/autoframe/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Dispatching");
//! logger.progress(40.0);
//! logger.success("Rendered 3 clip(s).");
//! ```

mod batch_logger;
mod types;

pub use batch_logger::BatchLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides `default_level`.
///
/// Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Subscriber for tests; only warnings and above. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn level_to_filter_str(level: LogLevel) -> &'static str {
    level.as_str()
}
