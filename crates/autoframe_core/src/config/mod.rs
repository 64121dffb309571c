//! Configuration management.
//!
//! - TOML file with one table per concern
//! - Atomic writes (temp file, then rename)
//! - Section-level updates
//!
//! ```no_run
//! use autoframe_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/autoframe.toml");
//! config.load_or_create().unwrap();
//!
//! let limits = config.settings().tier.limits();
//! println!("Up to {} files per batch", limits.max_files);
//!
//! config.settings_mut().tier.max_ratios = 2;
//! config.update_section(ConfigSection::Tier).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{validate, ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EngineSettings, LoggingSettings, PathSettings, ProgressSettings,
    RemoteSettings, Settings, TierSettings,
};
