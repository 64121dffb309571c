//! Reads and writes the settings file.
//!
//! - Atomic writes (temp file, then rename)
//! - Section-level updates that keep comments elsewhere in the file
//! - Validation on load

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};
use crate::models::TierMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Settings file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Settings file could not be edited in place: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("No settings file at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads, validates and saves [`Settings`].
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Does not read the file; call [`load`](Self::load) or
    /// [`load_or_create`](Self::load_or_create).
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory changes are written by [`save`](Self::save) or
    /// [`update_section`](Self::update_section).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }
        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        validate(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Load the file, or write defaults if it does not exist.
    ///
    /// Files with unknown tables or missing keys are rewritten with defaults filled in.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let (settings, was_modified) = parse_and_check(&content)?;
            validate(&settings)?;
            self.settings = settings;
            if was_modified {
                tracing::info!("Filling in defaults in {}", self.config_path.display());
                self.save()?;
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Create the output, scratch, log and naming-store directories.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let paths = &self.settings.paths;
        for dir in [
            paths.output_folder(),
            paths.temp_root(),
            paths.logs_folder(),
            paths.naming_store(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Save the whole config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.render_commented()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Rewrite one section from memory, re-reading the rest from disk.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current.is_empty() {
            DocumentMut::new()
        } else {
            current.parse()?
        };

        let section_doc: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        let text = match section {
            ConfigSection::Tier => toml::to_string_pretty(&s.tier)?,
            ConfigSection::Remote => toml::to_string_pretty(&s.remote)?,
            ConfigSection::Engine => toml::to_string_pretty(&s.engine)?,
            ConfigSection::Progress => toml::to_string_pretty(&s.progress)?,
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
        };
        Ok(text)
    }

    fn render_commented(&self) -> ConfigResult<String> {
        let mut output = String::new();
        output.push_str("# AutoFrame Configuration\n");
        output.push_str(
            "# This file is auto-generated. Comments may be preserved on section updates.\n",
        );

        for section in ConfigSection::ALL {
            output.push('\n');
            output.push_str(&format!("# {}\n", section.description()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in self.section_toml(section)?.lines() {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

/// Parse settings and report whether the file differs from its normalized form.
fn parse_and_check(content: &str) -> ConfigResult<(Settings, bool)> {
    let doc: DocumentMut = content.parse()?;
    let settings: Settings = toml::from_str(content)?;

    let known: Vec<&str> = ConfigSection::ALL.iter().map(|s| s.table_name()).collect();
    let has_unknown = doc.iter().any(|(key, _)| !known.contains(&key));

    let missing_defaults = ConfigSection::ALL.iter().any(|section| {
        doc.get(section.table_name())
            .and_then(Item::as_table)
            .map(|table| table.len() < expected_key_count(&settings, *section))
            .unwrap_or(true)
    });

    Ok((settings, has_unknown || missing_defaults))
}

fn expected_key_count(settings: &Settings, section: ConfigSection) -> usize {
    let value = match section {
        ConfigSection::Tier => toml::Value::try_from(&settings.tier),
        ConfigSection::Remote => toml::Value::try_from(&settings.remote),
        ConfigSection::Engine => toml::Value::try_from(&settings.engine),
        ConfigSection::Progress => toml::Value::try_from(&settings.progress),
        ConfigSection::Paths => toml::Value::try_from(&settings.paths),
        ConfigSection::Logging => toml::Value::try_from(&settings.logging),
    };
    value
        .ok()
        .and_then(|v| v.as_table().map(|table| table.len()))
        .unwrap_or(0)
}

/// Reject settings the batch pipeline cannot work with.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    let tier = &settings.tier;
    if tier.max_files == 0 {
        return Err(ConfigError::Invalid("tier.max_files must be at least 1".into()));
    }
    if tier.max_ratios == 0 {
        return Err(ConfigError::Invalid("tier.max_ratios must be at least 1".into()));
    }
    if tier.mode == TierMode::Remote && reqwest::Url::parse(&settings.remote.base_url).is_err() {
        return Err(ConfigError::Invalid(format!(
            "remote.base_url '{}' is not a valid URL",
            settings.remote.base_url
        )));
    }
    if settings.engine.crf > 51 {
        return Err(ConfigError::Invalid("engine.crf must be between 0 and 51".into()));
    }
    Ok(())
}
