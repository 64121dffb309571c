//! Naming state owned by the host between batch submissions.
//!
//! Holds the current [`NamingConfig`], the per-file base-name overrides
//! used in custom mode, and the cache that lets custom settings survive a
//! round trip through auto mode. Every config change is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use super::config::NamingConfig;
use super::pattern::{resolve_pattern, NamingTokens};
use super::policy::{derive_base, sanitize, BaseInfo};
use super::store::{NamingStore, NAMING_STORAGE_KEY};
use crate::models::{AspectTarget, NamingMode, RenderStyle};

/// A per-file base name in custom mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseNameOverride {
    /// Sanitized base name.
    pub value: String,
    /// True when the value differs from the automatically derived base.
    pub is_manual: bool,
}

/// Immutable copy of naming state handed to a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingSnapshot {
    pub config: NamingConfig,
    /// Original filename to base override. Empty outside custom mode.
    pub overrides: HashMap<String, String>,
}

impl NamingSnapshot {
    pub fn new(config: NamingConfig) -> Self {
        Self {
            config,
            overrides: HashMap::new(),
        }
    }

    /// Override for a file, only in custom mode.
    pub fn override_for(&self, name: &str) -> Option<&str> {
        if self.config.mode != NamingMode::Custom {
            return None;
        }
        self.overrides.get(name).map(String::as_str)
    }

    /// Base-name tokens for a file.
    pub fn base_info(&self, name: &str) -> BaseInfo {
        let config = self.config.effective();
        BaseInfo::prepare(name, self.override_for(name), config.token_handling)
    }
}

/// Naming state machine for one host session.
pub struct NamingSession {
    config: NamingConfig,
    overrides: HashMap<String, BaseNameOverride>,
    /// Custom config parked while in auto mode.
    custom_cache: Option<NamingConfig>,
    /// Overrides parked while in auto mode (and mirrored while in custom).
    override_cache: HashMap<String, BaseNameOverride>,
    files: Vec<String>,
    store: Arc<dyn NamingStore>,
}

impl NamingSession {
    /// Load the persisted config, falling back to defaults.
    pub fn load(store: Arc<dyn NamingStore>) -> Self {
        let config = store
            .load(NAMING_STORAGE_KEY)
            .map(|raw| NamingConfig::from_json(&raw))
            .unwrap_or_default();
        Self {
            config,
            overrides: HashMap::new(),
            custom_cache: None,
            override_cache: HashMap::new(),
            files: Vec::new(),
            store,
        }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn override_for(&self, name: &str) -> Option<&BaseNameOverride> {
        self.overrides.get(name)
    }

    pub fn overrides(&self) -> &HashMap<String, BaseNameOverride> {
        &self.overrides
    }

    /// Replace the current selection (original filenames, in order).
    pub fn set_files<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = names.into_iter().map(Into::into).collect();
        self.rebuild_overrides();
    }

    /// Switch between auto and custom naming.
    pub fn set_mode(&mut self, mode: NamingMode) {
        if mode == self.config.mode {
            return;
        }
        match mode {
            NamingMode::Auto => {
                self.custom_cache = Some(self.config.clone());
                self.override_cache = self.overrides.clone();
                self.config = NamingConfig::default();
            }
            NamingMode::Custom => {
                let mut restored = self
                    .custom_cache
                    .clone()
                    .unwrap_or_else(NamingConfig::custom_defaults);
                restored.mode = NamingMode::Custom;
                self.config = restored;
            }
        }
        self.rebuild_overrides();
        self.persist();
    }

    /// Apply a change to the config and persist it.
    ///
    /// The mode is not changed through here; use [`set_mode`](Self::set_mode).
    pub fn update(&mut self, change: impl FnOnce(&mut NamingConfig)) {
        let mode = self.config.mode;
        change(&mut self.config);
        self.config.mode = mode;
        self.rebuild_overrides();
        self.persist();
    }

    /// Record a user edit of a file's base name.
    ///
    /// Blank input reverts to the derived base. Returns false when the file
    /// is not selected or naming is not in custom mode.
    pub fn edit_override(&mut self, name: &str, raw: &str) -> bool {
        if self.config.mode != NamingMode::Custom || !self.files.iter().any(|f| f == name) {
            return false;
        }
        let derived = derive_base(name, self.config.token_handling);
        let value = if raw.trim().is_empty() {
            derived.clone()
        } else {
            sanitize(raw)
        };
        let is_manual = value != derived;
        self.overrides
            .insert(name.to_string(), BaseNameOverride { value, is_manual });
        self.override_cache = self.overrides.clone();
        true
    }

    /// Copy of the state a batch needs.
    pub fn snapshot(&self) -> NamingSnapshot {
        let overrides = if self.config.mode == NamingMode::Custom {
            self.overrides
                .iter()
                .map(|(name, o)| (name.clone(), o.value.clone()))
                .collect()
        } else {
            HashMap::new()
        };
        NamingSnapshot {
            config: self.config.clone(),
            overrides,
        }
    }

    /// Example output filename for the current settings.
    pub fn preview_filename(&self, sample_name: &str, aspect: &AspectTarget, style: RenderStyle) -> String {
        let snapshot = self.snapshot();
        let config = snapshot
            .config
            .effective()
            .with_date_stamp(super::today_stamp());
        let base = snapshot.base_info(sample_name);
        let tokens = NamingTokens::for_target(&base, aspect, style, &config, 1, "mp4");
        resolve_pattern(&config, &tokens)
    }

    fn rebuild_overrides(&mut self) {
        if self.config.mode != NamingMode::Custom {
            self.overrides.clear();
            return;
        }
        if self.files.is_empty() {
            self.overrides.clear();
            self.override_cache.clear();
            return;
        }

        let previous = if self.override_cache.is_empty() {
            std::mem::take(&mut self.overrides)
        } else {
            self.override_cache.clone()
        };
        let handling = self.config.token_handling;
        let mut next = HashMap::with_capacity(self.files.len());
        for name in &self.files {
            let derived = derive_base(name, handling);
            let entry = match previous.get(name) {
                Some(existing) if existing.is_manual && existing.value != derived => {
                    existing.clone()
                }
                _ => BaseNameOverride {
                    value: derived,
                    is_manual: false,
                },
            };
            next.insert(name.clone(), entry);
        }
        self.overrides = next;
        self.override_cache = self.overrides.clone();
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(NAMING_STORAGE_KEY, &self.config.to_json()) {
            tracing::warn!("Failed to save naming options: {}", e);
        }
    }
}
