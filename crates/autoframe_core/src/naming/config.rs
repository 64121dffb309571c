//! Naming configuration and its stored/wire forms.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::{LabelMode, NamingMode, PatternChoice, TokenHandling};

/// User-facing naming options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    pub mode: NamingMode,
    pub pattern_choice: PatternChoice,
    /// Only read when `pattern_choice` is `Custom`.
    pub custom_pattern: String,
    pub token_handling: TokenHandling,
    pub add_sequence: bool,
    pub append_date: bool,
    pub label_mode: LabelMode,
    /// `YYYY-MM-DD`, stamped when a batch is submitted. Not persisted.
    pub date_stamp: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            mode: NamingMode::Auto,
            pattern_choice: PatternChoice::BaseRatio,
            custom_pattern: String::new(),
            token_handling: TokenHandling::AutoClean,
            add_sequence: false,
            append_date: false,
            label_mode: LabelMode::Short,
            date_stamp: String::new(),
        }
    }
}

impl NamingConfig {
    /// Defaults in custom mode.
    pub fn custom_defaults() -> Self {
        Self {
            mode: NamingMode::Custom,
            ..Self::default()
        }
    }

    /// The config that actually applies: auto mode ignores every customization.
    pub fn effective(&self) -> NamingConfig {
        match self.mode {
            NamingMode::Custom => self.clone(),
            NamingMode::Auto => NamingConfig {
                date_stamp: self.date_stamp.clone(),
                ..NamingConfig::default()
            },
        }
    }

    /// Template text for the chosen pattern.
    ///
    /// A blank custom pattern falls back to the default preset.
    pub fn effective_pattern(&self) -> String {
        let default = PatternChoice::default().template().unwrap_or("{base_clean}_{ratio}");
        match self.pattern_choice.template() {
            Some(template) => template.to_string(),
            None => {
                let trimmed = self.custom_pattern.trim();
                if trimmed.is_empty() {
                    default.to_string()
                } else {
                    trimmed.to_string()
                }
            }
        }
    }

    /// Toggle auto-clean; turning it on clears keep-tokens and vice versa.
    pub fn set_auto_clean(&mut self, enabled: bool) {
        self.token_handling = if enabled {
            TokenHandling::AutoClean
        } else {
            TokenHandling::KeepTokens
        };
    }

    pub fn set_keep_tokens(&mut self, enabled: bool) {
        self.set_auto_clean(!enabled);
    }

    /// Stamp today's date.
    pub fn with_date_stamp(mut self, date: impl Into<String>) -> Self {
        self.date_stamp = date.into();
        self
    }

    /// Serialize to the stored JSON record.
    pub fn to_json(&self) -> String {
        json!({
            "mode": self.mode.to_string(),
            "preset": self.pattern_choice.key(),
            "customPattern": self.custom_pattern,
            "autoClean": self.token_handling.auto_clean(),
            "keepTokens": self.token_handling.keep_tokens(),
            "addSequence": self.add_sequence,
            "appendDate": self.append_date,
            "labelMode": self.label_mode.to_string(),
        })
        .to_string()
    }

    /// Parse a stored record, back-filling defaults for missing or invalid fields.
    ///
    /// Never fails: garbage input yields the defaults.
    pub fn from_json(raw: &str) -> Self {
        let mut config = Self::default();
        let stored: Map<String, Value> = match serde_json::from_str(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("Stored naming options are not an object, using defaults");
                return config;
            }
            Err(e) => {
                tracing::warn!("Failed to parse stored naming options: {}", e);
                return config;
            }
        };

        let text = |key: &str| stored.get(key).and_then(Value::as_str);
        let flag = |key: &str| stored.get(key).and_then(Value::as_bool);

        config.mode = match text("mode") {
            Some("custom") => NamingMode::Custom,
            _ => NamingMode::Auto,
        };
        config.pattern_choice = text("preset")
            .and_then(PatternChoice::from_key)
            .unwrap_or_default();
        config.custom_pattern = text("customPattern").unwrap_or_default().to_string();
        config.token_handling = match (flag("keepTokens"), flag("autoClean")) {
            (Some(true), _) => TokenHandling::KeepTokens,
            (_, Some(false)) => TokenHandling::KeepTokens,
            _ => TokenHandling::AutoClean,
        };
        config.add_sequence = flag("addSequence").unwrap_or(false);
        config.append_date = flag("appendDate").unwrap_or(false);
        config.label_mode = match text("labelMode") {
            Some("friendly") => LabelMode::Friendly,
            _ => LabelMode::Short,
        };
        config
    }
}

/// Naming block sent to the render service with a job or legacy upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamingPayload {
    pub mode: NamingMode,
    pub pattern_choice: String,
    pub pattern: String,
    pub custom_pattern: String,
    pub auto_clean: bool,
    pub keep_tokens: bool,
    pub add_sequence: bool,
    pub append_date: bool,
    pub label_mode: LabelMode,
    pub date_stamp: String,
}

impl From<&NamingConfig> for NamingPayload {
    fn from(config: &NamingConfig) -> Self {
        let config = config.effective();
        Self {
            mode: config.mode,
            pattern_choice: config.pattern_choice.key().to_string(),
            pattern: config.effective_pattern(),
            custom_pattern: config.custom_pattern.trim().to_string(),
            auto_clean: config.token_handling.auto_clean(),
            keep_tokens: config.token_handling.keep_tokens(),
            add_sequence: config.add_sequence,
            append_date: config.append_date,
            label_mode: config.label_mode,
            date_stamp: config.date_stamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let config = NamingConfig {
            mode: NamingMode::Custom,
            pattern_choice: PatternChoice::Custom,
            custom_pattern: "{base}-{seq}".into(),
            token_handling: TokenHandling::KeepTokens,
            add_sequence: true,
            append_date: false,
            label_mode: LabelMode::Friendly,
            date_stamp: String::new(),
        };
        assert_eq!(NamingConfig::from_json(&config.to_json()), config);
    }

    #[test]
    fn missing_and_invalid_fields_fall_back() {
        let config = NamingConfig::from_json(r#"{"mode":"custom","preset":"mystery","addSequence":"yes"}"#);
        assert_eq!(config.mode, NamingMode::Custom);
        assert_eq!(config.pattern_choice, PatternChoice::BaseRatio);
        assert!(!config.add_sequence);
        assert_eq!(config.token_handling, TokenHandling::AutoClean);

        assert_eq!(NamingConfig::from_json("not json"), NamingConfig::default());
        assert_eq!(NamingConfig::from_json("[1,2]"), NamingConfig::default());
    }

    #[test]
    fn token_flags_are_mutually_exclusive() {
        let mut config = NamingConfig::default();
        config.set_keep_tokens(true);
        assert!(config.token_handling.keep_tokens());
        assert!(!config.token_handling.auto_clean());
        config.set_auto_clean(true);
        assert!(!config.token_handling.keep_tokens());

        let stored = NamingConfig::from_json(r#"{"autoClean":true,"keepTokens":true}"#);
        assert_eq!(stored.token_handling, TokenHandling::KeepTokens);
    }

    #[test]
    fn auto_mode_ignores_customizations() {
        let config = NamingConfig {
            pattern_choice: PatternChoice::BaseStyle,
            add_sequence: true,
            ..NamingConfig::default()
        }
        .with_date_stamp("2024-01-02");
        let effective = config.effective();
        assert_eq!(effective.pattern_choice, PatternChoice::BaseRatio);
        assert!(!effective.add_sequence);
        assert_eq!(effective.date_stamp, "2024-01-02");
    }

    #[test]
    fn blank_custom_pattern_uses_default() {
        let config = NamingConfig {
            pattern_choice: PatternChoice::Custom,
            custom_pattern: "   ".into(),
            ..NamingConfig::custom_defaults()
        };
        assert_eq!(config.effective_pattern(), "{base_clean}_{ratio}");
    }

    #[test]
    fn payload_carries_resolved_pattern() {
        let config = NamingConfig {
            pattern_choice: PatternChoice::BaseRatioStyle,
            ..NamingConfig::custom_defaults()
        };
        let payload = NamingPayload::from(&config);
        assert_eq!(payload.pattern, "{base_clean}__{ratio}__{style}");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["mode"], "custom");
        assert_eq!(value["pattern_choice"], "base_ratio_style");
        assert_eq!(value["label_mode"], "short");
    }
}
