//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Where a batch is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierMode {
    /// In-process transcoding on this machine.
    #[default]
    Local,
    /// Upload to the render service and poll a job.
    Remote,
}

impl std::fmt::Display for TierMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierMode::Local => write!(f, "local"),
            TierMode::Remote => write!(f, "remote"),
        }
    }
}

/// Visual treatment used when the source does not match the target aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// Fit the clip over a blurred, zoomed copy of itself.
    #[default]
    Blur,
    /// Scale up and crop to fill the frame.
    Fill,
    /// Fit the clip and pad with black bars.
    Black,
}

impl RenderStyle {
    /// All styles in display order.
    pub const ALL: [RenderStyle; 3] = [RenderStyle::Blur, RenderStyle::Fill, RenderStyle::Black];

    /// Stable key, also used as the short label.
    pub fn key(&self) -> &'static str {
        match self {
            RenderStyle::Blur => "blur",
            RenderStyle::Fill => "fill",
            RenderStyle::Black => "black",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RenderStyle::Blur => "Blurred background letterbox",
            RenderStyle::Fill => "Fill & crop",
            RenderStyle::Black => "Black background letterbox",
        }
    }

    /// Parse a style key (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "blur" => Some(RenderStyle::Blur),
            "fill" => Some(RenderStyle::Fill),
            "black" => Some(RenderStyle::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Which label flavour the `{ratio}` and `{style}` tokens expand to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// `1x1`, `fill`.
    #[default]
    Short,
    /// `1:1 Square`, `Fill & crop`.
    Friendly,
}

impl std::fmt::Display for LabelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelMode::Short => write!(f, "short"),
            LabelMode::Friendly => write!(f, "friendly"),
        }
    }
}

/// Naming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// Built-in default pattern, no per-file overrides.
    #[default]
    Auto,
    /// User-chosen pattern and per-file base names.
    Custom,
}

impl std::fmt::Display for NamingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingMode::Auto => write!(f, "auto"),
            NamingMode::Custom => write!(f, "custom"),
        }
    }
}

/// How embedded resolution/aspect tokens in source names are treated.
///
/// Replaces the pair of mutually exclusive `autoClean`/`keepTokens` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenHandling {
    /// Strip `1920x1080`, `9:16`, `portrait` and friends from the base name.
    #[default]
    AutoClean,
    /// Leave the base name as-is.
    KeepTokens,
}

impl TokenHandling {
    pub fn auto_clean(&self) -> bool {
        matches!(self, TokenHandling::AutoClean)
    }

    pub fn keep_tokens(&self) -> bool {
        matches!(self, TokenHandling::KeepTokens)
    }
}

/// Built-in filename patterns plus the user-supplied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternChoice {
    #[default]
    BaseRatio,
    BaseRatioStyle,
    BaseDashRatio,
    BaseStyle,
    BaseRatioSize,
    Custom,
}

impl PatternChoice {
    /// The five presets, in menu order.
    pub const PRESETS: [PatternChoice; 5] = [
        PatternChoice::BaseRatio,
        PatternChoice::BaseRatioStyle,
        PatternChoice::BaseDashRatio,
        PatternChoice::BaseStyle,
        PatternChoice::BaseRatioSize,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PatternChoice::BaseRatio => "base_ratio",
            PatternChoice::BaseRatioStyle => "base_ratio_style",
            PatternChoice::BaseDashRatio => "base_dash_ratio",
            PatternChoice::BaseStyle => "base_style",
            PatternChoice::BaseRatioSize => "base_ratio_size",
            PatternChoice::Custom => "custom",
        }
    }

    /// Template string for a preset. `None` for `Custom`.
    pub fn template(&self) -> Option<&'static str> {
        match self {
            PatternChoice::BaseRatio => Some("{base_clean}_{ratio}"),
            PatternChoice::BaseRatioStyle => Some("{base_clean}__{ratio}__{style}"),
            PatternChoice::BaseDashRatio => Some("{base_clean}-{ratio}"),
            PatternChoice::BaseStyle => Some("{base_clean}__{style}"),
            PatternChoice::BaseRatioSize => Some("{base_clean}_{ratio}_{w}x{h}"),
            PatternChoice::Custom => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "base_ratio" => Some(PatternChoice::BaseRatio),
            "base_ratio_style" => Some(PatternChoice::BaseRatioStyle),
            "base_dash_ratio" => Some(PatternChoice::BaseDashRatio),
            "base_style" => Some(PatternChoice::BaseStyle),
            "base_ratio_size" => Some(PatternChoice::BaseRatioSize),
            "custom" => Some(PatternChoice::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for PatternChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Status of a remote render job.
///
/// The service reports a few synonyms; they are folded into four states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    #[serde(alias = "pending")]
    Queued,
    #[serde(alias = "processing", alias = "running")]
    Rendering,
    #[serde(alias = "completed")]
    Done,
    #[serde(alias = "error")]
    Failed,
}

impl JobStatus {
    /// Whether polling should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Rendering => write!(f, "rendering"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_accepts_service_synonyms() {
        let parsed: Vec<JobStatus> =
            serde_json::from_str(r#"["pending","processing","completed","failed","done"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                JobStatus::Queued,
                JobStatus::Rendering,
                JobStatus::Done,
                JobStatus::Failed,
                JobStatus::Done
            ]
        );
        assert!(JobStatus::Done.is_terminal());
        assert!(!JobStatus::Rendering.is_terminal());
    }

    #[test]
    fn pattern_keys_round_trip() {
        for choice in PatternChoice::PRESETS {
            assert_eq!(PatternChoice::from_key(choice.key()), Some(choice));
            assert!(choice.template().is_some());
        }
        assert_eq!(PatternChoice::Custom.template(), None);
        assert_eq!(PatternChoice::from_key("nope"), None);
    }

    #[test]
    fn style_parses_case_insensitively() {
        assert_eq!(RenderStyle::from_key(" Fill "), Some(RenderStyle::Fill));
        assert_eq!(RenderStyle::from_key("sepia"), None);
        assert_eq!(RenderStyle::default(), RenderStyle::Blur);
    }
}
