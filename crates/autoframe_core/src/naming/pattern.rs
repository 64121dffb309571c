//! Token pattern formatting.
//!
//! Patterns are plain text with `{token}` placeholders:
//!
//! | token        | value                                   |
//! |--------------|-----------------------------------------|
//! | `base`       | sanitized source stem                   |
//! | `base_clean` | stem with resolution/aspect tokens gone |
//! | `ratio`      | `1x1` or `1:1 Square`                   |
//! | `style`      | `fill` or `Fill & crop`                 |
//! | `w`, `h`     | target pixel size                       |
//! | `date`       | `YYYY-MM-DD`                            |
//! | `seq`        | batch-wide output number, `001`         |
//! | `ext`        | container extension without the dot     |

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::config::NamingConfig;
use super::policy::{sanitize_filename, BaseInfo};
use crate::models::{AspectTarget, LabelMode, RenderStyle};

/// Template used when a pattern formats to nothing.
pub const FALLBACK_PATTERN: &str = "{base_clean}_{ratio}";

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z_]+)\}").unwrap());

/// Values substituted into a pattern for one output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingTokens {
    pub base: String,
    pub base_clean: String,
    pub ratio: String,
    pub style: String,
    pub w: u32,
    pub h: u32,
    pub date: String,
    pub seq: String,
    pub ext: String,
}

impl NamingTokens {
    /// Tokens for one render target. `seq` is the 1-based output number
    /// across the whole batch.
    pub fn for_target(
        base: &BaseInfo,
        aspect: &AspectTarget,
        style: RenderStyle,
        config: &NamingConfig,
        seq: usize,
        ext: &str,
    ) -> Self {
        let style_label = match config.label_mode {
            LabelMode::Short => style.key(),
            LabelMode::Friendly => style.label(),
        };
        Self {
            base: base.base.clone(),
            base_clean: base.base_clean.clone(),
            ratio: aspect.label(config.label_mode).to_string(),
            style: style_label.to_string(),
            w: aspect.width,
            h: aspect.height,
            date: config.date_stamp.clone(),
            seq: format!("{:03}", seq),
            ext: ext.trim_start_matches('.').to_string(),
        }
    }

    /// Look up a token by name. Unknown names yield `None`.
    pub fn get(&self, name: &str) -> Option<String> {
        let value = match name {
            "base" => self.base.clone(),
            "base_clean" => self.base_clean.clone(),
            "ratio" => self.ratio.clone(),
            "style" => self.style.clone(),
            "w" => self.w.to_string(),
            "h" => self.h.to_string(),
            "date" => self.date.clone(),
            "seq" => self.seq.clone(),
            "ext" => self.ext.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Substitute every `{token}`; unknown tokens become empty.
pub fn format_pattern(pattern: &str, tokens: &NamingTokens) -> String {
    TOKEN
        .replace_all(pattern, |caps: &Captures| {
            tokens.get(&caps[1].to_ascii_lowercase()).unwrap_or_default()
        })
        .into_owned()
}

fn trim_trailing(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == '_' || c == '-' || c.is_whitespace())
}

/// Resolve the configured pattern into a final, sanitized filename.
///
/// The result still has to go through a [`NameRegistry`](super::NameRegistry)
/// to be unique within a batch.
pub fn resolve_pattern(config: &NamingConfig, tokens: &NamingTokens) -> String {
    let config = config.effective();
    let pattern = config.effective_pattern();
    let mut formatted = trim_trailing(&format_pattern(&pattern, tokens)).to_string();
    if formatted.is_empty() {
        formatted = trim_trailing(&format_pattern(FALLBACK_PATTERN, tokens)).to_string();
    }

    let lowered = pattern.to_ascii_lowercase();
    if config.add_sequence && !lowered.contains("{seq}") && !tokens.seq.is_empty() {
        formatted = format!("{}__{}", formatted, tokens.seq);
    }
    if config.append_date && !lowered.contains("{date}") && !tokens.date.is_empty() {
        formatted = format!("{}__{}", formatted, tokens.date);
    }

    let ext = tokens.ext.trim_start_matches('.');
    if !ext.is_empty() && !formatted.to_ascii_lowercase().ends_with(&format!(".{}", ext.to_ascii_lowercase())) {
        formatted = format!("{}.{}", formatted, ext);
    }
    sanitize_filename(&formatted, ext)
}
