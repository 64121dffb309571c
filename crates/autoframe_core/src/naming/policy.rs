//! Base-name derivation and sanitization.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{TokenHandling, VIDEO_EXTENSIONS};

/// Longest filename (extension included) we produce.
pub const MAX_NAME_LEN: usize = 120;

/// Fallback when sanitization leaves nothing.
pub const FALLBACK_BASE: &str = "clip";

static UNSAFE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());
static DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());

static BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\](){}<>*_]").unwrap());
static BY_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+by\s+").unwrap());
static RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{3,4}\s*(?:x|×|\*|/|:|-|_|\.)\s*\d{3,4}(?:\s*px)?\b").unwrap()
});
static ASPECT_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:x|×|:|/)\s*\d+(?:\.\d+)?\b").unwrap());
static ASPECT_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:portrait|vertical|landscape|square)\b").unwrap());
static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._-]{2,}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub(super) fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | '.' | ' ')
}

/// Strip trailing video extensions, repeatedly, case-insensitively.
///
/// Stops before the stem would become empty, and at the first suffix
/// that is not a known video extension.
pub fn strip_video_extensions(name: &str) -> &str {
    let mut base = name;
    loop {
        let Some(dot) = base.rfind('.') else {
            return base;
        };
        let (stem, suffix) = (&base[..dot], &base[dot + 1..]);
        if stem.is_empty() || !VIDEO_EXTENSIONS.contains(&suffix.to_ascii_lowercase().as_str()) {
            return base;
        }
        base = stem;
    }
}

/// Remove embedded resolution, aspect and orientation tokens.
pub fn remove_naming_tokens(text: &str) -> String {
    let cleaned = BRACKETS.replace_all(text, " ");
    let cleaned = BY_SEPARATOR.replace_all(&cleaned, "x");
    let cleaned = RESOLUTION.replace_all(&cleaned, " ");
    let cleaned = ASPECT_NUMERIC.replace_all(&cleaned, " ");
    let cleaned = ASPECT_WORD.replace_all(&cleaned, " ");
    let cleaned = SEPARATOR_RUN.replace_all(&cleaned, " ");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

/// Sanitize a name component (a base name).
///
/// Unsafe runs become `_`, repeated separators collapse, separators are
/// trimmed from both ends, the result is capped at [`MAX_NAME_LEN`], and an
/// empty result becomes `clip`. Idempotent.
pub fn sanitize(text: &str) -> String {
    let replaced = UNSAFE_RUN.replace_all(text, "_");
    let collapsed = UNDERSCORES.replace_all(&replaced, "_");
    let collapsed = DASHES.replace_all(&collapsed, "-");
    let collapsed = DOTS.replace_all(&collapsed, ".");
    let trimmed = collapsed.trim_matches(is_separator);
    // Only ASCII survives the replacement, so byte slicing is safe.
    let truncated = &trimmed[..trimmed.len().min(MAX_NAME_LEN)];
    let truncated = truncated.trim_matches(is_separator);
    if truncated.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        truncated.to_string()
    }
}

/// Derive the default base name for a source file.
pub fn derive_base(filename: &str, handling: TokenHandling) -> String {
    let leaf = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = strip_video_extensions(leaf.trim()).trim();
    if handling.auto_clean() {
        sanitize(&remove_naming_tokens(stem))
    } else {
        sanitize(stem)
    }
}

/// Sanitize a complete filename, keeping the deliberate `__` and `--`
/// delimiters patterns use, and cap it at [`MAX_NAME_LEN`] including `ext`.
pub fn sanitize_filename(candidate: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    let dotted = format!(".{}", ext);
    let stem = if !ext.is_empty() && candidate.to_ascii_lowercase().ends_with(&dotted.to_ascii_lowercase()) {
        &candidate[..candidate.len() - dotted.len()]
    } else {
        candidate
    };

    let replaced = UNSAFE_RUN.replace_all(stem, "_");
    let collapsed = UNDERSCORES.replace_all(&replaced, "__");
    let collapsed = DASHES.replace_all(&collapsed, "--");
    let mut name = collapsed.trim_matches(is_separator).to_string();
    if name.is_empty() {
        name = FALLBACK_BASE.to_string();
    }

    let suffix = if ext.is_empty() { String::new() } else { dotted };
    let max_stem = MAX_NAME_LEN.saturating_sub(suffix.len()).max(1);
    if name.len() > max_stem {
        name.truncate(max_stem);
        let kept = name.trim_end_matches(is_separator).len();
        name.truncate(kept.max(1));
    }
    format!("{}{}", name, suffix)
}

/// Split a filename into `(stem, ".ext")`. A leading dot is part of the stem.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    }
}

/// The two base-name tokens for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseInfo {
    /// Sanitized stem, tokens kept.
    pub base: String,
    /// Stem with naming tokens removed (equal to `base` when keeping tokens).
    pub base_clean: String,
}

impl BaseInfo {
    /// Build from the original name, preferring a non-blank override.
    pub fn prepare(original_name: &str, base_override: Option<&str>, handling: TokenHandling) -> Self {
        let source = base_override
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(original_name);
        let stem = strip_video_extensions(source.trim()).trim();
        let base = sanitize(stem);
        let base_clean = if handling.auto_clean() {
            sanitize(&remove_naming_tokens(stem))
        } else {
            base.clone()
        };
        Self { base, base_clean }
    }
}
