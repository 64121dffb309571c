//! Filename pattern engine.
//!
//! Turns a source filename plus the user's naming options into a concrete,
//! batch-unique output filename:
//!
//! ```text
//! "Trip_1920x1080.mov"
//!     ├── derive_base      → base = "Trip_1920x1080", base_clean = "Trip"
//!     ├── NamingTokens     → {ratio: "1x1", style: "fill", seq: "001", ...}
//!     ├── resolve_pattern  → "Trip_1x1.mp4"
//!     └── NameRegistry     → "Trip_1x1.mp4" or "Trip_1x1__001.mp4"
//! ```
//!
//! [`NamingSession`] keeps the host-side state (config, per-file
//! overrides) and persists the config through a [`NamingStore`].

mod config;
mod pattern;
mod policy;
mod session;
mod store;
mod unique;

pub use config::{NamingConfig, NamingPayload};
pub use pattern::{format_pattern, resolve_pattern, NamingTokens, FALLBACK_PATTERN};
pub use policy::{
    derive_base, remove_naming_tokens, sanitize, sanitize_filename, split_extension,
    strip_video_extensions, BaseInfo, FALLBACK_BASE, MAX_NAME_LEN,
};
pub use session::{BaseNameOverride, NamingSession, NamingSnapshot};
pub use store::{JsonFileStore, MemoryStore, NamingStore, NAMING_STORAGE_KEY};
pub use unique::NameRegistry;

/// Today's date as `YYYY-MM-DD`, for the `{date}` token.
pub fn today_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
