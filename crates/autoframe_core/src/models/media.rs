//! Source files and render targets.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::catalog::AspectTarget;
use super::enums::RenderStyle;

/// Extensions accepted into a batch (lowercase, no dot).
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "m4v", "mkv"];

/// A video file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Display name, normally the file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type sent with uploads.
    pub content_type: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            path: path.into(),
            name,
            size,
            content_type,
        }
    }

    /// Build from a path on disk, reading its size.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self::new(path, name, metadata.len()))
    }

    /// Lowercased extension of the display name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn has_video_extension(&self) -> bool {
        self.extension()
            .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// MIME type for a file name, defaulting to `video/mp4`.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        "mkv" => "video/x-matroska",
        _ => "video/mp4",
    }
}

/// One unit of transcoding work: a source file rendered to one aspect in one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    /// Position of the source in the accepted selection.
    pub file_index: usize,
    pub aspect: AspectTarget,
    pub style: RenderStyle,
}
