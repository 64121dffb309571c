//! Data models for AutoFrame.
//!
//! This module contains the core data structures shared by every component:
//! - Enums for tier mode, render style, naming options, job status
//! - The aspect ratio catalog
//! - Source files and render targets
//! - Per-file and per-batch results

mod catalog;
mod enums;
mod media;
mod results;
mod tier;

pub use catalog::{AspectCatalog, AspectTarget};
pub use enums::{
    JobStatus, LabelMode, NamingMode, PatternChoice, RenderStyle, TierMode, TokenHandling,
};
pub use media::{content_type_for, RenderTarget, SourceFile, VIDEO_EXTENSIONS};
pub use results::{BatchOutcome, BatchResult, FileResult, OutputArtifact};
pub use tier::TierLimits;
