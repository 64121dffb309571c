//! In-process render path.
//!
//! [`LocalRenderer`] takes one (file, aspect, style) target at a time, stages
//! the input in a [`ScratchSpace`], hands it to a [`TranscodeEngine`] with a
//! per-call progress callback, and moves the result into the batch folder.

mod errors;
mod ffmpeg;
mod filters;
mod renderer;
mod scratch;
mod transcode;

pub use errors::{EngineError, EngineResult, GENERIC_ENGINE_MESSAGE};
pub use ffmpeg::{parse_progress_line, progress_fraction, FfmpegEngine, ProgressLine};
pub use filters::{filter_graph, BLUR_SIGMA};
pub use renderer::{file_url, LocalRenderRequest, LocalRenderer, RenderedFile};
pub use scratch::ScratchSpace;
pub use transcode::{EngineProgress, TranscodeEngine, TranscodeJob};
