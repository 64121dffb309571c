//! The transcoding capability the local render path drives.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::errors::EngineResult;
use crate::models::RenderStyle;

/// Progress callback for a single transcode, fed fractions in `0.0..=1.0`.
pub type EngineProgress<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// One reframing run: `input` becomes `output` at `width`x`height`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub style: RenderStyle,
    pub width: u32,
    pub height: u32,
    /// Source duration in seconds, used to turn timestamps into fractions.
    pub duration_hint: Option<f64>,
}

/// A transcoding backend.
///
/// The progress callback is scoped to one call. Implementations must not
/// keep it after returning.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Printable command line for `job`, when the engine runs an external tool.
    fn command_line(&self, _job: &TranscodeJob) -> Option<String> {
        None
    }

    async fn transcode(
        &self,
        job: &TranscodeJob,
        on_progress: EngineProgress<'_>,
        cancel: &CancellationToken,
    ) -> EngineResult<()>;
}
