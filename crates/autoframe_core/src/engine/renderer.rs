//! Drives a [`TranscodeEngine`] for one render target at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::errors::{EngineError, EngineResult};
use super::scratch::ScratchSpace;
use super::transcode::{EngineProgress, TranscodeEngine, TranscodeJob};
use crate::models::{AspectTarget, RenderStyle, SourceFile};

/// A finished output file in the batch output folder.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub url: String,
}

/// What to render for one target.
#[derive(Debug, Clone)]
pub struct LocalRenderRequest<'a> {
    pub source: &'a SourceFile,
    pub aspect: &'a AspectTarget,
    pub style: RenderStyle,
    /// Final file name inside `output_dir`.
    pub filename: &'a str,
    pub output_dir: &'a Path,
    pub duration: Option<f64>,
}

/// In-process render path.
pub struct LocalRenderer {
    engine: Arc<dyn TranscodeEngine>,
    temp_root: PathBuf,
}

impl LocalRenderer {
    pub fn new(engine: Arc<dyn TranscodeEngine>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            temp_root: temp_root.into(),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Render one target.
    ///
    /// The input is copied into a scratch directory, transcoded there, and the
    /// result moved to `output_dir/filename`. The scratch directory is removed
    /// whether or not the engine succeeds. `on_command` receives the engine's
    /// command line, if it has one, before the engine starts.
    pub async fn render(
        &self,
        request: &LocalRenderRequest<'_>,
        on_progress: EngineProgress<'_>,
        on_command: &(dyn Fn(&str) + Send + Sync),
        cancel: &CancellationToken,
    ) -> EngineResult<RenderedFile> {
        let scratch = ScratchSpace::create(&self.temp_root)?;

        let ext = request.source.extension().unwrap_or_else(|| "mp4".to_string());
        let input = scratch.join(format!("input.{}", ext));
        tokio::fs::copy(&request.source.path, &input)
            .await
            .map_err(|e| EngineError::io(&request.source.path, e))?;

        let (width, height) = request.aspect.pixel_size();
        let job = TranscodeJob {
            input,
            output: scratch.join("output.mp4"),
            style: request.style,
            width,
            height,
            duration_hint: request.duration,
        };

        debug!(
            "Rendering {} as {} {}x{} with {}",
            request.source.name,
            request.style.key(),
            width,
            height,
            self.engine.name()
        );
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if let Some(line) = self.engine.command_line(&job) {
            on_command(&line);
        }
        self.engine.transcode(&job, on_progress, cancel).await?;

        tokio::fs::create_dir_all(request.output_dir)
            .await
            .map_err(|e| EngineError::io(request.output_dir, e))?;
        let destination = request.output_dir.join(request.filename);
        move_file(&job.output, &destination).await?;

        info!("Rendered {}", destination.display());
        Ok(RenderedFile {
            url: file_url(&destination),
            path: destination,
        })
    }
}

/// Rename, falling back to copy + delete across filesystems.
async fn move_file(from: &Path, to: &Path) -> EngineResult<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| EngineError::io(to, e))?;
    tokio::fs::remove_file(from)
        .await
        .map_err(|e| EngineError::io(from, e))
}

/// Percent-encoded `file://` URL for a local path.
pub fn file_url(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|_| path.to_path_buf());
    match Url::from_file_path(&absolute) {
        Ok(url) => url.to_string(),
        Err(()) => format!("file://{}", absolute.to_string_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::tempdir;

    /// Writes the input bytes to the output and reports two steps.
    struct CopyEngine {
        jobs: Mutex<Vec<TranscodeJob>>,
        fail: bool,
    }

    impl CopyEngine {
        fn new(fail: bool) -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl TranscodeEngine for CopyEngine {
        fn name(&self) -> &str {
            "copy"
        }

        async fn transcode(
            &self,
            job: &TranscodeJob,
            on_progress: EngineProgress<'_>,
            _cancel: &CancellationToken,
        ) -> EngineResult<()> {
            self.jobs.lock().push(job.clone());
            assert!(job.input.exists());
            on_progress(0.5);
            if self.fail {
                return Err(EngineError::failed("exit code 1", "boom"));
            }
            fs::copy(&job.input, &job.output).map_err(|e| EngineError::io(&job.output, e))?;
            on_progress(1.0);
            Ok(())
        }
    }

    fn setup() -> (tempfile::TempDir, SourceFile) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("beach.mov");
        fs::write(&path, b"not really a movie").unwrap();
        let source = SourceFile::from_path(&path).unwrap();
        fs::create_dir_all(dir.path().join("tmp")).unwrap();
        (dir, source)
    }

    #[tokio::test]
    async fn renders_into_output_dir_and_cleans_scratch() {
        let (dir, source) = setup();
        let engine = Arc::new(CopyEngine::new(false));
        let renderer = LocalRenderer::new(engine.clone(), dir.path().join("tmp"));
        let aspect = AspectTarget::new("square", "1x1", "1:1 Square", 1080, 1080);
        let out_dir = dir.path().join("out");

        let fractions = Mutex::new(Vec::new());
        let request = LocalRenderRequest {
            source: &source,
            aspect: &aspect,
            style: RenderStyle::Fill,
            filename: "beach_1x1.mp4",
            output_dir: &out_dir,
            duration: Some(10.0),
        };
        let rendered = renderer
            .render(&request, &|f| fractions.lock().push(f), &|_| {}, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(rendered.path, out_dir.join("beach_1x1.mp4"));
        assert_eq!(fs::read(&rendered.path).unwrap(), b"not really a movie");
        assert!(rendered.url.starts_with("file://"));
        assert!(rendered.url.ends_with("/out/beach_1x1.mp4"));
        assert_eq!(*fractions.lock(), vec![0.5, 1.0]);

        let job = engine.jobs.lock()[0].clone();
        assert_eq!((job.width, job.height), (1080, 1080));
        assert!(job.input.to_string_lossy().ends_with("input.mov"));
        assert_eq!(fs::read_dir(dir.path().join("tmp")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn engine_failure_still_cleans_scratch() {
        let (dir, source) = setup();
        let renderer = LocalRenderer::new(Arc::new(CopyEngine::new(true)), dir.path().join("tmp"));
        let aspect = AspectTarget::new("portrait", "9x16", "9:16 Portrait", 1080, 1920);
        let out_dir = dir.path().join("out");
        let request = LocalRenderRequest {
            source: &source,
            aspect: &aspect,
            style: RenderStyle::Blur,
            filename: "beach_9x16.mp4",
            output_dir: &out_dir,
            duration: None,
        };

        let err = renderer
            .render(&request, &|_| {}, &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Failed { .. }));
        assert_eq!(fs::read_dir(dir.path().join("tmp")).unwrap().count(), 0);
        assert!(!out_dir.join("beach_9x16.mp4").exists());
    }

    #[tokio::test]
    async fn cancelled_token_skips_engine() {
        let (dir, source) = setup();
        let engine = Arc::new(CopyEngine::new(false));
        let renderer = LocalRenderer::new(engine.clone(), dir.path().join("tmp"));
        let aspect = AspectTarget::new("square", "1x1", "1:1 Square", 1080, 1080);
        let out_dir = dir.path().join("out");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = LocalRenderRequest {
            source: &source,
            aspect: &aspect,
            style: RenderStyle::Black,
            filename: "beach_1x1.mp4",
            output_dir: &out_dir,
            duration: None,
        };

        let err = renderer.render(&request, &|_| {}, &|_| {}, &cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert!(engine.jobs.lock().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn file_url_escapes_spaces() {
        assert_eq!(file_url(Path::new("/no/such dir/a.mp4")), "file:///no/such%20dir/a.mp4");
    }

    #[cfg(unix)]
    #[test]
    fn file_url_escapes_url_delimiters() {
        let url = file_url(Path::new("/no/such/take #2?100%.mp4"));
        assert_eq!(url, "file:///no/such/take%20%232%3F100%25.mp4");
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert_eq!(parsed.query(), None);
        assert_eq!(
            parsed.to_file_path().unwrap(),
            Path::new("/no/such/take #2?100%.mp4")
        );
    }
}
