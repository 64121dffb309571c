//! AutoFrame - command-line entry point
//!
//! Loads settings, restores the saved naming options, runs one batch and
//! prints progress plus the final summary.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use autoframe_core::config::ConfigManager;
use autoframe_core::logging::{init_tracing, LogConfig, LogLevel};
use autoframe_core::models::{
    AspectCatalog, LabelMode, NamingMode, PatternChoice, RenderStyle, SourceFile, TierMode, TokenHandling,
};
use autoframe_core::naming::{JsonFileStore, NamingSession};
use autoframe_core::orchestrator::{BatchOrchestrator, BatchRequest};
use autoframe_core::progress::{ProgressAggregator, ProgressSnapshot};

#[derive(Parser)]
#[command(
    name = "autoframe",
    version,
    about = "Reframe videos into social aspect ratios"
)]
struct Cli {
    /// Settings file (default: the platform config folder)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output aspect ratio key (portrait, four_five, square, landscape); repeatable
    #[arg(long = "ratio", value_name = "KEY")]
    ratios: Vec<String>,

    /// Treatment for mismatched aspect ratios
    #[arg(long, value_enum, default_value_t = StyleArg::Blur)]
    style: StyleArg,

    /// Render locally or through the render service (overrides settings)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Naming preset (base_ratio, base_ratio_style, base_dash_ratio, base_style, base_ratio_size)
    #[arg(long, value_name = "PRESET", conflicts_with = "custom_pattern")]
    pattern: Option<String>,

    /// Custom naming pattern, e.g. "{base_clean}-{ratio}-{date}"
    #[arg(long, value_name = "TEXT")]
    custom_pattern: Option<String>,

    /// Base name for one file, as FILE=NAME; repeatable
    #[arg(long = "base-override", value_name = "FILE=NAME")]
    base_overrides: Vec<String>,

    /// Append a sequence number to every output
    #[arg(long)]
    sequence: bool,

    /// Append today's date to every output
    #[arg(long)]
    date: bool,

    /// Use friendly ratio and style labels in names
    #[arg(long)]
    friendly_labels: bool,

    /// Keep resolution and aspect tokens in base names
    #[arg(long)]
    keep_tokens: bool,

    /// Debug logging, including engine command lines in the batch log
    #[arg(short, long)]
    verbose: bool,

    /// Videos to reframe
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Blur,
    Fill,
    Black,
}

impl From<StyleArg> for RenderStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Blur => RenderStyle::Blur,
            StyleArg::Fill => RenderStyle::Fill,
            StyleArg::Black => RenderStyle::Black,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Local,
    Remote,
}

impl From<ModeArg> for TierMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Local => TierMode::Local,
            ModeArg::Remote => TierMode::Remote,
        }
    }
}

impl Cli {
    /// Whether any flag asks for custom naming.
    fn wants_custom_naming(&self) -> bool {
        self.pattern.is_some()
            || self.custom_pattern.is_some()
            || !self.base_overrides.is_empty()
            || self.sequence
            || self.date
            || self.friendly_labels
            || self.keep_tokens
    }
}

/// Default config path: platform config dir, or .config/settings.toml in the working directory.
fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("io.github", "autoframe", "autoframe")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from(".config").join("settings.toml"))
}

fn parse_override(raw: &str) -> Result<(String, String)> {
    let Some((file, name)) = raw.split_once('=') else {
        bail!("Base override '{}' must look like FILE=NAME", raw);
    };
    Ok((file.trim().to_string(), name.to_string()))
}

/// Prints a line whenever the displayed percent moves.
fn print_progress() -> impl Fn(&ProgressSnapshot) + Send + Sync {
    let last = AtomicI64::new(-1);
    move |snapshot: &ProgressSnapshot| {
        let percent = snapshot.displayed.round() as i64;
        if last.swap(percent, Ordering::SeqCst) != percent {
            println!("[{:>3}%] {} {}", percent, snapshot.title, snapshot.subtitle);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigManager::new(&config_path);
    if let Err(e) = config.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        config.settings().logging.level
    };
    init_tracing(level);
    tracing::info!("AutoFrame {} starting", autoframe_core::version());
    tracing::info!("Config: {}", config_path.display());

    if let Some(mode) = cli.mode {
        config.settings_mut().tier.mode = mode.into();
    }
    if let Err(e) = config.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
    }
    let settings = config.settings().clone();

    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = SourceFile::from_path(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        files.push(file);
    }

    let store = Arc::new(JsonFileStore::new(settings.paths.naming_store()));
    let mut naming = NamingSession::load(store);
    naming.set_files(files.iter().map(|f| f.name.clone()));
    if cli.wants_custom_naming() {
        naming.set_mode(NamingMode::Custom);
        let preset = match &cli.pattern {
            Some(key) => Some(
                PatternChoice::from_key(key)
                    .filter(|p| *p != PatternChoice::Custom)
                    .with_context(|| format!("Unknown naming preset '{}'", key))?,
            ),
            None => None,
        };
        naming.update(|options| {
            if let Some(preset) = preset {
                options.pattern_choice = preset;
            }
            if let Some(pattern) = &cli.custom_pattern {
                options.pattern_choice = PatternChoice::Custom;
                options.custom_pattern = pattern.clone();
            }
            options.add_sequence |= cli.sequence;
            options.append_date |= cli.date;
            if cli.friendly_labels {
                options.label_mode = LabelMode::Friendly;
            }
            if cli.keep_tokens {
                options.token_handling = TokenHandling::KeepTokens;
            }
        });
        for raw in &cli.base_overrides {
            let (file, name) = parse_override(raw)?;
            if !naming.edit_override(&file, &name) {
                eprintln!("Warning: '{}' is not in the selection, override ignored", file);
            }
        }
    }

    let ratios = if cli.ratios.is_empty() {
        vec!["portrait".to_string()]
    } else {
        cli.ratios.clone()
    };
    let catalog = AspectCatalog::builtin();
    if let (Some(aspect), Some(sample)) = (ratios.first().and_then(|key| catalog.get(key)), files.first()) {
        println!(
            "Naming preview: {}",
            naming.preview_filename(&sample.name, aspect, cli.style.into())
        );
    }

    let progress = ProgressAggregator::new(settings.progress.tick_interval())
        .with_listener(Arc::new(print_progress()));
    let mut orchestrator = BatchOrchestrator::from_settings(&settings)
        .context("Invalid render service settings")?
        .with_progress(Arc::new(progress));
    if cli.verbose {
        orchestrator = orchestrator.with_log_config(LogConfig::debug());
    }

    let request = BatchRequest {
        files,
        ratios,
        style: cli.style.into(),
        naming: naming.snapshot(),
    };

    match orchestrator.submit(request).await {
        Ok(result) => {
            println!("{}", result.summary());
            for file in &result.files {
                println!("{}", file.original_name);
                for output in &file.outputs {
                    println!("  {}  {}", output.filename, output.url);
                }
            }
            if let Some(url) = &result.download_all_url {
                println!("Download all: {}", url);
            }
            Ok(())
        }
        Err(e) => {
            for notice in e.notices() {
                eprintln!("{}", notice);
            }
            tracing::error!("{}", e);
            bail!(e.user_message())
        }
    }
}
