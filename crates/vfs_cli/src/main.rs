//! Command-line entry point for the frame stitcher.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use vfs_core::config::ConfigManager;
use vfs_core::extraction::CancelToken;
use vfs_core::logging::init_tracing;
use vfs_core::media::{FfmpegOpener, FfprobeProber, ImageKind};
use vfs_core::orchestrator::{standard_pipeline, ConfirmCallback, Context, RunState};

/// Extracts, pairs and stitches sampled frames from stereo camera segments.
#[derive(Parser, Debug)]
#[command(name = "frame-stitcher", version, about)]
struct Cli {
    /// Config file; created with defaults when missing.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Input directory override.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output directory override.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Sampling interval override (every Nth global frame).
    #[arg(long)]
    interval: Option<u32>,

    /// Answer yes to every confirmation prompt.
    #[arg(short, long)]
    yes: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    if let Err(e) = config.load_or_create() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let settings = config.settings_mut();
    if let Some(dir) = &cli.input_dir {
        settings.paths.input_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(dir) = &cli.output_dir {
        settings.paths.output_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(interval) = cli.interval {
        if interval == 0 {
            eprintln!("Error: --interval must be at least 1");
            return ExitCode::FAILURE;
        }
        settings.extraction.sampling_interval = interval;
    }

    init_tracing(&config.settings().logging);

    let image_kind = match config.settings().extraction.image_format.parse::<ImageKind>() {
        Ok(kind) => kind,
        Err(message) => {
            error!("Invalid image format in config: {message}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.ensure_dirs_exist() {
        error!("Cannot create output folders: {e}");
        return ExitCode::FAILURE;
    }

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping after the current tasks");
            cancel.cancel();
        }) {
            warn!("Cannot install interrupt handler: {e}");
        }
    }

    let run_name = config
        .settings()
        .paths
        .input_dir
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or("run")
        .to_string();

    let ctx = Context {
        run_name,
        settings: config.settings().clone(),
        cancel,
        opener: Arc::new(FfmpegOpener),
        prober: Arc::new(FfprobeProber),
        confirm: confirm_callback(cli.yes),
        image_kind,
    };

    let mut state = RunState::default();
    match standard_pipeline().run(&ctx, &mut state) {
        Ok(result) => {
            info!(
                "Done: {} steps completed, {} skipped",
                result.steps_completed.len(),
                result.steps_skipped.len()
            );
            if let Some(path) = &state.report_path {
                info!("Report: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_user_abort() => {
            info!("{e}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Interactive yes/no prompt on stdin, or auto-confirm with `--yes`.
fn confirm_callback(assume_yes: bool) -> Option<ConfirmCallback> {
    if assume_yes {
        return None;
    }
    Some(Box::new(|message: &str| {
        eprintln!("{message}");
        eprint!("Continue anyway? [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }))
}
