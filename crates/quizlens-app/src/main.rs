use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use quizlens_chat::{ChatProvider, OpenAiChat};
use quizlens_config::{Config, ProfileStore};
use quizlens_core::controller::{SessionController, SessionSettings};
use quizlens_core::credential::{CredentialManager, CredentialStore};
use quizlens_core::fingerprint::ChangeDetector;
use quizlens_core::scanner::{ChangeScanner, PngArtifactSink};
use quizlens_io::SnipClipboardGrabber;
use quizlens_types::CaptureRegion;
use quizlens_vision::{QuestionFingerprinter, ScreenRegionSource, TesseractOcr};
use tokio::signal;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use crate::controller::AppController;
use crate::state::AppState;

pub mod controller;
pub mod events;
pub mod io;
pub mod scan;
pub mod state;
pub mod status;
pub mod ui;


#[derive(Parser)]
#[command(name = "quizlens", version, about = "Capture quiz questions and get help with them")]
struct Cli {
    /// Profile under the user config folder
    #[arg(long, global = true, default_value = "main")]
    profile: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Snip a question and chat about it (default)
    Chat,
    /// Watch a screen region and save the question whenever it changes
    Scan(ScanArgs),
    /// Validate and store an API key
    SetKey { key: String },
}

#[derive(Args)]
struct ScanArgs {
    #[arg(long)]
    interval_ms: Option<u64>,
    /// X,Y,WIDTH,HEIGHT
    #[arg(long)]
    region: Option<CaptureRegion>,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Compare recognized text after Unicode and whitespace normalization
    #[arg(long)]
    normalize: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    init_tracing();

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file"),
        Err(e) => tracing::warn!("Failed to load .env: {}", e),
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let result = runtime.block_on(run(cli));
    // the stdin reader may still be parked on a blocking read
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quizlens=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if atty::is(atty::Stream::Stderr) {
        builder.init();
    } else {
        builder.json().init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profiles = ProfileStore::locate()?;
    profiles.init()?;

    let mut config = profiles.load(&cli.profile)?;
    config.apply_env();
    let credential_path = profiles.credential_path(&config);
    tracing::debug!(profile = %cli.profile, root = %profiles.root().display(), "Profile loaded");

    match cli.command.unwrap_or(Command::Chat) {
        Command::SetKey { key } => {
            let manager = credential_manager(&config, credential_path);
            manager.save(&key)?;
            println!("API key saved to {}", manager.store().path().display());
            Ok(())
        }
        Command::Scan(args) => {
            apply_scan_args(&mut config, args);
            let scanner = build_scanner(&config);
            let state = Arc::new(AppState::new(config));
            let controller = AppController::new(state);
            let tasks = controller.spawn_scan_tasks(scanner).await;
            supervise(&controller, tasks).await;
            Ok(())
        }
        Command::Chat => {
            let session = build_session(&config, credential_path)?;
            let state = Arc::new(AppState::new(config));
            let controller = AppController::new(state);
            let tasks = controller.spawn_chat_tasks(session).await;
            supervise(&controller, tasks).await;
            Ok(())
        }
    }
}

fn credential_manager(config: &Config, path: PathBuf) -> CredentialManager {
    CredentialManager::new(CredentialStore::new(path), &config.credential)
}

fn build_session(config: &Config, credential_path: PathBuf) -> anyhow::Result<SessionController> {
    let provider = OpenAiChat::new(
        config.chat.api_url.clone(),
        config.chat.model.clone(),
        Duration::from_secs(config.chat.timeout_seconds),
    )?;
    let metadata = provider.metadata();
    tracing::info!(
        provider = %metadata.name,
        model = %metadata.model,
        images = metadata.supports_images,
        "Chat provider ready"
    );

    Ok(SessionController::new(
        SessionSettings::from(&config.chat),
        Box::new(SnipClipboardGrabber::new(&config.capture)),
        Arc::new(provider),
        credential_manager(config, credential_path),
    ))
}

fn apply_scan_args(config: &mut Config, args: ScanArgs) {
    let scanner = &mut config.scanner;
    if let Some(interval) = args.interval_ms {
        scanner.interval_ms = interval;
    }
    if let Some(region) = args.region {
        scanner.region = region;
    }
    if let Some(output) = args.output {
        scanner.artifact_path = output.to_string_lossy().into_owned();
    }
    if args.normalize {
        scanner.normalize_text = true;
    }
}

fn build_scanner(config: &Config) -> ChangeScanner {
    let recognizer = match TesseractOcr::locate(&config.ocr) {
        Ok(engine) => Some(engine),
        Err(e) => {
            tracing::warn!("OCR unavailable, scans will fail: {:#}", e);
            None
        }
    };

    let detector = if config.scanner.normalize_text {
        ChangeDetector::normalized()
    } else {
        ChangeDetector::exact()
    };

    tracing::info!(
        region = ?config.scanner.region,
        artifact = %config.scanner.artifact_path,
        "Scanner ready"
    );

    ChangeScanner::new(
        Box::new(ScreenRegionSource::new(config.scanner.region)),
        Box::new(QuestionFingerprinter::new(recognizer, &config.scanner)),
        Box::new(PngArtifactSink::new(&config.scanner.artifact_path)),
        detector,
    )
}

/// Wait for Ctrl+C or the first task to end, then stop the rest
async fn supervise(controller: &AppController, mut tasks: JoinSet<anyhow::Result<()>>) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => match result {
            Ok(Ok(())) => tracing::info!("Task exited"),
            Ok(Err(e)) => tracing::error!("Task failed: {:#}", e),
            Err(e) => tracing::error!("Task panicked: {}", e),
        },
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Task failed during shutdown: {:#}", e),
            Err(e) => tracing::error!("Task panicked during shutdown: {}", e),
        }
    }
}
