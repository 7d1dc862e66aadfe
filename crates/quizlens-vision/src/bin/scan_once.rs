//! One scan of the profile's region - run with: cargo run -p quizlens-vision --bin scan_once [profile]

use anyhow::Result;
use quizlens_config::ProfileStore;
use quizlens_core::scanner::Fingerprinter;
use quizlens_vision::{QuestionFingerprinter, TesseractOcr, capture_screen_region};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let profile = std::env::args().nth(1).unwrap_or_else(|| "main".to_string());
    let profiles = ProfileStore::locate()?;
    let mut config = profiles.load(&profile)?;
    config.apply_env();
    let scanner = &config.scanner;
    tracing::info!("Profile {} from {}", profile, profiles.root().display());

    tracing::info!("Region: {:?}", scanner.region);
    let start = std::time::Instant::now();
    let image = capture_screen_region(scanner.region)?;
    tracing::info!(
        "Captured {}x{} in {:?}",
        image.width(),
        image.height(),
        start.elapsed()
    );

    let recognizer = match TesseractOcr::locate(&config.ocr) {
        Ok(engine) => Some(engine),
        Err(e) => {
            tracing::warn!("{:#}", e);
            None
        }
    };

    let start = std::time::Instant::now();
    let fingerprint = QuestionFingerprinter::new(recognizer, scanner).fingerprint(&image)?;
    tracing::info!(
        "Fingerprint in {:?}: {} markers, {} chars",
        start.elapsed(),
        fingerprint.marker_count,
        fingerprint.recognized_text.len()
    );
    for line in fingerprint.recognized_text.lines().take(5) {
        tracing::info!("  > {}", line);
    }

    image.save_png(std::path::Path::new(&scanner.artifact_path))?;
    tracing::info!("Saved to {}", scanner.artifact_path);

    Ok(())
}
