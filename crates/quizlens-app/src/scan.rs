use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kanal::AsyncSender;
use quizlens_core::error::Unsupported;
use quizlens_core::scanner::{ChangeScanner, ScanOutcome};
use quizlens_types::{AppEvent, StatusLevel};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::status::ScanStatus;

/// Tick the scanner until cancelled, one scan in flight at a time
pub async fn scan_loop(
    mut scanner: ChangeScanner,
    interval: Duration,
    status: Arc<RwLock<ScanStatus>>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    // a slow OCR pass pushes the next tick back instead of bunching them up
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("Scanning every {:?}", interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = scanner.tick();
            (scanner, result)
        })
        .await
        .context("Scan task panicked")?;
        scanner = returned;

        match result {
            Ok(outcome) => {
                status.write().await.record_scan(outcome.is_changed());
                report_outcome(&app_to_ui_tx, outcome).await?;
            }
            Err(e) => {
                let message = format!("{:#}", e);
                let is_new = status.write().await.record_error(&message);

                let missing = e.chain().any(|c| c.is::<Unsupported>());
                if missing {
                    tracing::error!("Scan failed: {}", message);
                } else {
                    tracing::warn!("Scan failed: {}", message);
                }

                if is_new {
                    let level = if missing {
                        StatusLevel::Error
                    } else {
                        StatusLevel::Warning
                    };
                    app_to_ui_tx
                        .send(AppEvent::StatusUpdate {
                            message: format!("Scan failed: {}", message),
                            level,
                        })
                        .await?;
                }
            }
        }
    }

    let summary = status.read().await.clone();
    tracing::info!(
        scans = summary.scans,
        changes = summary.changes,
        errors = summary.errors,
        "Scan loop stopping"
    );
    Ok(())
}

async fn report_outcome(
    app_to_ui_tx: &AsyncSender<AppEvent>,
    outcome: ScanOutcome,
) -> anyhow::Result<()> {
    let changed = outcome.is_changed();
    let fingerprint = match outcome {
        ScanOutcome::Unchanged(fp) | ScanOutcome::Changed(fp) => fp,
    };

    app_to_ui_tx
        .send(AppEvent::ScanReport {
            changed,
            recognized_text: fingerprint.recognized_text,
            marker_count: fingerprint.marker_count,
        })
        .await?;
    Ok(())
}
