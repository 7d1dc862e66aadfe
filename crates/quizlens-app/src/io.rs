use std::time::Duration;

use kanal::AsyncSender;
use quizlens_types::{AppEvent, StatusLevel};
use tokio_util::sync::CancellationToken;

/// Non-blocking check for a hotkey press
pub trait HotkeyPoll {
    fn poll(&self) -> bool;
}

impl HotkeyPoll for quizlens_io::HotkeyManager {
    fn poll(&self) -> bool {
        quizlens_io::HotkeyManager::poll(self)
    }
}

/// Forward Ctrl+Shift+Q presses as capture requests
pub async fn watcher_io(
    poll_interval: Duration,
    cancel: CancellationToken,
    ui_to_app_tx: AsyncSender<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    watch_hotkey(
        quizlens_io::HotkeyManager::new,
        poll_interval,
        cancel,
        ui_to_app_tx,
        app_to_ui_tx,
    )
    .await
}

/// Runs until cancelled, even when the hotkey could not be registered
pub(crate) async fn watch_hotkey<H, F>(
    create: F,
    poll_interval: Duration,
    cancel: CancellationToken,
    ui_to_app_tx: AsyncSender<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()>
where
    H: HotkeyPoll + 'static,
    F: FnOnce() -> anyhow::Result<H> + Send + 'static,
{
    let listener_cancel = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let hotkey = match create() {
            Ok(hotkey) => hotkey,
            Err(e) => {
                tracing::error!("Failed to create capture hotkey: {:#}", e);
                return false;
            }
        };

        tracing::info!("Capture hotkey registered (Ctrl+Shift+Q)");

        while !listener_cancel.is_cancelled() {
            if hotkey.poll() {
                tracing::info!("Capture hotkey pressed");

                let tx = ui_to_app_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = tx.send(AppEvent::CaptureRequested).await {
                        tracing::error!("Failed to send capture request: {}", e);
                    }
                });
            }

            std::thread::sleep(poll_interval);
        }

        tracing::info!("Capture hotkey listener stopping");
        true
    });

    let registered = handle.await?;
    if !registered {
        // the rest of the app keeps going, /capture still works
        let notice = AppEvent::StatusUpdate {
            message: "Capture hotkey unavailable, use /capture instead".to_string(),
            level: StatusLevel::Warning,
        };
        if let Err(e) = app_to_ui_tx.send(notice).await {
            tracing::debug!("Hotkey notice not delivered: {}", e);
        }
        cancel.cancelled().await;
    }

    Ok(())
}
