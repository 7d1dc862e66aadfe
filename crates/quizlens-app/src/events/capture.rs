use kanal::AsyncSender;
use quizlens_core::controller::{CaptureOutcome, SessionController};
use quizlens_types::{AppEvent, StatusLevel};

use crate::events::{report_failure, send_status};

pub async fn handle_capture(
    session: &mut SessionController,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    send_status(
        app_to_ui_tx,
        StatusLevel::Info,
        "Select the question with the snipping tool...",
    )
    .await?;

    match session.capture().await {
        Ok(CaptureOutcome::Captured {
            width,
            height,
            discarded_turns,
        }) => {
            tracing::info!(width, height, discarded_turns, "Question captured");
            app_to_ui_tx
                .send(AppEvent::ImageCaptured {
                    width,
                    height,
                    discarded_turns,
                })
                .await?;
        }
        Ok(CaptureOutcome::NoImage) => {
            send_status(app_to_ui_tx, StatusLevel::Warning, "No image found in clipboard").await?;
        }
        Err(e) => report_failure(app_to_ui_tx, "Capture", e).await?,
    }

    Ok(())
}
