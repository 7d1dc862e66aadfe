use kanal::AsyncSender;
use quizlens_core::controller::SessionController;
use quizlens_types::{AppEvent, StatusLevel};

use crate::events::{report_failure, send_status};

/// Initial analysis, also used by `/clear` to restart the chat
pub async fn handle_analyze(
    session: &mut SessionController,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    restart: bool,
) -> anyhow::Result<()> {
    let message = if restart {
        "Restarting chat..."
    } else {
        "Analyzing question..."
    };
    send_status(app_to_ui_tx, StatusLevel::Info, message).await?;

    match session.analyze().await {
        Ok(reply) => {
            app_to_ui_tx.send(AppEvent::AssistantReply(reply)).await?;
            send_status(app_to_ui_tx, StatusLevel::Success, "Ready for follow-up questions").await?;
        }
        Err(e) => report_failure(app_to_ui_tx, "Analysis", e).await?,
    }

    Ok(())
}
