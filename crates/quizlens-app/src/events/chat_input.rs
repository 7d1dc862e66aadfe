use kanal::AsyncSender;
use quizlens_core::controller::{SendOutcome, SessionController};
use quizlens_types::AppEvent;

use crate::events::report_failure;

pub async fn handle_chat_input(
    session: &mut SessionController,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    text: String,
) -> anyhow::Result<()> {
    tracing::debug!("ChatInput received: {} chars", text.len());

    match session.send(&text).await {
        Ok(SendOutcome::Replied(reply)) => {
            app_to_ui_tx.send(AppEvent::AssistantReply(reply)).await?;
        }
        Ok(SendOutcome::Ignored) => tracing::debug!("Empty input ignored"),
        Err(e) => report_failure(app_to_ui_tx, "Chat", e).await?,
    }

    Ok(())
}
