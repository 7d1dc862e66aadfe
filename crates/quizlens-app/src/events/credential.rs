use kanal::AsyncSender;
use quizlens_core::controller::SessionController;
use quizlens_types::{AppEvent, StatusLevel};

use crate::events::send_status;

pub async fn handle_credential(
    session: &mut SessionController,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    key: String,
) -> anyhow::Result<()> {
    match session.submit_credential(&key) {
        Ok(()) => {
            send_status(app_to_ui_tx, StatusLevel::Success, "API key saved").await?;
            app_to_ui_tx.send(AppEvent::BackendReady).await?;
        }
        Err(e) => {
            tracing::warn!("API key rejected: {}", e);
            app_to_ui_tx
                .send(AppEvent::CredentialRequired {
                    reason: e.to_string(),
                })
                .await?;
        }
    }

    Ok(())
}
