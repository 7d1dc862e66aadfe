use kanal::{AsyncReceiver, AsyncSender};
use quizlens_core::controller::SessionController;
use quizlens_core::error::{FailureClass, FlowError};
use quizlens_types::{AppEvent, StatusLevel};
use tokio_util::sync::CancellationToken;

pub mod analyze;
pub mod capture;
pub mod chat_input;
pub mod credential;

use analyze::handle_analyze;
use capture::handle_capture;
use chat_input::handle_chat_input;
use credential::handle_credential;

/// App's main loop, the only owner of the session controller
pub async fn event_loop(
    mut session: SessionController,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    announce_readiness(session.credential_ready(), &app_to_ui_tx).await?;

    tracing::info!("Event loop started");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = ui_to_app_rx.recv() => event?,
        };

        tracing::debug!("Event received: {:?}", std::mem::discriminant(&event));
        handle_events(&mut session, &app_to_ui_tx, event).await?;
    }

    tracing::info!("Event loop stopping");
    Ok(())
}

/// Either unlock the front end or send it to key setup
pub async fn announce_readiness(
    credential_ready: bool,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let event = if credential_ready {
        AppEvent::BackendReady
    } else {
        AppEvent::CredentialRequired {
            reason: "No API key configured".to_string(),
        }
    };
    app_to_ui_tx.send(event).await?;
    Ok(())
}

pub async fn handle_events(
    session: &mut SessionController,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    event: AppEvent,
) -> anyhow::Result<()> {
    match event {
        AppEvent::CaptureRequested => handle_capture(session, app_to_ui_tx).await?,
        AppEvent::AnalyzeRequested => handle_analyze(session, app_to_ui_tx, false).await?,
        AppEvent::ClearChat => handle_analyze(session, app_to_ui_tx, true).await?,
        AppEvent::ChatInput(text) => handle_chat_input(session, app_to_ui_tx, text).await?,
        AppEvent::CredentialSubmitted(key) => handle_credential(session, app_to_ui_tx, key).await?,
        AppEvent::StatusUpdate { .. }
        | AppEvent::ImageCaptured { .. }
        | AppEvent::AssistantReply(_)
        | AppEvent::CredentialRequired { .. }
        | AppEvent::ScanReport { .. }
        | AppEvent::BackendReady => {
            // UI-only events, ignore in backend
        }
    }

    Ok(())
}

pub async fn send_status(
    app_to_ui_tx: &AsyncSender<AppEvent>,
    level: StatusLevel,
    message: impl Into<String>,
) -> anyhow::Result<()> {
    app_to_ui_tx
        .send(AppEvent::StatusUpdate {
            message: message.into(),
            level,
        })
        .await?;
    Ok(())
}

/// Route a failed action by class: credential problems go to key setup,
/// everything else becomes a status line
pub async fn report_failure(
    app_to_ui_tx: &AsyncSender<AppEvent>,
    action: &str,
    err: FlowError,
) -> anyhow::Result<()> {
    let class = err.class();
    match class {
        FailureClass::Credential => {
            tracing::warn!("{} needs a valid API key: {}", action, err);
            app_to_ui_tx
                .send(AppEvent::CredentialRequired {
                    reason: err.to_string(),
                })
                .await?;
        }
        FailureClass::Transient => {
            tracing::warn!("{} failed: {}", action, err);
            send_status(app_to_ui_tx, StatusLevel::Warning, err.to_string()).await?;
        }
        FailureClass::CapabilityMissing | FailureClass::Unexpected => {
            tracing::error!(?class, "{} failed: {}", action, err);
            send_status(app_to_ui_tx, StatusLevel::Error, format!("Error: {}", err)).await?;
        }
    }
    Ok(())
}
