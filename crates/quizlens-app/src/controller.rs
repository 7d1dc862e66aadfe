use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use quizlens_core::controller::SessionController;
use quizlens_core::scanner::ChangeScanner;
use quizlens_types::AppEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::event_loop;
use crate::io::watcher_io;
use crate::scan::scan_loop;
use crate::state::AppState;
use crate::ui::{UiMode, ui_loop};

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub ui_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            app_to_ui: kanal::bounded_async(256), // scan reports
            ui_to_app: kanal::bounded_async(64),  // user commands
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Capture/chat mode, plus the hotkey watcher when enabled
    pub async fn spawn_chat_tasks(
        &self,
        session: SessionController,
    ) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        tasks.spawn(event_loop(
            session,
            self.channels.ui_to_app.1.clone(),
            self.channels.app_to_ui.0.clone(),
            self.cancel_token.child_token(),
        ));

        tasks.spawn(ui_loop(
            self.channels.app_to_ui.1.clone(),
            self.channels.ui_to_app.0.clone(),
            UiMode::Chat,
            self.cancel_token.clone(),
        ));

        let hotkey_enabled = self.state.config.read().await.capture.hotkey_enabled;
        if hotkey_enabled {
            tasks.spawn(watcher_io(
                Duration::from_millis(50),
                self.cancel_token.child_token(),
                self.channels.ui_to_app.0.clone(),
                self.channels.app_to_ui.0.clone(),
            ));
        }

        tasks
    }

    /// Scan mode: scan loop plus the terminal
    pub async fn spawn_scan_tasks(&self, scanner: ChangeScanner) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        let interval = {
            let config = self.state.config.read().await;
            Duration::from_millis(config.scanner.interval_ms.max(1))
        };

        tasks.spawn(scan_loop(
            scanner,
            interval,
            self.state.status.scan.clone(),
            self.channels.app_to_ui.0.clone(),
            self.cancel_token.child_token(),
        ));

        tasks.spawn(ui_loop(
            self.channels.app_to_ui.1.clone(),
            self.channels.ui_to_app.0.clone(),
            UiMode::Scan,
            self.cancel_token.clone(),
        ));

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
