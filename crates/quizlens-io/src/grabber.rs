use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use quizlens_config::capture::CaptureConfig;
use quizlens_core::capture::ImageGrabber;
use quizlens_core::frame::CapturedImage;

use crate::clipboard::{self, ImageClipboard, SystemClipboard};
use crate::snip::launch_snipping_tool;

type Launcher = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// Snipping tool for the selection, clipboard for the hand-off
pub struct SnipClipboardGrabber {
    clipboard: Arc<dyn ImageClipboard>,
    launcher: Launcher,
    settle: Duration,
    poll: Duration,
    timeout: Duration,
    baseline: Option<u64>,
}

impl SnipClipboardGrabber {
    pub fn new(config: &CaptureConfig) -> Self {
        Self::with_parts(Arc::new(SystemClipboard), Box::new(launch_snipping_tool), config)
    }

    pub fn with_parts(
        clipboard: Arc<dyn ImageClipboard>,
        launcher: Launcher,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            clipboard,
            launcher,
            settle: Duration::from_millis(config.snip_settle_ms),
            poll: Duration::from_millis(config.clipboard_poll_ms),
            timeout: Duration::from_millis(config.clipboard_timeout_ms),
            baseline: None,
        }
    }
}

#[async_trait]
impl ImageGrabber for SnipClipboardGrabber {
    async fn launch(&mut self) -> Result<()> {
        // whatever is on the clipboard now is not the answer
        self.baseline = match clipboard::read_image(&self.clipboard).await {
            Ok(image) => image.map(|i| i.signature()),
            Err(e) => {
                tracing::debug!("No clipboard baseline: {:#}", e);
                None
            }
        };

        (self.launcher)()?;
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn wait_for_image(&mut self) -> Result<Option<CapturedImage>> {
        let found =
            clipboard::wait_for_new_image(&self.clipboard, self.baseline, self.poll, self.timeout)
                .await;

        match found {
            Some(image) => image
                .into_captured()
                .context("Clipboard image buffer does not match its size")
                .map(Some),
            None => Ok(None),
        }
    }
}
