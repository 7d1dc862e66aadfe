use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arboard::Clipboard;
use quizlens_core::frame::CapturedImage;
use quizlens_types::CaptureRegion;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Raw RGBA image as it sat on the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl ClipboardImage {
    /// Content hash used to tell a fresh snip from whatever was there before
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.width.hash(&mut hasher);
        self.height.hash(&mut hasher);
        self.rgba.hash(&mut hasher);
        hasher.finish()
    }

    pub fn into_captured(self) -> Option<CapturedImage> {
        let width = u32::try_from(self.width).ok()?;
        let height = u32::try_from(self.height).ok()?;
        let region = CaptureRegion {
            x: 0,
            y: 0,
            width,
            height,
        };
        CapturedImage::from_rgba(region, width, height, self.rgba)
    }
}

pub trait ImageClipboard: Send + Sync {
    /// `Ok(None)` when the clipboard holds no image
    fn read_image(&self) -> Result<Option<ClipboardImage>>;
}

/// The OS clipboard, opened fresh for every read
pub struct SystemClipboard;

impl ImageClipboard for SystemClipboard {
    fn read_image(&self) -> Result<Option<ClipboardImage>> {
        let mut clipboard = Clipboard::new().context("Failed to open clipboard")?;

        match clipboard.get_image() {
            Ok(image) => Ok(Some(ClipboardImage {
                width: image.width,
                height: image.height,
                rgba: image.bytes.into_owned(),
            })),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e).context("Failed to read clipboard image"),
        }
    }
}

const MIN_POLL: Duration = Duration::from_millis(1);

pub async fn read_image(clipboard: &Arc<dyn ImageClipboard>) -> Result<Option<ClipboardImage>> {
    let clipboard = Arc::clone(clipboard);
    tokio::task::spawn_blocking(move || clipboard.read_image())
        .await
        .context("Clipboard task panicked")?
}

/// Poll until an image whose signature differs from `baseline` shows up
///
/// Read errors are treated like an empty clipboard: another process may be
/// holding it while the snip is written. Once the clipboard has been seen
/// empty the baseline no longer applies, so a snip identical to the old
/// image is still accepted.
pub async fn wait_for_new_image(
    clipboard: &Arc<dyn ImageClipboard>,
    mut baseline: Option<u64>,
    poll: Duration,
    timeout: Duration,
) -> Option<ClipboardImage> {
    let deadline = Instant::now() + timeout;
    // a zero period panics in tokio
    let mut interval = time::interval(poll.max(MIN_POLL));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_error = None;

    loop {
        interval.tick().await;

        match read_image(clipboard).await {
            Ok(Some(image)) if Some(image.signature()) != baseline => {
                tracing::debug!(width = image.width, height = image.height, "Clipboard image found");
                return Some(image);
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                if baseline.take().is_some() {
                    tracing::trace!("Clipboard cleared, dropping baseline");
                }
            }
            Err(e) => {
                tracing::trace!("Clipboard not readable: {:#}", e);
                last_error = Some(e);
            }
        }

        if Instant::now() >= deadline {
            match last_error {
                Some(e) => tracing::warn!("No clipboard image after {:?}: {:#}", timeout, e),
                None => tracing::info!("No clipboard image after {:?}", timeout),
            }
            return None;
        }
    }
}
