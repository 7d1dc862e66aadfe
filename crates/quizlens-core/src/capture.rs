use anyhow::Result;

use crate::frame::CapturedImage;

/// User-driven capture delegated to the OS
///
/// Split in two so the controller can tell the snipping step from the
/// clipboard wait.
#[async_trait::async_trait]
pub trait ImageGrabber: Send {
    /// Start the OS capture UI
    async fn launch(&mut self) -> Result<()>;

    /// Wait for the capture to land, `None` if no image showed up in time
    async fn wait_for_image(&mut self) -> Result<Option<CapturedImage>>;
}
