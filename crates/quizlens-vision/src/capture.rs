use anyhow::Result;
use quizlens_core::frame::CapturedImage;
use quizlens_core::scanner::FrameSource;
use quizlens_types::CaptureRegion;

/// Capture a region of the screen
#[cfg(windows)]
pub fn capture_screen_region(region: CaptureRegion) -> Result<CapturedImage> {
    use anyhow::Context;
    use xcap::Monitor;

    let monitors = Monitor::all().context("Failed to get monitors")?;

    let monitor = monitors
        .iter()
        .find(|m| {
            region.x >= m.x()
                && region.y >= m.y()
                && region.x + region.width as i32 <= m.x() + m.width() as i32
                && region.y + region.height as i32 <= m.y() + m.height() as i32
        })
        .or(monitors.first())
        .context("No monitor found")?;

    let image = monitor.capture_image().context("Failed to capture screen")?;

    // Clamp to the monitor so a region hanging off the edge still yields pixels
    let left = (region.x - monitor.x()).clamp(0, image.width() as i32) as u32;
    let top = (region.y - monitor.y()).clamp(0, image.height() as i32) as u32;
    let width = region.width.min(image.width() - left);
    let height = region.height.min(image.height() - top);
    anyhow::ensure!(width > 0 && height > 0, "Capture region {:?} is off screen", region);

    let cropped = xcap::image::imageops::crop_imm(&image, left, top, width, height).to_image();

    CapturedImage::from_rgba(region, width, height, cropped.into_raw())
        .context("Captured buffer does not match its size")
}

#[cfg(not(windows))]
pub fn capture_screen_region(region: CaptureRegion) -> Result<CapturedImage> {
    Err(quizlens_core::error::Unsupported(format!(
        "Screen capture of {:?} is only supported on Windows",
        region
    ))
    .into())
}

/// Fixed screen region captured on every scan tick
pub struct ScreenRegionSource {
    region: CaptureRegion,
}

impl ScreenRegionSource {
    pub fn new(region: CaptureRegion) -> Self {
        Self { region }
    }
}

impl FrameSource for ScreenRegionSource {
    fn capture(&mut self) -> Result<CapturedImage> {
        capture_screen_region(self.region)
    }
}
