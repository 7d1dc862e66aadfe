use anyhow::{Context, Result};
use image::imageops;
use imageproc::filter::gaussian_blur_f32;
use quizlens_config::scanner::ScannerConfig;
use quizlens_config::{CircleParams, ThresholdParams};
use quizlens_core::error::Unsupported;
use quizlens_core::fingerprint::CaptureFingerprint;
use quizlens_core::frame::CapturedImage;
use quizlens_core::scanner::Fingerprinter;

use crate::markers::{detect_circles, marker_count};
use crate::ocr::TextRecognizer;
use crate::threshold::adaptive_gaussian_threshold;

/// Fingerprints a question region: OCR over the lower half plus a bullet count
pub struct QuestionFingerprinter<R> {
    recognizer: Option<R>,
    circles: CircleParams,
    threshold: ThresholdParams,
}

impl<R: TextRecognizer> QuestionFingerprinter<R> {
    /// A `None` recognizer fails every fingerprint instead of guessing empty text
    pub fn new(recognizer: Option<R>, config: &ScannerConfig) -> Self {
        if let Err(e) = check_circle_params(&config.circles) {
            tracing::warn!("Marker detection misconfigured, scans will fail: {:#}", e);
        }
        Self {
            recognizer,
            circles: config.circles,
            threshold: config.threshold,
        }
    }
}

impl<R: TextRecognizer> Fingerprinter for QuestionFingerprinter<R> {
    fn fingerprint(&self, image: &CapturedImage) -> Result<CaptureFingerprint> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or_else(|| Unsupported("OCR engine not available".to_string()))?;
        check_circle_params(&self.circles)?;

        let gray = image.to_gray();
        let (width, height) = gray.dimensions();

        // the upper half is where the overlay's own label sits
        let half = height / 2;
        let lower = imageops::crop_imm(&gray, 0, half, width, height - half).to_image();
        let binary = adaptive_gaussian_threshold(&lower, &self.threshold);
        let recognized_text = recognizer
            .recognize(&binary)
            .context("Text recognition failed")?
            .trim()
            .to_string();

        let blurred = gaussian_blur_f32(&gray, self.circles.blur_sigma);
        let marker_count = marker_count(detect_circles(&blurred, &self.circles));

        Ok(CaptureFingerprint {
            recognized_text,
            marker_count,
        })
    }
}

/// Values that would make the blur or edge pass panic
fn check_circle_params(circles: &CircleParams) -> Result<()> {
    anyhow::ensure!(
        circles.blur_sigma.is_finite() && circles.blur_sigma > 0.0,
        "circles.blur_sigma must be positive, got {}",
        circles.blur_sigma
    );
    anyhow::ensure!(
        circles.canny_high.is_finite() && circles.canny_high >= 0.0,
        "circles.canny_high must not be negative, got {}",
        circles.canny_high
    );
    Ok(())
}
