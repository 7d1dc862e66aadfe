use std::path::PathBuf;

use anyhow::Result;

use crate::fingerprint::{CaptureFingerprint, ChangeDetector};
use crate::frame::CapturedImage;

/// Produces the pixels for one scan tick
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<CapturedImage>;
}

pub trait Fingerprinter: Send {
    fn fingerprint(&self, image: &CapturedImage) -> Result<CaptureFingerprint>;
}

/// Receives the capture whenever the fingerprint changes
pub trait ArtifactSink: Send {
    fn persist(&mut self, image: &CapturedImage) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Unchanged(CaptureFingerprint),
    Changed(CaptureFingerprint),
}

impl ScanOutcome {
    pub fn fingerprint(&self) -> &CaptureFingerprint {
        match self {
            ScanOutcome::Unchanged(fp) | ScanOutcome::Changed(fp) => fp,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, ScanOutcome::Changed(_))
    }
}

/// Capture, fingerprint, and persist-on-change, one tick at a time
pub struct ChangeScanner {
    source: Box<dyn FrameSource>,
    fingerprinter: Box<dyn Fingerprinter>,
    sink: Box<dyn ArtifactSink>,
    detector: ChangeDetector,
}

impl ChangeScanner {
    pub fn new(
        source: Box<dyn FrameSource>,
        fingerprinter: Box<dyn Fingerprinter>,
        sink: Box<dyn ArtifactSink>,
        detector: ChangeDetector,
    ) -> Self {
        Self {
            source,
            fingerprinter,
            sink,
            detector,
        }
    }

    pub fn last_fingerprint(&self) -> &CaptureFingerprint {
        self.detector.last()
    }

    /// Run one scan
    ///
    /// The stored fingerprint only moves once the artifact is written, so a
    /// failed write is retried on the next tick.
    pub fn tick(&mut self) -> Result<ScanOutcome> {
        let image = self.source.capture()?;
        let fingerprint = self.fingerprinter.fingerprint(&image)?;

        if !self.detector.is_changed(&fingerprint) {
            tracing::debug!("No change detected, skipping screenshot");
            return Ok(ScanOutcome::Unchanged(fingerprint));
        }

        self.sink.persist(&image)?;
        self.detector.commit(fingerprint.clone());
        tracing::info!(
            marker_count = fingerprint.marker_count,
            text_len = fingerprint.recognized_text.len(),
            "New screenshot saved"
        );

        Ok(ScanOutcome::Changed(fingerprint))
    }
}

/// Writes the capture to one fixed PNG path, replacing the previous file
pub struct PngArtifactSink {
    path: PathBuf,
}

impl PngArtifactSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ArtifactSink for PngArtifactSink {
    fn persist(&mut self, image: &CapturedImage) -> Result<()> {
        image.save_png(&self.path)
    }
}
