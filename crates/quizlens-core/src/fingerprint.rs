use crate::preprocess::{ExactText, NormalizedText, Preprocessor};

/// Signature of one scan: recognized text plus the number of answer markers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureFingerprint {
    pub recognized_text: String,
    pub marker_count: usize,
}

impl CaptureFingerprint {
    pub fn new(recognized_text: impl Into<String>, marker_count: usize) -> Self {
        Self {
            recognized_text: recognized_text.into(),
            marker_count,
        }
    }
}

/// Remembers the last committed fingerprint and decides whether a new one differs
///
/// Starts from the empty fingerprint, so a first scan that finds no text and no
/// markers counts as unchanged.
pub struct ChangeDetector {
    last: CaptureFingerprint,
    preprocessor: Box<dyn Preprocessor + Send>,
}

impl ChangeDetector {
    pub fn exact() -> Self {
        Self {
            last: CaptureFingerprint::default(),
            preprocessor: Box::new(ExactText),
        }
    }

    pub fn normalized() -> Self {
        Self {
            last: CaptureFingerprint::default(),
            preprocessor: Box::new(NormalizedText),
        }
    }

    pub fn last(&self) -> &CaptureFingerprint {
        &self.last
    }

    pub fn is_changed(&self, candidate: &CaptureFingerprint) -> bool {
        candidate.marker_count != self.last.marker_count
            || self.preprocessor.process(&candidate.recognized_text)
                != self.preprocessor.process(&self.last.recognized_text)
    }

    pub fn commit(&mut self, fingerprint: CaptureFingerprint) {
        self.last = fingerprint;
    }
}
