use quizlens_types::CaptureRegion;
use serde::{Deserialize, Serialize};

fn default_interval_ms() -> u64 {
    1000
}

fn default_region() -> CaptureRegion {
    CaptureRegion {
        x: 100,
        y: 100,
        width: 400,
        height: 200,
    }
}

fn default_artifact_path() -> String {
    "captured_question.png".to_string()
}

/// Parameters of the Hough gradient pass that counts answer bullets
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CircleParams {
    /// Inverse accumulator resolution
    pub dp: f32,
    /// Minimum distance between detected centers
    pub min_dist: f32,
    /// Upper Canny threshold, the lower one is half of it
    pub canny_high: f32,
    /// Accumulator votes needed for a center
    pub votes: u32,
    pub min_radius: u32,
    pub max_radius: u32,
    /// Sigma of the blur applied before detection
    pub blur_sigma: f32,
}

impl Default for CircleParams {
    fn default() -> Self {
        Self {
            dp: 1.5,
            min_dist: 15.0,
            canny_high: 60.0,
            votes: 35,
            min_radius: 6,
            max_radius: 12,
            blur_sigma: 2.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ThresholdParams {
    /// Odd neighbourhood size
    pub block_size: u32,
    /// Constant subtracted from the weighted mean
    pub offset: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_size: 11,
            offset: 2.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_region")]
    pub region: CaptureRegion,
    /// Overwritten on every detected change
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    /// Compare NFKC-normalized, whitespace-collapsed, lowercased text instead of raw OCR output
    pub normalize_text: bool,
    pub circles: CircleParams,
    pub threshold: ThresholdParams,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            region: default_region(),
            artifact_path: default_artifact_path(),
            normalize_text: false,
            circles: CircleParams::default(),
            threshold: ThresholdParams::default(),
        }
    }
}
