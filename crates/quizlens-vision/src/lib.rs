mod capture;
mod fingerprint;
mod markers;
mod ocr;
mod threshold;

pub use capture::{ScreenRegionSource, capture_screen_region};
pub use fingerprint::QuestionFingerprinter;
pub use markers::{Circle, detect_circles, marker_count};
pub use ocr::{TesseractOcr, TextRecognizer};
pub use threshold::adaptive_gaussian_threshold;
