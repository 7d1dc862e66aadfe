use unicode_normalization::UnicodeNormalization;

pub trait Preprocessor {
    fn process(&self, text: &str) -> String;
}

/// Leaves OCR output untouched, so fingerprints compare exactly
pub struct ExactText;

impl Preprocessor for ExactText {
    fn process(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Absorbs OCR jitter: NFKC, collapsed whitespace, lowercase
pub struct NormalizedText;

impl Preprocessor for NormalizedText {
    fn process(&self, text: &str) -> String {
        let text: String = text.nfkc().collect();

        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
