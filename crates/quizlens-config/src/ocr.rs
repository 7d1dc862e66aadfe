use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_tesseract_path() -> String {
    if cfg!(windows) {
        r"C:\Program Files\Tesseract-OCR\tesseract.exe".to_string()
    } else {
        "tesseract".to_string()
    }
}

fn default_language() -> String {
    "eng".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path to the tesseract executable, or a bare name resolved through PATH
    #[serde(default = "default_tesseract_path")]
    pub tesseract_path: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tesseract_path: default_tesseract_path(),
            language: default_language(),
        }
    }
}
