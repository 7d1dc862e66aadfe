use std::env;

use serde::{Deserialize, Serialize};

use self::capture::CaptureConfig;
use self::chat::ChatConfig;
use self::credential::CredentialConfig;
use self::ocr::OcrConfig;
use self::scanner::ScannerConfig;

pub mod capture;
pub mod chat;
pub mod credential;
pub mod ocr;
pub mod profile;
pub mod scanner;

pub use credential::CredentialBootstrap;
pub use profile::ProfileStore;
pub use scanner::{CircleParams, ThresholdParams};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub ocr: OcrConfig,
    pub capture: CaptureConfig,
    pub chat: ChatConfig,
    pub credential: CredentialConfig,
}

impl Config {
    /// Environment variables win over the loaded profile
    pub fn apply_env(&mut self) {
        if let Some(interval) = env::var("SCAN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.scanner.interval_ms = interval;
        }

        if let Ok(path) = env::var("TESSERACT_PATH")
            && !path.is_empty()
        {
            self.ocr.tesseract_path = path;
        }

        if let Ok(url) = env::var("CHAT_API_URL")
            && !url.is_empty()
        {
            self.chat.api_url = url;
        }

        if let Ok(model) = env::var("CHAT_MODEL")
            && !model.is_empty()
        {
            self.chat.model = model;
        }

        if let Some(timeout) = env::var("CHAT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.chat.timeout_seconds = timeout;
        }
    }
}
