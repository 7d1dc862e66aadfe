use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder};
use quizlens_config::ocr::OcrConfig;
use quizlens_core::error::Unsupported;

pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

/// Tesseract driven as a subprocess, PNG in on stdin, text out on stdout
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Probe the configured binary, `Unsupported` when it cannot be run
    pub fn locate(config: &OcrConfig) -> Result<Self> {
        if !config.enabled {
            return Err(Unsupported("OCR is disabled in the config".to_string()).into());
        }

        let engine = Self::new(&config.tesseract_path, &config.language);
        match engine.version() {
            Ok(version) => {
                tracing::info!("Using {} at {}", version, engine.binary.display());
                Ok(engine)
            }
            Err(e) => Err(Unsupported(format!(
                "Tesseract not found at {}: {:#}",
                engine.binary.display(),
                e
            ))
            .into()),
        }
    }

    pub fn version(&self) -> Result<String> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        let text = String::from_utf8_lossy(&output.stdout);
        let first = text.lines().next().unwrap_or("tesseract").trim();
        Ok(first.to_string())
    }

    #[cfg(windows)]
    fn command(&self) -> Command {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;

        let mut command = Command::new(&self.binary);
        command.creation_flags(CREATE_NO_WINDOW);
        command
    }

    #[cfg(not(windows))]
    fn command(&self) -> Command {
        Command::new(&self.binary)
    }
}

impl TextRecognizer for TesseractOcr {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::L8)
            .context("Failed to encode PNG")?;

        let mut child = self
            .command()
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.binary.display()))?;

        // tesseract reads all input before writing anything
        child
            .stdin
            .take()
            .context("Tesseract stdin unavailable")?
            .write_all(&png)
            .context("Failed to send image to tesseract")?;

        let output = child
            .wait_with_output()
            .context("Failed to wait for tesseract")?;

        if !output.status.success() {
            anyhow::bail!(
                "Tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
