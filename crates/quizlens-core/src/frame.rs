use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbaImage};
use quizlens_types::CaptureRegion;

/// Pixels of one screen or clipboard capture plus where they came from
#[derive(Debug, Clone)]
pub struct CapturedImage {
    region: CaptureRegion,
    pixels: RgbaImage,
}

impl CapturedImage {
    pub fn new(region: CaptureRegion, pixels: RgbaImage) -> Self {
        Self { region, pixels }
    }

    /// Wrap a raw RGBA buffer, `None` when the length does not match the size
    pub fn from_rgba(region: CaptureRegion, width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, rgba).map(|pixels| Self::new(region, pixels))
    }

    pub fn region(&self) -> CaptureRegion {
        self.region
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.pixels)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(
                self.pixels.as_raw(),
                self.pixels.width(),
                self.pixels.height(),
                ExtendedColorType::Rgba8,
            )
            .context("Failed to encode PNG")?;
        Ok(buffer)
    }

    pub fn to_base64_png(&self) -> Result<String> {
        Ok(BASE64.encode(self.encode_png()?))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.encode_png()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn region() -> CaptureRegion {
        CaptureRegion {
            x: 0,
            y: 0,
            width: 4,
            height: 2,
        }
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(CapturedImage::from_rgba(region(), 4, 2, vec![0; 31]).is_none());
        assert!(CapturedImage::from_rgba(region(), 4, 2, vec![0; 32]).is_some());
    }

    #[test]
    fn png_encoding_is_decodable() {
        let pixels = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        let captured = CapturedImage::new(region(), pixels);

        let png = captured.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1), &Rgba([10, 20, 30, 255]));

        let b64 = captured.to_base64_png().unwrap();
        assert_eq!(BASE64.decode(b64).unwrap(), png);
    }
}
