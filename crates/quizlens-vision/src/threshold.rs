use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use quizlens_config::ThresholdParams;

/// Adaptive threshold against a Gaussian-weighted local mean
///
/// A pixel turns white when it is brighter than the weighted mean of its
/// `block_size` neighbourhood minus `offset`, black otherwise.
pub fn adaptive_gaussian_threshold(image: &GrayImage, params: &ThresholdParams) -> GrayImage {
    let sigma = block_sigma(params.block_size);
    let local_mean = gaussian_blur_f32(image, sigma);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0] as f32;
        let mean = local_mean.get_pixel(x, y)[0] as f32;
        if value > mean - params.offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Sigma implied by a square kernel of `block_size`
fn block_sigma(block_size: u32) -> f32 {
    let block = block_size.max(3) as f32;
    0.3 * ((block - 1.0) * 0.5 - 1.0) + 0.8
}
