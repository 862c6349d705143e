use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;

/// Convert image to single-channel luminance
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Sigma used for a given kernel size when none is specified.
pub fn auto_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian taps for an odd `kernel_size`.
pub fn gaussian_kernel(kernel_size: u32, sigma: f32) -> Vec<f32> {
    let radius = (kernel_size / 2) as i32;
    let denom = 2.0 * sigma * sigma;
    let taps: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Apply a fixed-size Gaussian blur (square kernel, applied separably)
pub fn apply_blur(img: &GrayImage, kernel_size: u32, sigma: Option<f32>) -> GrayImage {
    let kernel_size = kernel_size.max(1) | 1;
    let sigma = sigma
        .filter(|s| *s > 0.0)
        .unwrap_or_else(|| auto_sigma(kernel_size));
    separable_filter_equal(img, &gaussian_kernel(kernel_size, sigma))
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}
