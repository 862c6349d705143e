pub mod preprocessing;
pub mod contours;
pub mod rotated_rect;

use image::{DynamicImage, GrayImage};
use log::{debug, trace};

use crate::models::{Contour, DetectionResult, Quad};

pub const DEFAULT_BLUR_KERNEL: u32 = 5;
pub const DEFAULT_LOW_THRESHOLD: f32 = 50.0;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 150.0;

/// Edge/contour pipeline that finds the dominant rectangle in a photo.
///
/// grayscale -> 5x5 Gaussian blur -> Canny -> outer contours -> oriented box per
/// contour -> largest box. Parameters are fixed per run; nothing adapts to the image.
#[derive(Debug, Clone)]
pub struct RectangleDetector {
    pub blur_kernel: u32,
    /// `None` derives sigma from the kernel size.
    pub blur_sigma: Option<f32>,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl RectangleDetector {
    pub fn new() -> Self {
        Self {
            blur_kernel: DEFAULT_BLUR_KERNEL,
            blur_sigma: None,
            low_threshold: DEFAULT_LOW_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
        }
    }

    pub fn with_blur(mut self, kernel: u32, sigma: Option<f32>) -> Self {
        self.blur_kernel = kernel;
        self.blur_sigma = sigma;
        self
    }

    pub fn with_thresholds(mut self, low: f32, high: f32) -> Self {
        self.low_threshold = low;
        self.high_threshold = high;
        self
    }

    /// Binary edge map for an image (for debugging)
    pub fn edges(&self, img: &DynamicImage) -> GrayImage {
        let gray = preprocessing::to_grayscale(img);
        let blurred = preprocessing::apply_blur(&gray, self.blur_kernel, self.blur_sigma);
        preprocessing::detect_edges(&blurred, self.low_threshold, self.high_threshold)
    }

    /// Outer contours in discovery order (for debugging)
    pub fn contours(&self, img: &DynamicImage) -> Vec<Contour> {
        contours::find_outer_contours(&self.edges(img))
    }

    /// Run the full pipeline on one image.
    pub fn detect(&self, img: &DynamicImage) -> DetectionResult {
        let all_contours = self.contours(img);
        debug!("found {} outer contours", all_contours.len());
        select_largest(&all_contours)
    }
}

impl Default for RectangleDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the contour whose oriented bounding box has the largest area.
///
/// Only strictly larger boxes replace the current best, so the earliest contour wins
/// a tie. Zero-area boxes never qualify.
pub fn select_largest(candidates: &[Contour]) -> DetectionResult {
    let mut best: Option<Quad> = None;

    for contour in candidates {
        let Some(rect) = rotated_rect::min_area_rect(&contour.points) else {
            continue;
        };
        trace!(
            "contour {}: {} vertices, box {:.1}x{:.1} at {:.1} deg",
            contour.index,
            contour.len(),
            rect.width,
            rect.height,
            rect.angle
        );

        let best_score = best.map_or(0.0, |q| q.score());
        if rect.area() > best_score {
            best = Some(Quad::from_rect(rect));
        }
    }

    best
}
