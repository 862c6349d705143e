use std::path::PathBuf;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use log::debug;

use super::EvaluationRecord;
use crate::models::Point;

const DETECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const GROUND_TRUTH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Saves a preview of each image with the detected quad (green) and ground truth
/// (red) drawn on top. Purely presentational; the report never depends on it.
#[derive(Debug, Clone)]
pub struct OverlayWriter {
    output_dir: PathBuf,
}

impl OverlayWriter {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> anyhow::Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Overlay directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Render and save `<file name>.png`; returns the written path.
    ///
    /// Named after the image file, not the key: `scan.jpg` and `scan.jpg.png` share
    /// a key.
    pub fn write(&self, img: &DynamicImage, record: &EvaluationRecord) -> anyhow::Result<PathBuf> {
        let canvas = render(img, record);
        let file_name = record
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.key.clone());
        let output_path = self.output_dir.join(format!("{file_name}.png"));
        canvas
            .save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save overlay image: {}", e))?;
        debug!("overlay: saved {}", output_path.display());
        Ok(output_path)
    }
}

/// Draw the record's polygons onto a copy of the image.
pub fn render(img: &DynamicImage, record: &EvaluationRecord) -> RgbImage {
    let mut canvas = img.to_rgb8();
    if let Some(quad) = &record.detection {
        draw_closed_outline(&mut canvas, &quad.corners, DETECTION_COLOR);
    }
    if let Some(gt) = &record.ground_truth {
        draw_closed_outline(&mut canvas, &gt.points, GROUND_TRUTH_COLOR);
    }
    canvas
}

/// Two pixels wide: the segment plus a copy shifted one pixel down-right.
fn draw_closed_outline(canvas: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    if points.len() < 2 {
        return;
    }
    for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(
                canvas,
                ((start.x + offset) as f32, (start.y + offset) as f32),
                ((end.x + offset) as f32, (end.y + offset) as f32),
                color,
            );
        }
    }
}
