use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;
use quadeval::Polygon;

/// Light paper on a dark table
pub const BACKGROUND: Rgb<u8> = Rgb([20, 20, 20]);
pub const PAPER: Rgb<u8> = Rgb([235, 235, 235]);

/// Dark image with the cells `x0..x1` x `y0..y1` filled light.
pub fn solid_rect_image(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            PAPER
        } else {
            BACKGROUND
        }
    })
}

/// Dark image with a light convex polygon drawn from integer corners.
pub fn solid_polygon_image(width: u32, height: u32, corners: &[(i32, i32)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let points: Vec<PixelPoint<i32>> = corners
        .iter()
        .map(|&(x, y)| PixelPoint::new(x, y))
        .collect();
    draw_polygon_mut(&mut img, &points, PAPER);
    img
}

/// Smooth left-to-right/top-to-bottom gradient with no edges worth detecting
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        Rgb([r, g, 128])
    })
}

/// Axis-aligned rectangle polygon with corners in the annotation tool's order.
pub fn rect_polygon(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    Polygon::from(vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0)])
}

/// Save `img` under `dir/name`.
///
/// Always PNG-encoded, whatever the file name says, so tests are not at the mercy of
/// JPEG artefacts; the loader sniffs the real format.
pub fn save_image(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(img.clone())
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

/// Write bytes that no decoder accepts.
pub fn save_corrupt_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\xff\xd8 definitely not a jpeg")
        .expect("Failed to write corrupt image");
    path
}

/// One VIA entry for `filename` with a polygon region per element of `regions`.
pub fn via_entry(filename: &str, regions: &[&[(i64, i64)]]) -> serde_json::Value {
    let regions: Vec<serde_json::Value> = regions
        .iter()
        .map(|points| {
            let xs: Vec<i64> = points.iter().map(|p| p.0).collect();
            let ys: Vec<i64> = points.iter().map(|p| p.1).collect();
            serde_json::json!({
                "shape_attributes": {
                    "name": "polygon",
                    "all_points_x": xs,
                    "all_points_y": ys,
                },
                "region_attributes": {},
            })
        })
        .collect();

    serde_json::json!({
        "filename": filename,
        "size": 1024,
        "regions": regions,
        "file_attributes": {},
    })
}

/// VIA project object keyed the way the tool keys it (`filename` + `size`).
pub fn via_document(entries: Vec<serde_json::Value>) -> serde_json::Value {
    let mut doc = serde_json::Map::new();
    for entry in entries {
        let key = format!("{}{}", entry["filename"].as_str().unwrap_or_default(), entry["size"]);
        doc.insert(key, entry);
    }
    serde_json::Value::Object(doc)
}

pub fn write_annotations(dir: &Path, doc: &serde_json::Value) -> PathBuf {
    let path = dir.join("annotation.json");
    std::fs::write(&path, serde_json::to_string_pretty(doc).expect("serialize annotations"))
        .expect("Failed to write annotation file");
    path
}

/// The square used throughout the end-to-end tests.
pub const SQUARE: &[(i64, i64)] = &[(10, 10), (10, 50), (50, 50), (50, 10)];

/// Parse the score out of an `Image: <path>, IoU: <score>` line.
pub fn parse_iou(line: &str) -> Option<f64> {
    let rest = line.split(", IoU: ").nth(1)?;
    rest.split_whitespace().next()?.parse().ok()
}
