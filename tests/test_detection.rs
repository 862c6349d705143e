//! Integration tests for the rectangle detector on synthetic photos.
//!
//! Tests cover:
//! - A single light rectangle on a dark background
//! - A rotated rectangle
//! - Picking the largest of several rectangles
//! - Blank and smoothly shaded images (nothing to find)

mod common;

use common::*;
use image::DynamicImage;

#[test]
fn test_detects_single_rectangle() {
    // 1. Paper sheet at (40,30)-(160,110) on a 200x150 table
    let img = DynamicImage::ImageRgb8(solid_rect_image(200, 150, 40, 30, 160, 110));

    // 2. Detect
    let quad = RectangleDetector::default()
        .detect(&img)
        .expect("rectangle should be found");

    // 3. The quad hugs the sheet
    let truth = rect_polygon(40.0, 30.0, 160.0, 110.0);
    let score = iou(&quad.to_polygon(), &truth);
    assert!(score >= 0.9, "IoU {score} too low for {quad:?}");
    assert_eq!(quad.corners.len(), 4);
    assert!((quad.rect.center.x - 100.0).abs() < 2.0);
    assert!((quad.rect.center.y - 70.0).abs() < 2.0);
}

#[test]
fn test_detects_rotated_rectangle() {
    // 1. A 100x60 rectangle turned by roughly 30 degrees
    let corners = [(67, 45), (154, 95), (124, 147), (37, 97)];
    let img = DynamicImage::ImageRgb8(solid_polygon_image(200, 200, &corners));

    // 2. Detect
    let quad = RectangleDetector::default()
        .detect(&img)
        .expect("rectangle should be found");

    // 3. Compare with the drawn shape
    let truth = Polygon::from(
        corners
            .iter()
            .map(|&(x, y)| (x as f64, y as f64))
            .collect::<Vec<_>>(),
    );
    let score = iou(&quad.to_polygon(), &truth);
    assert!(score >= 0.9, "IoU {score} too low for {quad:?}");

    let angle = quad.rect.angle.rem_euclid(90.0);
    assert!(angle > 20.0 && angle < 40.0, "unexpected angle {angle}");
}

#[test]
fn test_largest_rectangle_wins() {
    // 1. Small card and a large sheet on the same table
    let mut img = solid_rect_image(300, 200, 20, 20, 60, 50);
    for y in 70..180 {
        for x in 120..280 {
            img.put_pixel(x, y, PAPER);
        }
    }

    // 2. Detect
    let quad = RectangleDetector::default()
        .detect(&DynamicImage::ImageRgb8(img))
        .expect("rectangle should be found");

    // 3. The large sheet is reported
    let score = iou(&quad.to_polygon(), &rect_polygon(120.0, 70.0, 280.0, 180.0));
    assert!(score >= 0.9, "IoU {score} too low for {quad:?}");
}

#[test]
fn test_blank_image_has_no_rectangle() {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(120, 80, BACKGROUND));
    assert!(RectangleDetector::default().detect(&img).is_none());
}

#[test]
fn test_gradient_has_no_rectangle() {
    let img = DynamicImage::ImageRgb8(gradient_image(320, 240));
    let detector = RectangleDetector::default();
    assert!(detector.contours(&img).is_empty());
    assert!(detector.detect(&img).is_none());
}

#[test]
fn test_edges_outline_the_sheet() {
    let img = DynamicImage::ImageRgb8(solid_rect_image(100, 100, 10, 10, 50, 50));
    let edges = RectangleDetector::default().edges(&img);

    // Edge pixels sit on the border of the square, not in its interior or far away
    let mut count = 0;
    for (x, y, p) in edges.enumerate_pixels() {
        if p[0] == 0 {
            continue;
        }
        count += 1;
        assert!((8..=51).contains(&x) && (8..=51).contains(&y), "stray edge at ({x},{y})");
        assert!(!((13..=46).contains(&x) && (13..=46).contains(&y)), "edge inside at ({x},{y})");
    }
    assert!(count > 100);
}
