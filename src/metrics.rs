//! Polygon overlap scoring by rasterization.
//!
//! Both polygons are filled into binary masks of the same fixed-size canvas and the
//! IoU is the ratio of cell counts. A cell counts as covered when the polygon's
//! interior or outline touches it, so areas are cell counts rather than continuous
//! areas and the error is bounded by roughly one cell along each polygon edge.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

use crate::models::Polygon;

pub const DEFAULT_CANVAS_SIZE: u32 = 1000;

const FILLED: Luma<u8> = Luma([255]);

/// Absorbs float noise such as 49.999999999 from rotated corners before flooring.
const SNAP: f64 = 1e-6;

/// Raster resolution used for IoU. Geometry outside the canvas is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IouCanvas {
    pub width: u32,
    pub height: u32,
}

impl Default for IouCanvas {
    fn default() -> Self {
        Self::square(DEFAULT_CANVAS_SIZE)
    }
}

impl IouCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Fill `polygon` into a fresh mask.
    ///
    /// Vertices are floored to the pixel that contains them, then filled with
    /// imageproc's even-odd scanline, which also draws every edge. A thin polygon
    /// therefore always covers the cells its outline passes through.
    pub fn rasterize(&self, polygon: &Polygon) -> GrayImage {
        let mut mask = GrayImage::new(self.width, self.height);
        if polygon.is_degenerate() || self.width == 0 || self.height == 0 {
            return mask;
        }

        let vertices = self.pixel_vertices(polygon);
        match vertices.as_slice() {
            [] => {}
            [only] => {
                if let (Ok(x), Ok(y)) = (u32::try_from(only.x), u32::try_from(only.y))
                    && x < self.width
                    && y < self.height
                {
                    mask.put_pixel(x, y, FILLED);
                }
            }
            _ => draw_polygon_mut(&mut mask, &vertices, FILLED),
        }

        mask
    }

    /// Integer vertices as an open path: no repeated neighbours and a last point
    /// different from the first. Coordinates are clamped to a band around the
    /// canvas to keep the scanline arithmetic in range.
    fn pixel_vertices(&self, polygon: &Polygon) -> Vec<PixelPoint<i32>> {
        let reach = (4.0 * f64::from(self.width.max(self.height))).min(f64::from(i32::MAX / 4));
        let to_pixel = |v: f64| (v + SNAP).floor().clamp(-reach, reach) as i32;

        let mut vertices: Vec<PixelPoint<i32>> = polygon
            .points
            .iter()
            .map(|p| PixelPoint::new(to_pixel(p.x), to_pixel(p.y)))
            .collect();
        vertices.dedup();
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        vertices
    }

    /// Intersection-over-union of two polygons on this canvas.
    ///
    /// Returns 0.0 when neither polygon covers any cell.
    pub fn iou(&self, a: &Polygon, b: &Polygon) -> f64 {
        let mask_a = self.rasterize(a);
        let mask_b = self.rasterize(b);

        let (intersection, union) = mask_a
            .as_raw()
            .iter()
            .zip(mask_b.as_raw().iter())
            .fold((0u64, 0u64), |(inter, uni), (&pa, &pb)| {
                let (in_a, in_b) = (pa != 0, pb != 0);
                (
                    inter + (in_a && in_b) as u64,
                    uni + (in_a || in_b) as u64,
                )
            });

        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }

    /// Number of cells covered by `polygon`.
    pub fn filled_cells(&self, polygon: &Polygon) -> u64 {
        self.rasterize(polygon)
            .as_raw()
            .iter()
            .filter(|&&v| v != 0)
            .count() as u64
    }
}

/// IoU on the default 1000x1000 canvas.
pub fn iou(a: &Polygon, b: &Polygon) -> f64 {
    IouCanvas::default().iou(a, b)
}

/// Continuous polygon area (shoelace formula, absolute value).
pub fn polygon_area(polygon: &Polygon) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let p = polygon.points[i];
            let q = polygon.points[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum();
    twice.abs() / 2.0
}
