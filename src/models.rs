use serde::{Deserialize, Serialize};

/// A coordinate in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Closed polygon; the last vertex connects back to the first.
///
/// Winding and convexity are not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fewer than three vertices, or a vertex that is NaN/infinite.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3 || self.points.iter().any(|p| !p.is_finite())
    }

    /// Axis-aligned bounds as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        Some(self.points.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        ))
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points.into_iter().map(Point::from).collect())
    }
}

/// Oriented rectangle: centre, side lengths and rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Corner points, walking the rectangle from the (-w/2, +h/2) corner.
    pub fn corners(&self) -> [Point; 4] {
        let theta = self.angle.to_radians();
        let (sin, cos) = theta.sin_cos();
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;

        [(-hw, hh), (-hw, -hh), (hw, -hh), (hw, hh)].map(|(u, v)| {
            Point::new(
                self.center.x + u * cos - v * sin,
                self.center.y + u * sin + v * cos,
            )
        })
    }
}

/// The quadrilateral reported for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub corners: [Point; 4],
    pub rect: RotatedRect,
}

impl Quad {
    pub fn from_rect(rect: RotatedRect) -> Self {
        Self {
            corners: rect.corners(),
            rect,
        }
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners.to_vec())
    }

    /// Oriented box area (width x height), the detector's ranking score.
    pub fn score(&self) -> f64 {
        self.rect.area()
    }
}

/// `None` means no contour produced a usable rectangle.
pub type DetectionResult = Option<Quad>;

/// Outer border of a connected edge region, in discovery order.
#[derive(Debug, Clone)]
pub struct Contour {
    pub index: usize,
    pub points: Vec<Point>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
