//! Minimum-area enclosing rectangle by rotating calipers over the convex hull.

use std::cmp::Ordering;

use crate::models::{Point, RotatedRect};

/// Smallest-area rectangle, at any rotation, containing every point.
///
/// Returns `None` for an empty point set. Collinear input yields a rectangle with
/// zero height.
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    let first = *points.first()?;
    let hull = convex_hull(points);

    if hull.len() < 3 {
        // single point or a segment
        let far = hull.last().copied().unwrap_or(first);
        let near = hull.first().copied().unwrap_or(first);
        let (dx, dy) = (far.x - near.x, far.y - near.y);
        return Some(RotatedRect {
            center: Point::new((near.x + far.x) / 2.0, (near.y + far.y) / 2.0),
            width: dx.hypot(dy),
            height: 0.0,
            angle: dy.atan2(dx).to_degrees(),
        });
    }

    let n = hull.len();
    let mut best: Option<RotatedRect> = None;

    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let (ex, ey) = (p2.x - p1.x, p2.y - p1.y);
        let len = ex.hypot(ey);
        if len < 1e-12 {
            continue;
        }

        // edge direction and its normal
        let (ux, uy) = (ex / len, ey / len);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for p in &hull {
            let (dx, dy) = (p.x - p1.x, p.y - p1.y);
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        if best.is_some_and(|b| b.area() <= width * height) {
            continue;
        }

        let cu = (min_u + max_u) / 2.0;
        let cv = (min_v + max_v) / 2.0;
        best = Some(RotatedRect {
            center: Point::new(p1.x + cu * ux + cv * vx, p1.y + cu * uy + cv * vy),
            width,
            height,
            angle: uy.atan2(ux).to_degrees(),
        });
    }

    best
}

/// Andrew's monotone chain. Counter-clockwise in a y-up frame, collinear points
/// removed.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.iter().copied().filter(Point::is_finite).collect();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::new();
    for p in &pts {
        while lower.len() >= 2
            && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for p in pts.iter().rev() {
        while upper.len() >= 2
            && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}
