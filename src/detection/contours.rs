use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use crate::models::{Contour, Point};

/// Find the outermost contours in a binary edge image.
///
/// Hole borders and anything nested inside another border are dropped. The order is
/// imageproc's raster-scan discovery order.
pub fn find_outer_contours(edges: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .enumerate()
        .map(|(index, c)| {
            let chain: Vec<(i32, i32)> = c.points.iter().map(|p| (p.x, p.y)).collect();
            Contour {
                index,
                points: compress_chain(&chain)
                    .into_iter()
                    .map(|(x, y)| Point::new(x as f64, y as f64))
                    .collect(),
            }
        })
        .collect()
}

/// Keep only the vertices where the chain changes direction.
///
/// Straight runs collapse to their end points; the chain is treated as closed.
pub fn compress_chain(chain: &[(i32, i32)]) -> Vec<(i32, i32)> {
    if chain.len() < 3 {
        return chain.to_vec();
    }

    let n = chain.len();
    let step = |a: (i32, i32), b: (i32, i32)| ((b.0 - a.0).signum(), (b.1 - a.1).signum());

    let kept: Vec<(i32, i32)> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let here = chain[i];
            let next = chain[(i + 1) % n];
            step(prev, here) != step(here, next)
        })
        .map(|i| chain[i])
        .collect();

    // A closed chain always turns somewhere unless every point coincides.
    if kept.is_empty() {
        vec![chain[0]]
    } else {
        kept
    }
}
