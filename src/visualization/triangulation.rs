//! Delaunay triangulation of scattered plot points.
//!
//! Points are triangulated on their first two coordinates after scaling both
//! to the unit box, so the level axis (a dozen positions) and the date axis
//! (thousands of days) weigh the same.

use delaunator::{triangulate, Point};

use super::{Result, VisualizationError};

/// Triangles over a point cloud, as index triples into the input points.
pub fn triangulate_points(points: &[[f64; 3]]) -> Result<Vec<[usize; 3]>> {
    if points.len() < 3 {
        return Err(VisualizationError::DegenerateGeometry {
            points: points.len(),
        });
    }

    let (x_min, x_span) = axis_extent(points.iter().map(|p| p[0]));
    let (y_min, y_span) = axis_extent(points.iter().map(|p| p[1]));

    let planar: Vec<Point> = points
        .iter()
        .map(|p| Point {
            x: (p[0] - x_min) / x_span,
            y: (p[1] - y_min) / y_span,
        })
        .collect();

    let triangulation = triangulate(&planar);
    if triangulation.triangles.is_empty() {
        // All points collinear or coincident.
        return Err(VisualizationError::DegenerateGeometry {
            points: points.len(),
        });
    }

    Ok(triangulation
        .triangles
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect())
}

/// Minimum and span of one axis; a zero span is reported as 1.
fn axis_extent<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let span = max - min;
    if span.is_finite() && span > 0.0 {
        (min, span)
    } else {
        (if min.is_finite() { min } else { 0.0 }, 1.0)
    }
}
