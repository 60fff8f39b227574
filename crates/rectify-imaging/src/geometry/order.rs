// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner ordering for four clicked points.

use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{Corner, Quadrilateral};
use tracing::{debug, warn};

/// Two coordinates closer than this are treated as the same value.
const TIE_EPSILON: f64 = 1e-9;

/// Sort four points into top-left, top-right, bottom-right, bottom-left.
///
/// With `s = x + y` and `d = y - x` (image coordinates, Y down):
///
/// - smallest `s` is top-left, largest `s` is bottom-right
/// - smallest `d` is top-right, largest `d` is bottom-left
///
/// This assumes the outlined object is roughly upright. Quadrilaterals rotated
/// close to 45 degrees produce ties or swapped corners; ties are rejected,
/// swaps are not detectable here.
///
/// Fails with [`RectifyError::InvalidGeometry`] when two points coincide,
/// when an extremum is shared by two points, or when one point would fill two
/// corners.
pub fn order_points(quad: &Quadrilateral) -> Result<Quadrilateral> {
    let pts = *quad.points();

    for i in 0..4 {
        for j in (i + 1)..4 {
            if pts[i].distance_to(&pts[j]) <= TIE_EPSILON {
                warn!(point = %pts[i], "Duplicate point in quadrilateral");
                return Err(RectifyError::InvalidGeometry(format!(
                    "points {} and {} coincide at {}",
                    i + 1,
                    j + 1,
                    pts[i]
                )));
            }
        }
    }

    let sums = pts.map(|p| p.x + p.y);
    let diffs = pts.map(|p| p.y - p.x);

    let top_left = unique_extreme(&sums, Extreme::Min, "x + y minimum")?;
    let bottom_right = unique_extreme(&sums, Extreme::Max, "x + y maximum")?;
    let top_right = unique_extreme(&diffs, Extreme::Min, "y - x minimum")?;
    let bottom_left = unique_extreme(&diffs, Extreme::Max, "y - x maximum")?;

    let picked = [top_left, top_right, bottom_right, bottom_left];
    for i in 0..4 {
        for j in (i + 1)..4 {
            if picked[i] == picked[j] {
                return Err(RectifyError::InvalidGeometry(format!(
                    "point {} would be both the {} and the {} corner; the quadrilateral is not convex or is rotated too far",
                    picked[i] + 1,
                    Corner::ALL[i].label(),
                    Corner::ALL[j].label()
                )));
            }
        }
    }

    let ordered = Quadrilateral::new(picked.map(|i| pts[i]));
    debug!(input = %quad, ordered = %ordered, "Points ordered");
    Ok(ordered)
}

#[derive(Debug, Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// Index of the single smallest (or largest) value, or an error on a tie.
fn unique_extreme(values: &[f64; 4], extreme: Extreme, what: &str) -> Result<usize> {
    let better = |a: f64, b: f64| match extreme {
        Extreme::Min => a < b,
        Extreme::Max => a > b,
    };

    let mut best = 0;
    for i in 1..4 {
        if better(values[i], values[best]) {
            best = i;
        }
    }

    let ties = values
        .iter()
        .filter(|v| (**v - values[best]).abs() <= TIE_EPSILON)
        .count();
    if ties > 1 {
        return Err(RectifyError::InvalidGeometry(format!(
            "{ties} points share the {what} ({}); the corners are ambiguous",
            values[best]
        )));
    }
    Ok(best)
}
