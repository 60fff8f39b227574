// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge lengths and output size of an ordered quadrilateral.

use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{Corner, Quadrilateral};
use tracing::debug;

/// Lengths of the four sides of an ordered quadrilateral, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLengths {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgeLengths {
    pub fn of(quad: &Quadrilateral) -> Self {
        let tl = quad.corner(Corner::TopLeft);
        let tr = quad.corner(Corner::TopRight);
        let br = quad.corner(Corner::BottomRight);
        let bl = quad.corner(Corner::BottomLeft);
        Self {
            top: tl.distance_to(&tr),
            right: tr.distance_to(&br),
            bottom: bl.distance_to(&br),
            left: tl.distance_to(&bl),
        }
    }

    /// The longer of the two horizontal sides.
    pub fn max_width(&self) -> f64 {
        self.top.max(self.bottom)
    }

    /// The longer of the two vertical sides.
    pub fn max_height(&self) -> f64 {
        self.left.max(self.right)
    }
}

/// Integer pixel size of a rectified output rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectSize {
    pub width: u32,
    pub height: u32,
}

impl RectSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Output size for an ordered quadrilateral.
///
/// Each dimension is the longer of the two parallel sides, rounded to the
/// nearest pixel and never below 1. Taking the longer side avoids shrinking
/// content when the quadrilateral is skewed. A side that rounds to zero (or
/// is not finite) means the points coincide and fails with
/// [`RectifyError::DegenerateQuad`].
pub fn measure(quad: &Quadrilateral) -> Result<RectSize> {
    let edges = EdgeLengths::of(quad);
    let (width, height) = (edges.max_width(), edges.max_height());

    let rounded_width = width.round();
    let rounded_height = height.round();
    if !rounded_width.is_finite()
        || !rounded_height.is_finite()
        || rounded_width <= 0.0
        || rounded_height <= 0.0
    {
        return Err(RectifyError::DegenerateQuad { width, height });
    }

    if rounded_width > u32::MAX as f64 || rounded_height > u32::MAX as f64 {
        return Err(RectifyError::RasterizationFailed(format!(
            "a {rounded_width} x {rounded_height} px target exceeds the addressable image size"
        )));
    }

    let size = RectSize::new(
        (rounded_width as u32).max(1),
        (rounded_height as u32).max(1),
    );
    debug!(?edges, width = size.width, height = size.height, "Quad measured");
    Ok(size)
}
