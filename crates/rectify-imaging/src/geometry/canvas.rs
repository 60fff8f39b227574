// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output canvas selection: content fit, frame fit, and crop fit.

use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{FitMode, Point2D, Quadrilateral};
use tracing::{debug, instrument};

use super::homography::{self, Homography};
use super::metrics::RectSize;

/// Final transform and output size for a correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    /// Source pixel space to canvas pixel space.
    pub transform: Homography,
    pub width: u32,
    pub height: u32,
}

/// Choose the canvas for `mode`.
///
/// `quad` must already be in corner order and `rect` is the pixel size the
/// quadrilateral should be rectified to (from quad metrics or calibration).
#[instrument(skip(quad), fields(quad = %quad))]
pub fn fit(
    mode: FitMode,
    quad: &Quadrilateral,
    rect: RectSize,
    source_width: u32,
    source_height: u32,
) -> Result<Canvas> {
    match mode {
        FitMode::ContentFit => {
            let h = homography::solve(quad, &origin_rectangle(rect)?)?;
            fit_content(&h, source_width, source_height)
        }
        FitMode::FrameFit => fit_frame(quad, rect, source_width, source_height),
        FitMode::CropFit => fit_crop(quad, rect),
    }
}

/// Canvas holding the entire warped source image.
///
/// The four corners of the source frame are mapped through `h`; the canvas is
/// the ceiling of their bounding box and `h` is followed by a translation that
/// moves the box to the origin.
pub fn fit_content(h: &Homography, source_width: u32, source_height: u32) -> Result<Canvas> {
    if source_width == 0 || source_height == 0 {
        return Err(RectifyError::DegenerateOutput {
            width: source_width as f64,
            height: source_height as f64,
        });
    }

    let corners = source_corners(source_width, source_height);

    // A frame straddling the horizon line warps to an unbounded region.
    let weights = corners.map(|c| h.weight(c));
    let all_positive = weights.iter().all(|w| *w > 0.0);
    let all_negative = weights.iter().all(|w| *w < 0.0);
    if !(all_positive || all_negative) {
        return Err(RectifyError::DegenerateTransform(format!(
            "the source frame crosses the horizon line (corner weights {weights:?})"
        )));
    }

    let mapped = homography::apply_to_points(h, &corners)?;
    let (min_x, max_x) = extent(mapped.iter().map(|p| p.x));
    let (min_y, max_y) = extent(mapped.iter().map(|p| p.y));

    let width = (max_x - min_x).ceil();
    let height = (max_y - min_y).ceil();
    debug!(min_x, min_y, max_x, max_y, width, height, "Warped frame bounds");

    let transform = h.then(&Homography::translation(-min_x, -min_y));
    Ok(Canvas {
        transform,
        width: canvas_dimension(width, width, height)?,
        height: canvas_dimension(height, width, height)?,
    })
}

/// Canvas equal to the original frame, with the quadrilateral rectified to an
/// axis-aligned `rect` centred on its own centroid.
pub fn fit_frame(
    quad: &Quadrilateral,
    rect: RectSize,
    source_width: u32,
    source_height: u32,
) -> Result<Canvas> {
    if source_width == 0 || source_height == 0 {
        return Err(RectifyError::DegenerateOutput {
            width: source_width as f64,
            height: source_height as f64,
        });
    }

    let c = quad.centroid();
    let (half_w, half_h) = (rect.width as f64 / 2.0, rect.height as f64 / 2.0);
    let dst = Quadrilateral::rectangle(c.x - half_w, c.y - half_h, c.x + half_w, c.y + half_h);
    let transform = homography::solve(quad, &dst)?;

    Ok(Canvas {
        transform,
        width: source_width,
        height: source_height,
    })
}

/// Canvas holding only the rectified quadrilateral.
pub fn fit_crop(quad: &Quadrilateral, rect: RectSize) -> Result<Canvas> {
    let transform = homography::solve(quad, &origin_rectangle(rect)?)?;
    Ok(Canvas {
        transform,
        width: rect.width,
        height: rect.height,
    })
}

/// Destination corners `(0,0) (w-1,0) (w-1,h-1) (0,h-1)`.
///
/// Needs at least two pixels per side, otherwise the corners are collinear.
pub fn origin_rectangle(rect: RectSize) -> Result<Quadrilateral> {
    if rect.width < 2 || rect.height < 2 {
        return Err(RectifyError::DegenerateOutput {
            width: rect.width as f64,
            height: rect.height as f64,
        });
    }
    Ok(Quadrilateral::rectangle(
        0.0,
        0.0,
        (rect.width - 1) as f64,
        (rect.height - 1) as f64,
    ))
}

/// Pixel-centre corners of a `width` x `height` frame.
fn source_corners(width: u32, height: u32) -> [Point2D; 4] {
    let (right, bottom) = ((width - 1) as f64, (height - 1) as f64);
    *Quadrilateral::rectangle(0.0, 0.0, right, bottom).points()
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn canvas_dimension(value: f64, width: f64, height: f64) -> Result<u32> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RectifyError::DegenerateOutput { width, height });
    }
    if value > u32::MAX as f64 {
        return Err(RectifyError::RasterizationFailed(format!(
            "canvas of {width} x {height} px exceeds the addressable image size"
        )));
    }
    Ok(value as u32)
}
