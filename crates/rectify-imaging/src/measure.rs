// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Physical distance measurement on a calibrated, corrected image.

use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{Point2D, ScaleFactor};

/// Physical distance between two points of the corrected image.
///
/// Points are in the corrected raster's pixel space. Fails with
/// [`RectifyError::NoCalibration`] when no scale is available.
pub fn distance(a: Point2D, b: Point2D, scale: Option<&ScaleFactor>) -> Result<f64> {
    let scale = scale.ok_or(RectifyError::NoCalibration)?;
    Ok(scale.to_units(a.distance_to(&b)))
}
