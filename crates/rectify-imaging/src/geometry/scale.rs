// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel density for calibrated corrections.

use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{ReferenceDimensions, ScaleFactor};
use tracing::{debug, instrument};

use super::metrics::RectSize;

/// Result of resolving a calibrated density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Pixels per physical unit in the corrected image.
    pub scale: ScaleFactor,
    /// Pixel size of the reference rectangle at that density.
    pub rect: RectSize,
}

/// Resolve the pixels-per-unit density for a reference object.
///
/// Starts from `preferred_density` and lowers it until neither edge of the
/// reference rectangle exceeds `max_pixels_per_edge`:
///
/// `density = min(preferred, max / width_units, max / height_units)`
///
/// The rectangle is then `round(width_units * density)` by
/// `round(height_units * density)` pixels, at least 1 in each direction.
#[instrument(skip_all, fields(
    width_units = reference.width_units,
    height_units = reference.height_units,
))]
pub fn resolve(
    reference: &ReferenceDimensions,
    max_pixels_per_edge: f64,
    preferred_density: f64,
) -> Result<Calibration> {
    let ReferenceDimensions {
        width_units,
        height_units,
    } = *reference;

    for (name, value) in [
        ("reference width", width_units),
        ("reference height", height_units),
        ("maximum reference edge", max_pixels_per_edge),
        ("preferred density", preferred_density),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(RectifyError::InvalidInput(format!(
                "{name} must be a positive number, got {value}"
            )));
        }
    }

    let density = preferred_density
        .min(max_pixels_per_edge / width_units)
        .min(max_pixels_per_edge / height_units);

    let rect = RectSize::new(
        to_pixels(width_units * density)?,
        to_pixels(height_units * density)?,
    );
    let scale = ScaleFactor::new(density)?;

    debug!(
        density,
        rect_width = rect.width,
        rect_height = rect.height,
        "Calibrated density resolved"
    );
    Ok(Calibration { scale, rect })
}

fn to_pixels(length: f64) -> Result<u32> {
    let rounded = length.round();
    if rounded > u32::MAX as f64 {
        return Err(RectifyError::RasterizationFailed(format!(
            "a {rounded} px reference edge exceeds the addressable image size"
        )));
    }
    Ok((rounded as u32).max(1))
}
