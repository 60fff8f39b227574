// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective resampling — a thin adapter over imageproc's warp.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};
use rectify_core::RectifyConfig;
use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{FillPolicy, Quality};
use tracing::{debug, info, instrument};

use crate::geometry::Homography;

/// Border added around the source before warping. Bicubic sampling reads a
/// 4x4 neighbourhood and imageproc returns the default pixel for any
/// neighbourhood that leaves the image, so the source is padded according to
/// the fill policy and the mapping shifted to match.
const PAD: u32 = 3;

/// Resamples a source raster through a homography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rasterizer {
    pub quality: Quality,
    /// Largest canvas, in pixels, this rasterizer will allocate.
    pub max_output_pixels: u64,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::from_config(&RectifyConfig::default())
    }
}

impl Rasterizer {
    pub fn from_config(config: &RectifyConfig) -> Self {
        Self {
            quality: Quality::High,
            max_output_pixels: config.max_output_pixels,
        }
    }

    /// Warp `source` into a new `width` x `height` raster.
    ///
    /// `transform` maps source pixels to output pixels; each output pixel is
    /// sampled at its inverse image. Pixels whose inverse falls outside the
    /// source follow `fill`. The source is never modified.
    #[instrument(skip(self, source, transform), fields(
        src_w = source.width(),
        src_h = source.height(),
    ))]
    pub fn warp(
        &self,
        source: &RgbImage,
        transform: &Homography,
        width: u32,
        height: u32,
        fill: FillPolicy,
    ) -> Result<RgbImage> {
        if source.width() == 0 || source.height() == 0 {
            return Err(RectifyError::InvalidInput("source image is empty".into()));
        }
        if width == 0 || height == 0 {
            return Err(RectifyError::DegenerateOutput {
                width: width as f64,
                height: height as f64,
            });
        }
        let pixels = width as u64 * height as u64;
        if pixels > self.max_output_pixels {
            return Err(RectifyError::RasterizationFailed(format!(
                "a {width} x {height} canvas ({pixels} px) exceeds the limit of {} px",
                self.max_output_pixels
            )));
        }
        let bytes = usize::try_from(pixels)
            .ok()
            .and_then(|p| p.checked_mul(3))
            .ok_or_else(|| {
                RectifyError::RasterizationFailed(format!(
                    "a {width} x {height} canvas does not fit in memory"
                ))
            })?;

        let inverse = transform.inverse()?;
        let padded = pad(source, fill);
        let default = match fill {
            FillPolicy::EdgeReplicate => Rgb([0, 0, 0]),
            FillPolicy::Constant(rgb) => Rgb(rgb),
        };

        let max_x = (source.width() - 1) as f64;
        let max_y = (source.height() - 1) as f64;
        let offset = PAD as f64;
        let replicate = matches!(fill, FillPolicy::EdgeReplicate);

        // Out-of-range sentinel; lands outside the padded source.
        let outside = (-(PAD as f32) - 10.0, -(PAD as f32) - 10.0);

        let mapping = move |x: f32, y: f32| -> (f32, f32) {
            let Some(p) = inverse.apply((x as f64, y as f64).into()) else {
                return outside;
            };
            let (sx, sy) = if replicate {
                (p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
            } else {
                (p.x, p.y)
            };
            let (px, py) = ((sx + offset) as f32, (sy + offset) as f32);
            if px.is_finite() && py.is_finite() {
                (px, py)
            } else {
                outside
            }
        };

        debug!(width, height, bytes, ?fill, "Allocating output canvas");
        let mut output = RgbImage::new(width, height);
        warp_into_with(&padded, mapping, interpolation(self.quality), default, &mut output);

        info!(width, height, "Perspective warp complete");
        Ok(output)
    }
}

fn interpolation(quality: Quality) -> Interpolation {
    match quality {
        Quality::High => Interpolation::Bicubic,
    }
}

/// Copy of `source` with a `PAD`-pixel border filled per `fill`.
fn pad(source: &RgbImage, fill: FillPolicy) -> RgbImage {
    let (w, h) = source.dimensions();
    let max_x = w as i64 - 1;
    let max_y = h as i64 - 1;
    RgbImage::from_fn(w + 2 * PAD, h + 2 * PAD, |x, y| {
        let sx = x as i64 - PAD as i64;
        let sy = y as i64 - PAD as i64;
        let inside = (0..=max_x).contains(&sx) && (0..=max_y).contains(&sy);
        match fill {
            _ if inside => *source.get_pixel(sx as u32, sy as u32),
            FillPolicy::EdgeReplicate => {
                *source.get_pixel(sx.clamp(0, max_x) as u32, sy.clamp(0, max_y) as u32)
            }
            FillPolicy::Constant(rgb) => Rgb(rgb),
        }
    })
}
