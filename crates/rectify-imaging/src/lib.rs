// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rectify-imaging — Perspective correction and planar measurement.
//
// Orders four clicked corners, sizes the target rectangle (from the quad
// itself or from a calibrated reference object), solves the homography, picks
// the output canvas, and resamples the photograph. A calibrated correction
// yields a scale for measuring physical distances on the result.

pub mod geometry;
pub mod measure;
pub mod pipeline;
pub mod raster;
pub mod session;

// Re-export the primary entry points so callers can use `rectify_imaging::correct` etc.
pub use geometry::{Canvas, Homography, RectSize};
pub use pipeline::{Correction, CorrectionPlan, CorrectionRequest, Sizing, correct, plan};
pub use raster::Rasterizer;
pub use session::Session;
