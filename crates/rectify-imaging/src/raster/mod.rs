// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — perspective resampling and image codec glue.

pub mod codec;
pub mod warp;

pub use warp::Rasterizer;
