// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry module — corner ordering, quad metrics, calibrated density,
// homography solving, and canvas fitting.

pub mod canvas;
pub mod homography;
pub mod metrics;
pub mod order;
pub mod scale;

pub use canvas::Canvas;
pub use homography::Homography;
pub use metrics::{EdgeLengths, RectSize};
pub use scale::Calibration;
