// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Rectify.

use thiserror::Error;

/// Top-level error type for all Rectify operations.
///
/// Every variant is a precondition or postcondition failure detected locally.
/// Nothing is retried internally; the caller's remedy is new input.
#[derive(Debug, Error)]
pub enum RectifyError {
    // -- Input --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no image loaded")]
    NoImage,

    // -- Geometry --
    #[error("invalid point geometry: {0}")]
    InvalidGeometry(String),

    #[error("degenerate quadrilateral: edges measure {width:.3} x {height:.3} px")]
    DegenerateQuad { width: f64, height: f64 },

    #[error("degenerate transform: {0}")]
    DegenerateTransform(String),

    #[error("degenerate output canvas: {width} x {height} px")]
    DegenerateOutput { width: f64, height: f64 },

    // -- Raster --
    #[error("rasterization failed: {0}")]
    RasterizationFailed(String),

    #[error("image decoding failed: {0}")]
    Decode(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    // -- Measurement --
    #[error("no calibration: apply a calibrated correction before measuring")]
    NoCalibration,

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RectifyError {
    /// The pipeline stage that raised this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::NoImage => "input",
            Self::InvalidGeometry(_) => "point ordering",
            Self::DegenerateQuad { .. } => "quad metrics",
            Self::DegenerateTransform(_) => "homography",
            Self::DegenerateOutput { .. } => "canvas fitting",
            Self::RasterizationFailed(_) => "rasterization",
            Self::Decode(_) | Self::Encode(_) | Self::Io(_) => "image i/o",
            Self::NoCalibration => "measurement",
            Self::Serialization(_) => "settings",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RectifyError>;
