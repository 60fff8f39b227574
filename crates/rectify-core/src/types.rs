// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Rectify perspective-correction engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RectifyError, Result};

/// A point in source-image pixel space (Y grows downward).
///
/// Points handed to the engine are always in the coordinate space of the
/// originally loaded image, never in a zoomed or panned display space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for Point2D {
    fn from((x, y): (u32, u32)) -> Self {
        Self {
            x: x as f64,
            y: y as f64,
        }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Corner slots of an ordered quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// Corners in quadrilateral index order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short label suitable for click prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
        }
    }
}

/// Exactly four points.
///
/// A quadrilateral built from raw clicks carries no ordering guarantee. One
/// produced by the point orderer (or built with [`Quadrilateral::rectangle`])
/// holds top-left, top-right, bottom-right, bottom-left at indices 0..4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    points: [Point2D; 4],
}

impl Quadrilateral {
    pub const fn new(points: [Point2D; 4]) -> Self {
        Self { points }
    }

    /// Build from a slice, failing unless it holds exactly four finite points.
    pub fn from_slice(points: &[Point2D]) -> Result<Self> {
        let points: [Point2D; 4] = points.try_into().map_err(|_| {
            RectifyError::InvalidInput(format!(
                "expected exactly 4 points, got {}",
                points.len()
            ))
        })?;
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(RectifyError::InvalidInput(format!(
                "point {bad} is not finite"
            )));
        }
        Ok(Self { points })
    }

    /// Axis-aligned rectangle with corners at `(left, top)` and
    /// `(right, bottom)`, in corner order.
    pub fn rectangle(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            points: [
                Point2D::new(left, top),
                Point2D::new(right, top),
                Point2D::new(right, bottom),
                Point2D::new(left, bottom),
            ],
        }
    }

    pub fn points(&self) -> &[Point2D; 4] {
        &self.points
    }

    pub fn corner(&self, corner: Corner) -> Point2D {
        self.points[corner.index()]
    }

    /// Mean of the four points.
    pub fn centroid(&self) -> Point2D {
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2D::new(sx / 4.0, sy / 4.0)
    }
}

impl fmt::Display for Quadrilateral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = &self.points;
        write!(f, "[{a}, {b}, {c}, {d}]")
    }
}

/// Pixels per physical unit, produced by a calibrated correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(pixels_per_unit: f64) -> Result<Self> {
        if !pixels_per_unit.is_finite() || pixels_per_unit <= 0.0 {
            return Err(RectifyError::InvalidInput(format!(
                "scale must be a positive number of pixels per unit, got {pixels_per_unit}"
            )));
        }
        Ok(Self(pixels_per_unit))
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.0
    }

    /// Convert a pixel length to physical units.
    pub fn to_units(&self, pixels: f64) -> f64 {
        pixels / self.0
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} px/unit", self.0)
    }
}

/// Physical size of the reference object outlined by the four points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDimensions {
    pub width_units: f64,
    pub height_units: f64,
}

impl ReferenceDimensions {
    pub const fn new(width_units: f64, height_units: f64) -> Self {
        Self {
            width_units,
            height_units,
        }
    }
}

/// How the output canvas is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMode {
    /// Canvas sized to hold the whole warped source image.
    ContentFit,
    /// Canvas equal to the original frame, rectangle centred on the quad.
    FrameFit,
    /// Canvas equal to the rectified quadrilateral only.
    CropFit,
}

impl FitMode {
    /// Fill used when neither the request nor the settings choose one.
    pub fn default_fill(self, calibrated: bool) -> FillPolicy {
        match (self, calibrated) {
            (Self::ContentFit, true) | (Self::FrameFit, _) => FillPolicy::EdgeReplicate,
            (Self::ContentFit, false) | (Self::CropFit, _) => FillPolicy::black(),
        }
    }
}

/// What to sample for destination pixels that map outside the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Repeat the nearest source edge pixel.
    EdgeReplicate,
    /// Use a fixed RGB colour.
    Constant([u8; 3]),
}

impl FillPolicy {
    pub const fn black() -> Self {
        Self::Constant([0, 0, 0])
    }
}

/// Resampling quality. Only high-quality interpolation is offered since the
/// output is used for measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    High,
}

/// Whether the four points are reordered before solving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointOrdering {
    /// Sort into corner order with the sum/difference heuristic.
    #[default]
    Heuristic,
    /// Trust the caller's order (top-left, top-right, bottom-right, bottom-left).
    AsClicked,
}

/// Encodings supported when saving a corrected image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str, jpeg_quality: u8) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" | "jfif" => Some(Self::Jpeg {
                quality: jpeg_quality,
            }),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrilateral_from_slice_requires_four_points() {
        let three = [Point2D::new(0.0, 0.0); 3];
        assert!(matches!(
            Quadrilateral::from_slice(&three),
            Err(RectifyError::InvalidInput(_))
        ));

        let four = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ];
        let quad = Quadrilateral::from_slice(&four).expect("four points");
        assert_eq!(quad.corner(Corner::BottomRight), Point2D::new(1.0, 1.0));
    }

    #[test]
    fn quadrilateral_rejects_nan() {
        let pts = [
            Point2D::new(0.0, 0.0),
            Point2D::new(f64::NAN, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ];
        assert!(Quadrilateral::from_slice(&pts).is_err());
    }

    #[test]
    fn centroid_of_rectangle() {
        let quad = Quadrilateral::rectangle(10.0, 20.0, 30.0, 60.0);
        assert_eq!(quad.centroid(), Point2D::new(20.0, 40.0));
    }

    #[test]
    fn scale_factor_must_be_positive() {
        assert!(ScaleFactor::new(0.0).is_err());
        assert!(ScaleFactor::new(-3.0).is_err());
        assert!(ScaleFactor::new(f64::INFINITY).is_err());
        let scale = ScaleFactor::new(75.0).unwrap();
        assert!((scale.to_units(750.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn default_fill_per_mode() {
        assert_eq!(FitMode::ContentFit.default_fill(true), FillPolicy::EdgeReplicate);
        assert_eq!(FitMode::ContentFit.default_fill(false), FillPolicy::black());
        assert_eq!(FitMode::FrameFit.default_fill(false), FillPolicy::EdgeReplicate);
        assert_eq!(FitMode::CropFit.default_fill(true), FillPolicy::black());
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(OutputFormat::from_extension("PNG", 90), Some(OutputFormat::Png));
        assert_eq!(
            OutputFormat::from_extension("jfif", 80),
            Some(OutputFormat::Jpeg { quality: 80 })
        );
        assert_eq!(OutputFormat::from_extension("tif", 90), Some(OutputFormat::Tiff));
        assert_eq!(OutputFormat::from_extension("gif", 90), None);
        assert_eq!(
            OutputFormat::from_extension("jpeg", 90).map(|f| f.mime_type()),
            Some("image/jpeg")
        );
    }

    #[test]
    fn corner_index_round_trip() {
        for corner in Corner::ALL {
            assert_eq!(Corner::from_index(corner.index()), Some(corner));
        }
        assert_eq!(Corner::from_index(4), None);
    }
}
