// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive correction session.
//
// Holds the loaded photograph, the clicked corner points, the latest
// correction and its scale, and the two measurement points. Every mutation
// invalidates the state that depends on it: a new image drops everything, a
// new correction drops the previous scale and measurement.

use std::path::Path;

use image::RgbImage;
use rectify_core::RectifyConfig;
use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{FitMode, OutputFormat, Point2D, ScaleFactor};
use tracing::{debug, info, instrument, warn};

use crate::measure;
use crate::pipeline::{self, Correction, CorrectionRequest, Sizing};
use crate::raster::codec;

/// Stem used for suggested file names when the image has no name.
const FALLBACK_STEM: &str = "image";

#[derive(Debug, Default)]
pub struct Session {
    config: RectifyConfig,
    original: Option<RgbImage>,
    /// File stem of the loaded image, for output name suggestions.
    name: Option<String>,
    points: Vec<Point2D>,
    correction: Option<Correction>,
    scale: Option<ScaleFactor>,
    measure_points: Vec<Point2D>,
}

impl Session {
    pub fn new(config: RectifyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.config
    }

    /// Load a photograph from disk and start over with it.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let image = codec::load(path.as_ref())?;
        let stem = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_STEM.into());
        self.set_image(image, stem);
        Ok(())
    }

    /// Replace the original image. Clears points, the processed image, the
    /// scale, and the measurement.
    pub fn set_image(&mut self, image: RgbImage, name: impl Into<String>) {
        let name = name.into();
        info!(
            name = %name,
            width = image.width(),
            height = image.height(),
            "New image in session"
        );
        self.original = Some(image);
        self.name = Some(name);
        self.points.clear();
        self.correction = None;
        self.scale = None;
        self.measure_points.clear();
    }

    pub fn original(&self) -> Option<&RgbImage> {
        self.original.as_ref()
    }

    /// The processed image if a correction has been applied, else the
    /// original.
    pub fn current_image(&self) -> Option<&RgbImage> {
        self.correction
            .as_ref()
            .map(|c| &c.image)
            .or(self.original.as_ref())
    }

    pub fn correction(&self) -> Option<&Correction> {
        self.correction.as_ref()
    }

    /// Scale of the latest calibrated correction.
    pub fn scale(&self) -> Option<ScaleFactor> {
        self.scale
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Record a corner click on the original image. Returns its index.
    pub fn add_point(&mut self, point: Point2D) -> Result<usize> {
        let image = self.original.as_ref().ok_or(RectifyError::NoImage)?;
        if self.correction.is_some() {
            return Err(RectifyError::InvalidInput(
                "the image is already corrected; reset the points to start over".into(),
            ));
        }
        if self.points.len() >= 4 {
            return Err(RectifyError::InvalidInput(
                "four points are already selected".into(),
            ));
        }
        ensure_within(image, point)?;

        self.points.push(point);
        debug!(index = self.points.len() - 1, %point, "Corner point added");
        Ok(self.points.len() - 1)
    }

    /// Drop the clicked points and any correction, back to the original.
    pub fn reset_points(&mut self) {
        self.points.clear();
        self.correction = None;
        self.scale = None;
        self.measure_points.clear();
    }

    /// Correct the original image using the four selected points.
    ///
    /// The previous scale is discarded before the pipeline runs, so a failed
    /// correction never leaves a stale calibration behind. On success the
    /// points are consumed.
    #[instrument(skip(self), fields(points = self.points.len()))]
    pub fn apply(&mut self, mode: FitMode, sizing: Sizing) -> Result<&Correction> {
        let original = self.original.as_ref().ok_or(RectifyError::NoImage)?;
        if self.points.len() != 4 {
            return Err(RectifyError::InvalidInput(format!(
                "select exactly 4 points before correcting ({} selected)",
                self.points.len()
            )));
        }

        self.scale = None;
        self.measure_points.clear();

        let request = CorrectionRequest::new(self.points.clone(), mode, sizing);
        let correction = pipeline::correct(original, &request, &self.config)
            .inspect_err(|err| warn!(stage = err.stage(), %err, "Correction failed"))?;

        self.scale = correction.scale();
        self.points.clear();
        if let Some(scale) = self.scale {
            info!(%scale, "Calibration set");
        }
        Ok(&*self.correction.insert(correction))
    }

    /// [`Session::apply`] with the configured default fit mode.
    pub fn apply_default(&mut self, sizing: Sizing) -> Result<&Correction> {
        let mode = self.config.default_fit_mode;
        self.apply(mode, sizing)
    }

    pub fn measure_points(&self) -> &[Point2D] {
        &self.measure_points
    }

    /// Place a measurement point on the current image. A third point starts a
    /// new pair. Returns how many points the current pair holds.
    pub fn add_measure_point(&mut self, point: Point2D) -> Result<usize> {
        let image = self.current_image().ok_or(RectifyError::NoImage)?;
        ensure_within(image, point)?;

        if self.measure_points.len() >= 2 {
            self.measure_points.clear();
        }
        self.measure_points.push(point);
        Ok(self.measure_points.len())
    }

    /// Physical distance between the two measurement points, `None` until
    /// both are placed.
    pub fn measured_distance(&self) -> Result<Option<f64>> {
        let scale = self.scale.as_ref().ok_or(RectifyError::NoCalibration)?;
        match self.measure_points.as_slice() {
            [a, b] => measure::distance(*a, *b, Some(scale)).map(Some),
            _ => Ok(None),
        }
    }

    pub fn reset_measurement(&mut self) {
        self.measure_points.clear();
    }

    /// Write the processed image, format chosen by the path's extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<OutputFormat> {
        let correction = self.correction.as_ref().ok_or_else(|| {
            RectifyError::InvalidInput("no corrected image to save".into())
        })?;
        codec::save(&correction.image, path, self.config.jpeg_quality)
    }

    /// `<stem><suffix>.png` for the loaded image.
    pub fn suggested_output_name(&self) -> String {
        let stem = self.name.as_deref().unwrap_or(FALLBACK_STEM);
        format!("{stem}{}.png", self.config.output_suffix)
    }
}

fn ensure_within(image: &RgbImage, point: Point2D) -> Result<()> {
    let inside = point.is_finite()
        && point.x >= 0.0
        && point.y >= 0.0
        && point.x < image.width() as f64
        && point.y < image.height() as f64;
    if !inside {
        warn!(%point, width = image.width(), height = image.height(), "Point outside image");
        return Err(RectifyError::InvalidInput(format!(
            "point {point} lies outside the {} x {} image",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rectify_core::types::ReferenceDimensions;

    fn photo() -> RgbImage {
        RgbImage::from_fn(200, 150, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]))
    }

    fn session_with_photo() -> Session {
        let mut session = Session::default();
        session.set_image(photo(), "photo");
        session
    }

    fn click_corners(session: &mut Session) {
        for p in [(170.0, 145.0), (25.0, 25.0), (30.0, 140.0), (175.0, 30.0)] {
            session.add_point(Point2D::from(p)).unwrap();
        }
    }

    #[test]
    fn points_require_an_image() {
        let mut session = Session::default();
        assert!(matches!(
            session.add_point(Point2D::new(1.0, 1.0)),
            Err(RectifyError::NoImage)
        ));
        assert!(session.current_image().is_none());
    }

    #[test]
    fn at_most_four_points_inside_the_image() {
        let mut session = session_with_photo();
        assert!(matches!(
            session.add_point(Point2D::new(200.0, 10.0)),
            Err(RectifyError::InvalidInput(_))
        ));
        click_corners(&mut session);
        assert_eq!(session.points().len(), 4);
        assert!(matches!(
            session.add_point(Point2D::new(50.0, 50.0)),
            Err(RectifyError::InvalidInput(_))
        ));
    }

    #[test]
    fn apply_needs_four_points() {
        let mut session = session_with_photo();
        session.add_point(Point2D::new(25.0, 25.0)).unwrap();
        assert!(matches!(
            session.apply(FitMode::CropFit, Sizing::FromQuad),
            Err(RectifyError::InvalidInput(_))
        ));
    }

    #[test]
    fn calibrated_workflow_measures_in_units() {
        let mut session = session_with_photo();
        click_corners(&mut session);

        let correction = session
            .apply(
                FitMode::ContentFit,
                Sizing::Calibrated(ReferenceDimensions::new(4.0, 2.8)),
            )
            .unwrap();
        assert_eq!((correction.plan.rect.width, correction.plan.rect.height), (300, 210));
        assert_eq!(session.scale().unwrap().pixels_per_unit(), 75.0);
        assert!(session.points().is_empty());

        assert_eq!(session.measured_distance().unwrap(), None);
        session.add_measure_point(Point2D::new(10.0, 10.0)).unwrap();
        assert_eq!(session.measured_distance().unwrap(), None);
        assert_eq!(session.add_measure_point(Point2D::new(55.0, 70.0)).unwrap(), 2);
        let d = session.measured_distance().unwrap().unwrap();
        assert!((d - 1.0).abs() < 1e-12);

        // A third click starts a new pair.
        assert_eq!(session.add_measure_point(Point2D::new(1.0, 1.0)).unwrap(), 1);
        assert_eq!(session.measured_distance().unwrap(), None);
    }

    #[test]
    fn geometric_correction_has_no_calibration() {
        let mut session = session_with_photo();
        click_corners(&mut session);
        session.apply(FitMode::CropFit, Sizing::FromQuad).unwrap();
        assert!(session.scale().is_none());
        assert!(matches!(
            session.measured_distance(),
            Err(RectifyError::NoCalibration)
        ));
    }

    #[test]
    fn corrected_image_rejects_new_points_until_reset() {
        let mut session = session_with_photo();
        click_corners(&mut session);
        session
            .apply(
                FitMode::ContentFit,
                Sizing::Calibrated(ReferenceDimensions::new(4.0, 2.8)),
            )
            .unwrap();
        assert_ne!(session.current_image().unwrap().dimensions(), (200, 150));
        assert!(matches!(
            session.add_point(Point2D::new(10.0, 10.0)),
            Err(RectifyError::InvalidInput(_))
        ));

        session.reset_points();
        assert_eq!(session.current_image().unwrap(), &photo());
        assert!(session.scale().is_none());
        assert!(session.add_point(Point2D::new(10.0, 10.0)).is_ok());
    }

    #[test]
    fn new_image_clears_everything() {
        let mut session = session_with_photo();
        click_corners(&mut session);
        session.apply(FitMode::CropFit, Sizing::FromQuad).unwrap();
        session.add_measure_point(Point2D::new(1.0, 1.0)).unwrap();

        session.set_image(RgbImage::new(10, 10), "other");
        assert!(session.points().is_empty());
        assert!(session.correction().is_none());
        assert!(session.measure_points().is_empty());
        assert_eq!(session.current_image().unwrap().dimensions(), (10, 10));
        assert_eq!(session.suggested_output_name(), "other_corrected.png");
    }

    #[test]
    fn load_and_save_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("receipt.png");
        codec::save(&photo(), &input, 95).unwrap();

        let mut session = Session::default();
        session.load_image(&input).unwrap();
        assert_eq!(session.original().unwrap(), &photo());
        assert_eq!(session.suggested_output_name(), "receipt_corrected.png");

        assert!(matches!(
            session.save(dir.path().join("early.png")),
            Err(RectifyError::InvalidInput(_))
        ));

        click_corners(&mut session);
        session.apply(FitMode::CropFit, Sizing::FromQuad).unwrap();
        let output = dir.path().join("receipt_corrected.jpg");
        assert!(matches!(
            session.save(&output).unwrap(),
            OutputFormat::Jpeg { quality: 95 }
        ));
        let saved = codec::load(&output).unwrap();
        assert_eq!(
            saved.dimensions(),
            session.correction().unwrap().image.dimensions()
        );
    }

    #[test]
    fn default_mode_comes_from_config() {
        let config = RectifyConfig {
            default_fit_mode: FitMode::CropFit,
            ..RectifyConfig::default()
        };
        let mut session = Session::new(config);
        session.set_image(photo(), "photo");
        click_corners(&mut session);

        let correction = session.apply_default(Sizing::FromQuad).unwrap();
        let rect = correction.plan.rect;
        assert_eq!(correction.image.dimensions(), (rect.width, rect.height));
    }

    #[test]
    fn custom_suffix_from_config() {
        let config = RectifyConfig {
            output_suffix: "_flat".into(),
            ..RectifyConfig::default()
        };
        let session = Session::new(config);
        assert_eq!(session.suggested_output_name(), "image_flat.png");
    }
}
