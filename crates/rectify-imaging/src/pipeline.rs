// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Correction pipeline — order points, size the target rectangle, solve the
// homography, fit the canvas, and resample.

use image::RgbImage;
use rectify_core::RectifyConfig;
use rectify_core::error::Result;
use rectify_core::types::{
    FillPolicy, FitMode, Point2D, PointOrdering, Quadrilateral, ReferenceDimensions, ScaleFactor,
};
use tracing::{debug, info, instrument};

use crate::geometry::{Canvas, RectSize, canvas, metrics, order, scale};
use crate::raster::Rasterizer;

/// Where the rectified rectangle's pixel size comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Longest parallel edges of the quadrilateral itself.
    FromQuad,
    /// Physical size of the outlined reference object; yields a scale.
    Calibrated(ReferenceDimensions),
}

/// One correction: four points plus how to treat them.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRequest {
    /// Points in original-image pixel space.
    pub points: Vec<Point2D>,
    pub mode: FitMode,
    pub sizing: Sizing,
    /// Overrides both the settings and the per-mode default.
    pub fill: Option<FillPolicy>,
    /// Overrides the settings.
    pub ordering: Option<PointOrdering>,
}

impl CorrectionRequest {
    pub fn new(points: impl Into<Vec<Point2D>>, mode: FitMode, sizing: Sizing) -> Self {
        Self {
            points: points.into(),
            mode,
            sizing,
            fill: None,
            ordering: None,
        }
    }

    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_ordering(mut self, ordering: PointOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }
}

/// Everything about a correction except the pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionPlan {
    /// The four points in corner order.
    pub quad: Quadrilateral,
    /// Pixel size the quadrilateral is rectified to.
    pub rect: RectSize,
    pub canvas: Canvas,
    pub fill: FillPolicy,
    /// Present only for calibrated sizing.
    pub scale: Option<ScaleFactor>,
}

/// A finished correction.
#[derive(Debug, Clone)]
pub struct Correction {
    pub image: RgbImage,
    pub plan: CorrectionPlan,
}

impl Correction {
    pub fn scale(&self) -> Option<ScaleFactor> {
        self.plan.scale
    }
}

/// Compute the geometry of a correction for a `source_width` x
/// `source_height` image without touching any pixels.
#[instrument(skip_all, fields(mode = ?request.mode, sizing = ?request.sizing))]
pub fn plan(
    request: &CorrectionRequest,
    source_width: u32,
    source_height: u32,
    config: &RectifyConfig,
) -> Result<CorrectionPlan> {
    config.validate()?;

    let clicked = Quadrilateral::from_slice(&request.points)?;
    let quad = match request.ordering.unwrap_or(config.point_ordering) {
        PointOrdering::Heuristic => order::order_points(&clicked)?,
        PointOrdering::AsClicked => clicked,
    };

    let (rect, scale) = match request.sizing {
        Sizing::FromQuad => (metrics::measure(&quad)?, None),
        Sizing::Calibrated(reference) => {
            let calibration = scale::resolve(
                &reference,
                config.max_reference_edge_px,
                config.preferred_density,
            )?;
            (calibration.rect, Some(calibration.scale))
        }
    };
    debug!(width = rect.width, height = rect.height, calibrated = scale.is_some(), "Target rectangle");

    let canvas = canvas::fit(request.mode, &quad, rect, source_width, source_height)?;
    let fill = request
        .fill
        .or(config.fill_policy)
        .unwrap_or_else(|| request.mode.default_fill(scale.is_some()));

    Ok(CorrectionPlan {
        quad,
        rect,
        canvas,
        fill,
        scale,
    })
}

/// Run the full correction on `source`, returning a new raster.
///
/// The source is only read. Each call is independent: nothing is cached
/// between invocations.
#[instrument(skip_all, fields(
    src_w = source.width(),
    src_h = source.height(),
    mode = ?request.mode,
))]
pub fn correct(
    source: &RgbImage,
    request: &CorrectionRequest,
    config: &RectifyConfig,
) -> Result<Correction> {
    let plan = plan(request, source.width(), source.height(), config)?;
    let image = Rasterizer::from_config(config).warp(
        source,
        &plan.canvas.transform,
        plan.canvas.width,
        plan.canvas.height,
        plan.fill,
    )?;

    info!(
        out_w = image.width(),
        out_h = image.height(),
        scale = plan.scale.map(|s| s.pixels_per_unit()),
        "Correction complete"
    );
    Ok(Correction { image, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::homography;
    use crate::measure;
    use image::Rgb;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;
    use rectify_core::error::RectifyError;

    fn clicks() -> Vec<Point2D> {
        // Deliberately not in corner order.
        [(680.0, 580.0), (120.0, 560.0), (100.0, 100.0), (700.0, 120.0)]
            .map(Point2D::from)
            .to_vec()
    }

    /// Gray frame with the clicked quadrilateral painted red.
    fn painted_source(width: u32, height: u32, quad: &[(i32, i32)]) -> RgbImage {
        let mut img = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
        let poly: Vec<Point<i32>> = quad.iter().map(|&(x, y)| Point::new(x, y)).collect();
        draw_polygon_mut(&mut img, &poly, Rgb([255, 0, 0]));
        img
    }

    fn is_red(pixel: &Rgb<u8>) -> bool {
        let [r, g, b] = pixel.0;
        r >= 250 && g <= 5 && b <= 5
    }

    #[test]
    fn calibrated_example_end_to_end() {
        let config = RectifyConfig::default();
        let request = CorrectionRequest::new(
            clicks(),
            FitMode::ContentFit,
            Sizing::Calibrated(ReferenceDimensions::new(10.0, 7.0)),
        );

        let plan = plan(&request, 800, 600, &config).unwrap();
        assert_eq!(
            plan.quad,
            Quadrilateral::new(
                [(100.0, 100.0), (700.0, 120.0), (680.0, 580.0), (120.0, 560.0)]
                    .map(Point2D::from)
            )
        );
        assert_eq!(plan.rect, RectSize::new(750, 525));
        assert_eq!(plan.scale.unwrap().pixels_per_unit(), 75.0);
        assert_eq!(plan.fill, FillPolicy::EdgeReplicate);

        let d = measure::distance(
            Point2D::new(0.0, 0.0),
            Point2D::new(750.0, 0.0),
            plan.scale.as_ref(),
        )
        .unwrap();
        assert!((d - 10.0).abs() < 1e-12);
    }

    #[test]
    fn calibrated_content_fit_preserves_reference_size() {
        let config = RectifyConfig::default();
        let request = CorrectionRequest::new(
            clicks(),
            FitMode::ContentFit,
            Sizing::Calibrated(ReferenceDimensions::new(10.0, 7.0)),
        );
        let plan = plan(&request, 800, 600, &config).unwrap();

        // The reference's top edge is 749 px long after correction: (w - 1)
        // pixel centres span the 750-pixel rectangle.
        let mapped = homography::apply_to_points(&plan.canvas.transform, plan.quad.points()).unwrap();
        let top = mapped[0].distance_to(&mapped[1]);
        let left = mapped[0].distance_to(&mapped[3]);
        assert!((top - 749.0).abs() < 1e-6);
        assert!((left - 524.0).abs() < 1e-6);
    }

    #[test]
    fn crop_fit_maps_quad_onto_rectangle() {
        let config = RectifyConfig::default();
        let request = CorrectionRequest::new(clicks(), FitMode::CropFit, Sizing::FromQuad);
        let plan = plan(&request, 800, 600, &config).unwrap();

        assert_eq!((plan.canvas.width, plan.canvas.height), (plan.rect.width, plan.rect.height));
        let (w, h) = ((plan.rect.width - 1) as f64, (plan.rect.height - 1) as f64);
        let expected = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let mapped = homography::apply_to_points(&plan.canvas.transform, plan.quad.points()).unwrap();
        for (m, (ex, ey)) in mapped.iter().zip(expected) {
            assert!((m.x - ex).abs() < 1e-6 && (m.y - ey).abs() < 1e-6, "{m}");
        }
        assert_eq!(plan.fill, FillPolicy::black());
        assert!(plan.scale.is_none());
    }

    #[test]
    fn crop_fit_extracts_the_quadrilateral_content() {
        let corners = [(40, 30), (260, 45), (250, 200), (30, 185)];
        let source = painted_source(300, 240, &corners);
        let points: Vec<Point2D> = corners
            .iter()
            .map(|&(x, y)| Point2D::new(x as f64, y as f64))
            .collect();

        let request = CorrectionRequest::new(points, FitMode::CropFit, Sizing::FromQuad);
        let correction = correct(&source, &request, &RectifyConfig::default()).unwrap();

        let (w, h) = correction.image.dimensions();
        assert_eq!((w, h), (correction.plan.rect.width, correction.plan.rect.height));
        for (x, y) in [(w / 2, h / 2), (w / 4, h / 4), (3 * w / 4, 3 * h / 4)] {
            assert!(is_red(correction.image.get_pixel(x, y)), "({x}, {y})");
        }
    }

    #[test]
    fn frame_fit_keeps_source_dimensions() {
        let corners = [(40, 30), (260, 45), (250, 200), (30, 185)];
        let source = painted_source(300, 240, &corners);
        let points: Vec<Point2D> = corners
            .iter()
            .map(|&(x, y)| Point2D::new(x as f64, y as f64))
            .collect();

        let request = CorrectionRequest::new(points, FitMode::FrameFit, Sizing::FromQuad);
        let correction = correct(&source, &request, &RectifyConfig::default()).unwrap();
        assert_eq!(correction.image.dimensions(), (300, 240));

        let c = correction.plan.quad.centroid();
        assert!(is_red(
            correction.image.get_pixel(c.x.round() as u32, c.y.round() as u32)
        ));
    }

    #[test]
    fn content_fit_output_holds_the_whole_frame() {
        let corners = [(40, 30), (260, 45), (250, 200), (30, 185)];
        let source = painted_source(300, 240, &corners);
        let points: Vec<Point2D> = corners
            .iter()
            .map(|&(x, y)| Point2D::new(x as f64, y as f64))
            .collect();

        let request = CorrectionRequest::new(points, FitMode::ContentFit, Sizing::FromQuad);
        let correction = correct(&source, &request, &RectifyConfig::default()).unwrap();
        let canvas = correction.plan.canvas;
        assert_eq!(correction.image.dimensions(), (canvas.width, canvas.height));
        assert_eq!(correction.plan.fill, FillPolicy::black());

        let frame = [(0.0, 0.0), (299.0, 0.0), (299.0, 239.0), (0.0, 239.0)].map(Point2D::from);
        for p in homography::apply_to_points(&canvas.transform, &frame).unwrap() {
            assert!(p.x > -1e-6 && p.x <= canvas.width as f64 + 1.0);
            assert!(p.y > -1e-6 && p.y <= canvas.height as f64 + 1.0);
        }
    }

    #[test]
    fn as_clicked_ordering_is_respected() {
        // Clicked clockwise starting top-right: heuristic ordering fixes it,
        // as-clicked ordering keeps it and rotates the output.
        let rotated = [(700.0, 120.0), (680.0, 580.0), (120.0, 560.0), (100.0, 100.0)]
            .map(Point2D::from)
            .to_vec();
        let config = RectifyConfig::default();

        let heuristic = plan(
            &CorrectionRequest::new(rotated.clone(), FitMode::CropFit, Sizing::FromQuad),
            800,
            600,
            &config,
        )
        .unwrap();
        assert_eq!(heuristic.quad.points()[0], Point2D::new(100.0, 100.0));

        let as_clicked = plan(
            &CorrectionRequest::new(rotated, FitMode::CropFit, Sizing::FromQuad)
                .with_ordering(PointOrdering::AsClicked),
            800,
            600,
            &config,
        )
        .unwrap();
        assert_eq!(as_clicked.quad.points()[0], Point2D::new(700.0, 120.0));
        assert!(as_clicked.rect.height > as_clicked.rect.width);
    }

    #[test]
    fn fill_override_precedence() {
        let request = CorrectionRequest::new(clicks(), FitMode::CropFit, Sizing::FromQuad);
        let config = RectifyConfig {
            fill_policy: Some(FillPolicy::EdgeReplicate),
            ..RectifyConfig::default()
        };
        assert_eq!(plan(&request, 800, 600, &config).unwrap().fill, FillPolicy::EdgeReplicate);

        let white = FillPolicy::Constant([255, 255, 255]);
        let request = request.with_fill(white);
        assert_eq!(plan(&request, 800, 600, &config).unwrap().fill, white);
    }

    #[test]
    fn wrong_point_count_is_invalid_input() {
        let request = CorrectionRequest::new(
            clicks()[..3].to_vec(),
            FitMode::CropFit,
            Sizing::FromQuad,
        );
        assert!(matches!(
            plan(&request, 800, 600, &RectifyConfig::default()),
            Err(RectifyError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_positive_reference_is_invalid_input() {
        let request = CorrectionRequest::new(
            clicks(),
            FitMode::ContentFit,
            Sizing::Calibrated(ReferenceDimensions::new(0.0, 7.0)),
        );
        assert!(matches!(
            plan(&request, 800, 600, &RectifyConfig::default()),
            Err(RectifyError::InvalidInput(_))
        ));
    }

    #[test]
    fn collinear_clicks_never_reach_the_rasterizer() {
        let points = [(0.0, 0.0), (10.0, 5.0), (20.0, 10.0), (30.0, 16.0)]
            .map(Point2D::from)
            .to_vec();
        let source = RgbImage::new(64, 64);
        let request = CorrectionRequest::new(points, FitMode::CropFit, Sizing::FromQuad)
            .with_ordering(PointOrdering::AsClicked);
        assert!(matches!(
            correct(&source, &request, &RectifyConfig::default()),
            Err(RectifyError::DegenerateTransform(_))
        ));
    }

    #[test]
    fn results_can_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Correction>();
        assert_send_sync::<CorrectionPlan>();
        assert_send_sync::<CorrectionRequest>();
        assert_send_sync::<Canvas>();
        assert_send_sync::<crate::geometry::Homography>();
        assert_send_sync::<crate::session::Session>();
        assert_send_sync::<RectifyError>();
    }
}
