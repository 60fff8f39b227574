// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Four-point homography solving and projective point mapping.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use rectify_core::error::{RectifyError, Result};
use rectify_core::types::{Point2D, Quadrilateral};
use std::fmt;
use tracing::{debug, instrument, warn};

/// Triangle area (relative to the squared point spread) below which three
/// points count as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Homogeneous weights this close to zero put a point on the horizon line.
const W_TOLERANCE: f64 = 1e-12;

/// Largest entry of `M * M^-1 - I` accepted from an inversion.
const INVERSE_RESIDUAL_TOLERANCE: f64 = 1e-6;

/// A 3x3 projective transform mapping column vectors `(x, y, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Build from row-major entries.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        let [r0, r1, r2] = rows;
        Self {
            m: Matrix3::new(
                r0[0], r0[1], r0[2], //
                r1[0], r1[1], r1[2], //
                r2[0], r2[1], r2[2],
            ),
        }
    }

    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self { m }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Row-major entries.
    pub fn rows(&self) -> [[f64; 3]; 3] {
        std::array::from_fn(|r| std::array::from_fn(|c| self.m[(r, c)]))
    }

    /// Pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            m: Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0),
        }
    }

    /// The transform that applies `self` first and `next` second.
    pub fn then(&self, next: &Homography) -> Homography {
        Homography::from_matrix(next.m * self.m)
    }

    pub fn determinant(&self) -> f64 {
        self.m.determinant()
    }

    /// Inverse transform, or [`RectifyError::DegenerateTransform`] when the
    /// matrix is singular.
    ///
    /// An inverse whose product with `self` strays from the identity by more
    /// than 1e-6 counts as singular.
    pub fn inverse(&self) -> Result<Homography> {
        let singular = || {
            RectifyError::DegenerateTransform(format!(
                "matrix is singular (determinant {:e})",
                self.determinant()
            ))
        };
        let inv = self.m.try_inverse().ok_or_else(singular)?;
        if inv.iter().any(|v| !v.is_finite()) {
            return Err(singular());
        }
        let residual = (self.m * inv - Matrix3::identity()).amax();
        if !(residual <= INVERSE_RESIDUAL_TOLERANCE) {
            return Err(singular());
        }
        Ok(Homography::from_matrix(inv))
    }

    /// Homogeneous weight of `p` after mapping. Points with weights of
    /// opposite sign lie on opposite sides of the horizon line.
    pub fn weight(&self, p: Point2D) -> f64 {
        self.m[(2, 0)] * p.x + self.m[(2, 1)] * p.y + self.m[(2, 2)]
    }

    /// Map a point, dividing by the homogeneous weight. `None` when the point
    /// lands on the horizon or the result is not finite.
    pub fn apply(&self, p: Point2D) -> Option<Point2D> {
        let h = self.m * Vector3::new(p.x, p.y, 1.0);
        if !h.z.is_finite() || h.z.abs() < W_TOLERANCE {
            return None;
        }
        let mapped = Point2D::new(h.x / h.z, h.y / h.z);
        mapped.is_finite().then_some(mapped)
    }

    /// Rescale so the bottom-right entry is 1, when it is not ~0.
    fn normalized(self) -> Homography {
        let s = self.m[(2, 2)];
        if s.abs() < W_TOLERANCE {
            return self;
        }
        Homography::from_matrix(self.m / s)
    }
}

impl fmt::Display for Homography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.m;
        write!(
            f,
            "[[{:.6}, {:.6}, {:.3}], [{:.6}, {:.6}, {:.3}], [{:.9}, {:.9}, {:.6}]]",
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)]
        )
    }
}

/// Map every point through `h`.
///
/// Fails with [`RectifyError::DegenerateTransform`] if any point lands on the
/// horizon line or maps to a non-finite coordinate.
pub fn apply_to_points(h: &Homography, points: &[Point2D]) -> Result<Vec<Point2D>> {
    points
        .iter()
        .map(|p| {
            h.apply(*p).ok_or_else(|| {
                RectifyError::DegenerateTransform(format!(
                    "point {p} maps to infinity under {h}"
                ))
            })
        })
        .collect()
}

/// Solve the projective transform taking each `src` corner to the `dst`
/// corner at the same index.
///
/// Four correspondences determine the eight degrees of freedom exactly, so
/// this is a direct solve of the 8x8 system (h33 fixed to 1) rather than a
/// least-squares fit. Both point sets are Hartley-normalised first.
///
/// Fails with [`RectifyError::DegenerateTransform`] when three points of
/// either set are collinear or the system is singular.
#[instrument(skip_all, fields(src = %src, dst = %dst))]
pub fn solve(src: &Quadrilateral, dst: &Quadrilateral) -> Result<Homography> {
    ensure_general_position(src, "source")?;
    ensure_general_position(dst, "destination")?;

    let (src_n, t_src) = normalize_points(src.points());
    let (dst_n, t_dst) = normalize_points(dst.points());

    // Rows: [x, y, 1, 0, 0, 0, -x*u, -y*u] = u and
    //       [0, 0, 0, x, y, 1, -x*v, -y*v] = v.
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let (x, y) = (src_n[i].x, src_n[i].y);
        let (u, v) = (dst_n[i].x, dst_n[i].y);
        let (r0, r1) = (2 * i, 2 * i + 1);

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -x * u;
        a[(r0, 7)] = -y * u;
        b[r0] = u;

        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -x * v;
        a[(r1, 7)] = -y * v;
        b[r1] = v;
    }

    let h = a
        .lu()
        .solve(&b)
        .filter(|h| h.iter().all(|v| v.is_finite()))
        .ok_or_else(|| {
            warn!("Homography system is singular");
            RectifyError::DegenerateTransform("the point correspondences are singular".into())
        })?;

    let normalized = Homography::from_matrix(Matrix3::new(
        h[0], h[1], h[2], //
        h[3], h[4], h[5], //
        h[6], h[7], 1.0,
    ));
    normalized.inverse()?;

    // H = T_dst^-1 * Hn * T_src
    let homography = t_src
        .then(&normalized)
        .then(&t_dst.inverse()?)
        .normalized();

    if homography.m.iter().any(|v| !v.is_finite()) {
        return Err(RectifyError::DegenerateTransform(
            "solved matrix has non-finite entries".into(),
        ));
    }

    debug!(%homography, "Homography solved");
    Ok(homography)
}

/// Reject point sets in which any three points are (nearly) collinear.
fn ensure_general_position(quad: &Quadrilateral, which: &str) -> Result<()> {
    let p = quad.points();
    let spread = p
        .iter()
        .flat_map(|a| p.iter().map(move |b| a.distance_to(b)))
        .fold(0.0_f64, f64::max);
    if !spread.is_finite() || spread == 0.0 {
        return Err(RectifyError::DegenerateTransform(format!(
            "{which} points all coincide"
        )));
    }

    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    for [i, j, k] in TRIPLES {
        let (a, b, c) = (p[i], p[j], p[k]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if cross.abs() <= COLLINEAR_TOLERANCE * spread * spread {
            warn!(which, a = %a, b = %b, c = %c, "Collinear points");
            return Err(RectifyError::DegenerateTransform(format!(
                "{which} points {}, {} and {} are collinear",
                i + 1,
                j + 1,
                k + 1
            )));
        }
    }
    Ok(())
}

/// Translate the centroid to the origin and scale the mean distance to
/// sqrt(2). Returns the normalised points and the transform applied.
fn normalize_points(points: &[Point2D; 4]) -> ([Point2D; 4], Homography) {
    let (cx, cy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x / 4.0, sy + p.y / 4.0));
    let mean_dist = points
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Homography::from_matrix(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0));
    let normalized = points.map(|p| Point2D::new(s * (p.x - cx), s * (p.y - cy)));
    (normalized, t)
}
