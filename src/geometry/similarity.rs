//! Closed-form least-squares fitting of 2D similarity transforms.
//!
//! A similarity transform is written in complex form as `z ↦ τ + z·σ` with
//! `τ = tx + i·ty` and `σ = sc + i·ss`, where `sc = s·cos θ` and `ss = s·sin θ`.
//! The model is linear in `(tx, ty, sc, ss)`, so minimizing
//! `Σ |T(aᵢ) − bᵢ|²` reduces to a 4×4 normal-equation system whose solution can
//! be written directly in terms of seven sums over the correspondences.
//!
//! The approach follows Chang et al., "Fast algorithm for point pattern
//! matching: invariant to translations, rotations and scale changes",
//! Pattern Recognition 30.2 (1997).

use super::point::Point;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Relative threshold below which `det / (k · Σ|aᵢ|²)` counts as zero spread.
pub const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Which input a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceRole {
    Source,
    Target,
    Parameters,
}

impl fmt::Display for SequenceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceRole::Source => write!(f, "source points"),
            SequenceRole::Target => write!(f, "target points"),
            SequenceRole::Parameters => write!(f, "transform parameters"),
        }
    }
}

/// Errors raised by the estimator, the scorer and the parameter constructors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("point sequences differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("non-finite value in {sequence} at index {index}")]
    NonFinite { sequence: SequenceRole, index: usize },

    #[error("degenerate input: at least 2 correspondences required, got {count}")]
    TooFewPoints { count: usize },

    #[error("degenerate input: source points have no spread around their centroid (det = {det:e})")]
    ZeroSpread { det: f64 },

    #[error("degenerate input: fitted linear map collapsed to zero scale")]
    CollapsedScale,

    #[error("normal-equation sums overflowed; coordinates are too large to fit")]
    Overflow,

    #[error("invalid similarity parameters: {0}")]
    InvalidParameters(String),
}

impl SimilarityError {
    /// True for failures caused by the geometry of the input rather than its shape.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            SimilarityError::TooFewPoints { .. }
                | SimilarityError::ZeroSpread { .. }
                | SimilarityError::CollapsedScale
        )
    }
}

/// Parameters of `z ↦ (tx + i·ty) + z·(sc + i·ss)`.
///
/// Every value has finite components and a nonzero scale; the constructors and
/// [`estimate`] are the only ways to build one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterFields", into = "ParameterFields")]
pub struct SimilarityParameters {
    tx: f64,
    ty: f64,
    sc: f64,
    ss: f64,
}

#[derive(Serialize, Deserialize)]
struct ParameterFields {
    tx: f64,
    ty: f64,
    sc: f64,
    ss: f64,
}

impl TryFrom<ParameterFields> for SimilarityParameters {
    type Error = SimilarityError;

    fn try_from(f: ParameterFields) -> Result<Self, Self::Error> {
        Self::new(f.tx, f.ty, f.sc, f.ss)
    }
}

impl From<SimilarityParameters> for ParameterFields {
    fn from(p: SimilarityParameters) -> Self {
        Self {
            tx: p.tx,
            ty: p.ty,
            sc: p.sc,
            ss: p.ss,
        }
    }
}

impl SimilarityParameters {
    /// Build parameters from the raw encoding, rejecting non-finite values and zero scale.
    pub fn new(tx: f64, ty: f64, sc: f64, ss: f64) -> Result<Self, SimilarityError> {
        if let Some(index) = [tx, ty, sc, ss].iter().position(|v| !v.is_finite()) {
            return Err(SimilarityError::NonFinite {
                sequence: SequenceRole::Parameters,
                index,
            });
        }
        if sc == 0.0 && ss == 0.0 {
            return Err(SimilarityError::InvalidParameters(
                "scale must be nonzero".to_string(),
            ));
        }
        Ok(Self { tx, ty, sc, ss })
    }

    /// Build parameters from a translation, a scale factor and a rotation in degrees.
    pub fn from_scale_rotation(
        tx: f64,
        ty: f64,
        scale: f64,
        rotation_degrees: f64,
    ) -> Result<Self, SimilarityError> {
        let theta = rotation_degrees.to_radians();
        Self::new(tx, ty, scale * theta.cos(), scale * theta.sin())
    }

    pub fn identity() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            sc: 1.0,
            ss: 0.0,
        }
    }

    pub fn translation_x(&self) -> f64 {
        self.tx
    }

    pub fn translation_y(&self) -> f64 {
        self.ty
    }

    /// `scale · cos θ`
    pub fn cos_scaled(&self) -> f64 {
        self.sc
    }

    /// `scale · sin θ`
    pub fn sin_scaled(&self) -> f64 {
        self.ss
    }

    /// Uniform scale factor `√(sc² + ss²)`, never zero.
    pub fn scale(&self) -> f64 {
        self.sc.hypot(self.ss)
    }

    /// Rotation magnitude in degrees, in `[0, 180]`.
    ///
    /// Computed as `acos(sc / scale)`, which cannot tell a clockwise rotation
    /// from a counter-clockwise one: `+θ` and `−θ` both report `|θ|`. Kept for
    /// callers that compare against values produced that way; use
    /// [`signed_rotation_degrees`](Self::signed_rotation_degrees) otherwise.
    pub fn rotation_degrees(&self) -> f64 {
        (self.sc / self.scale()).clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Signed rotation in degrees, in `(-180, 180]`, counter-clockwise positive
    /// in a y-up frame.
    pub fn signed_rotation_degrees(&self) -> f64 {
        self.ss.atan2(self.sc).to_degrees()
    }

    pub fn translation(&self) -> Complex64 {
        Complex64::new(self.tx, self.ty)
    }

    /// The combined rotation and scale as a complex multiplier.
    pub fn linear(&self) -> Complex64 {
        Complex64::new(self.sc, self.ss)
    }

    /// Map a single point.
    pub fn transform(&self, point: Point) -> Point {
        Point::from(self.translation() + point.to_complex() * self.linear())
    }
}

impl Default for SimilarityParameters {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for SimilarityParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx={:.4}, ty={:.4}, scale={:.4}, rotation={:.2}°",
            self.tx,
            self.ty,
            self.scale(),
            self.signed_rotation_degrees()
        )
    }
}

/// Sums over the correspondences that the closed-form solution is built from.
#[derive(Debug, Default)]
struct Aggregates {
    k: f64,
    sum_xa: f64,
    sum_ya: f64,
    sum_xb: f64,
    sum_yb: f64,
    dot: f64,
    cross: f64,
    sq_a: f64,
}

impl Aggregates {
    fn accumulate(source: &[Point], target: &[Point]) -> Self {
        let mut s = Aggregates {
            k: source.len() as f64,
            ..Default::default()
        };
        for (a, b) in source.iter().zip(target) {
            s.sum_xa += a.x;
            s.sum_ya += a.y;
            s.sum_xb += b.x;
            s.sum_yb += b.y;
            s.dot += a.x * b.x + a.y * b.y;
            s.cross += a.x * b.y - a.y * b.x;
            s.sq_a += a.x * a.x + a.y * a.y;
        }
        s
    }

    /// `k` times the summed squared distance of the source points from their centroid.
    fn det(&self) -> f64 {
        self.k * self.sq_a - self.sum_xa * self.sum_xa - self.sum_ya * self.sum_ya
    }
}

fn check_matched(source: &[Point], target: &[Point]) -> Result<(), SimilarityError> {
    if source.len() != target.len() {
        return Err(SimilarityError::LengthMismatch {
            left: source.len(),
            right: target.len(),
        });
    }
    for (sequence, pts) in [
        (SequenceRole::Source, source),
        (SequenceRole::Target, target),
    ] {
        if let Some(index) = pts.iter().position(|p| !p.is_finite()) {
            return Err(SimilarityError::NonFinite { sequence, index });
        }
    }
    Ok(())
}

/// Fit the similarity transform that maps `source` onto `target` with least
/// squared error. Points are matched by index.
pub fn estimate(
    source: &[Point],
    target: &[Point],
) -> Result<SimilarityParameters, SimilarityError> {
    check_matched(source, target)?;

    let count = source.len();
    if count < 2 {
        return Err(SimilarityError::TooFewPoints { count });
    }

    let s = Aggregates::accumulate(source, target);
    let det = s.det();
    tracing::trace!(count, det, sq_a = s.sq_a, "accumulated normal-equation sums");

    if !det.is_finite() || !s.sq_a.is_finite() {
        return Err(SimilarityError::Overflow);
    }

    // Also rejects an all-zero source where the bound itself is zero.
    if !(det > DEGENERATE_TOLERANCE * s.k * s.sq_a) {
        return Err(SimilarityError::ZeroSpread { det });
    }

    let tx = (s.sq_a * s.sum_xb - s.sum_xa * s.dot + s.sum_ya * s.cross) / det;
    let ty = (s.sq_a * s.sum_yb - s.sum_ya * s.dot - s.sum_xa * s.cross) / det;
    let sc = (-s.sum_xa * s.sum_xb - s.sum_ya * s.sum_yb + s.k * s.dot) / det;
    let ss = (s.sum_ya * s.sum_xb - s.sum_xa * s.sum_yb + s.k * s.cross) / det;

    if let Some(index) = [tx, ty, sc, ss].iter().position(|v| !v.is_finite()) {
        return Err(SimilarityError::NonFinite {
            sequence: SequenceRole::Parameters,
            index,
        });
    }
    if sc == 0.0 && ss == 0.0 {
        return Err(SimilarityError::CollapsedScale);
    }

    let params = SimilarityParameters { tx, ty, sc, ss };
    tracing::debug!(count, %params, "estimated similarity transform");
    Ok(params)
}

/// Apply `params` to every point, returning a new sequence of the same length.
pub fn apply(points: &[Point], params: &SimilarityParameters) -> Vec<Point> {
    points.iter().map(|p| params.transform(*p)).collect()
}

/// Summed Euclidean distance between index-matched points.
///
/// This is a sum, not a mean: compare sequences of different lengths only
/// after dividing by their length.
pub fn error(a: &[Point], b: &[Point]) -> Result<f64, SimilarityError> {
    check_matched(a, b)?;
    Ok(a.iter().zip(b).map(|(p, q)| p.distance(q)).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::points;

    #[test]
    fn test_worked_example_exact_parameters() {
        let a = points(&[(1.0, 1.0), (5.0, 7.0)]);
        let b = points(&[(8.0, 11.0), (8.0, 9.0)]);

        let p = estimate(&a, &b).unwrap();
        // det = 52 for this pair; values follow from the closed form by hand.
        assert!((p.translation_x() - 420.0 / 52.0).abs() < 1e-12);
        assert!((p.translation_y() - 592.0 / 52.0).abs() < 1e-12);
        assert!((p.cos_scaled() + 12.0 / 52.0).abs() < 1e-12);
        assert!((p.sin_scaled() + 8.0 / 52.0).abs() < 1e-12);

        let residual = error(&apply(&a, &p), &b).unwrap();
        assert!(residual < 1e-6, "residual {residual}");
    }

    #[test]
    fn test_coincident_source_is_degenerate() {
        let a = points(&[(2.0, 2.0), (2.0, 2.0), (2.0, 2.0)]);
        let b = points(&[(1.0, 0.0), (0.0, 1.0), (3.0, 3.0)]);

        let err = estimate(&a, &b).unwrap_err();
        assert!(matches!(err, SimilarityError::ZeroSpread { .. }));
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_all_points_at_origin_is_degenerate() {
        let a = points(&[(0.0, 0.0), (0.0, 0.0)]);
        let b = points(&[(1.0, 0.0), (0.0, 1.0)]);
        assert!(matches!(
            estimate(&a, &b),
            Err(SimilarityError::ZeroSpread { .. })
        ));
    }

    #[test]
    fn test_too_few_points() {
        let a = points(&[(1.0, 2.0)]);
        let b = points(&[(3.0, 4.0)]);
        assert_eq!(
            estimate(&a, &b),
            Err(SimilarityError::TooFewPoints { count: 1 })
        );
        assert_eq!(
            estimate(&[], &[]),
            Err(SimilarityError::TooFewPoints { count: 0 })
        );
    }

    #[test]
    fn test_collapsed_target() {
        let a = points(&[(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)]);
        let b = points(&[(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)]);
        let err = estimate(&a, &b).unwrap_err();
        assert_eq!(err, SimilarityError::CollapsedScale);
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_length_mismatch_rejected_first() {
        let a = points(&[(0.0, 0.0), (1.0, 1.0)]);
        let b = points(&[(f64::NAN, 0.0)]);
        assert_eq!(
            estimate(&a, &b),
            Err(SimilarityError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            error(&a, &b),
            Err(SimilarityError::LengthMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let a = points(&[(0.0, 0.0), (1.0, f64::INFINITY)]);
        let b = points(&[(0.0, 0.0), (1.0, 1.0)]);
        let err = estimate(&a, &b).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::NonFinite {
                sequence: SequenceRole::Source,
                index: 1
            }
        );
        assert!(!err.is_degenerate());

        let err = error(&b, &a).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::NonFinite {
                sequence: SequenceRole::Target,
                index: 1
            }
        );
    }

    #[test]
    fn test_overflowing_sums_reported_as_overflow() {
        let a = points(&[(1e200, 1e200), (-1e200, 3e200)]);
        let b = points(&[(0.0, 0.0), (1.0, 1.0)]);
        let err = estimate(&a, &b).unwrap_err();
        assert_eq!(err, SimilarityError::Overflow);
        assert!(!err.is_degenerate());
    }

    #[test]
    fn test_quarter_turn_accessors() {
        let p = SimilarityParameters::new(0.0, 0.0, 0.0, 5.0).unwrap();
        assert_eq!(p.scale(), 5.0);
        assert!((p.rotation_degrees() - 90.0).abs() < 1e-12);
        assert!((p.signed_rotation_degrees() - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_legacy_rotation_loses_sign() {
        let cw = SimilarityParameters::from_scale_rotation(0.0, 0.0, 2.0, -30.0).unwrap();
        let ccw = SimilarityParameters::from_scale_rotation(0.0, 0.0, 2.0, 30.0).unwrap();

        assert!((cw.rotation_degrees() - 30.0).abs() < 1e-9);
        assert!((ccw.rotation_degrees() - 30.0).abs() < 1e-9);
        assert!((cw.signed_rotation_degrees() + 30.0).abs() < 1e-9);
        assert!((ccw.signed_rotation_degrees() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_constructor_validation() {
        assert!(matches!(
            SimilarityParameters::new(0.0, 0.0, 0.0, 0.0),
            Err(SimilarityError::InvalidParameters(_))
        ));
        assert_eq!(
            SimilarityParameters::new(0.0, f64::NAN, 1.0, 0.0),
            Err(SimilarityError::NonFinite {
                sequence: SequenceRole::Parameters,
                index: 1
            })
        );
    }

    #[test]
    fn test_transform_matches_expanded_form() {
        let p = SimilarityParameters::new(3.0, -1.0, 0.5, 2.0).unwrap();
        let q = p.transform(Point::new(2.0, 7.0));
        assert_eq!(q.x, 3.0 + 2.0 * 0.5 - 7.0 * 2.0);
        assert_eq!(q.y, -1.0 + 7.0 * 0.5 + 2.0 * 2.0);
    }

    #[test]
    fn test_deserialize_rejects_zero_scale() {
        let ok: SimilarityParameters =
            serde_json::from_str(r#"{"tx":1.0,"ty":2.0,"sc":0.0,"ss":3.0}"#).unwrap();
        assert_eq!(ok.scale(), 3.0);

        let bad = serde_json::from_str::<SimilarityParameters>(
            r#"{"tx":1.0,"ty":2.0,"sc":0.0,"ss":0.0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_error_is_sum_not_mean() {
        let a = points(&[(0.0, 0.0), (10.0, 0.0)]);
        let b = points(&[(3.0, 4.0), (13.0, 4.0)]);
        assert_eq!(error(&a, &b).unwrap(), 10.0);
        assert_eq!(error(&a, &a).unwrap(), 0.0);
        assert_eq!(error(&[], &[]).unwrap(), 0.0);
    }
}
