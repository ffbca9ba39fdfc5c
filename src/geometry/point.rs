use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn to_complex(self) -> Complex64 {
        Complex64::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Complex64> for Point {
    fn from(z: Complex64) -> Self {
        Self { x: z.re, y: z.im }
    }
}

/// Build an owned point sequence from coordinate pairs.
pub fn points(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().copied().map(Point::from).collect()
}

/// Arithmetic mean of the points, `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Root-mean-square distance of the points from their centroid.
pub fn rms_spread(points: &[Point]) -> Option<f64> {
    let c = centroid(points)?;
    let sum_sq: f64 = points
        .iter()
        .map(|p| (p.x - c.x).powi(2) + (p.y - c.y).powi(2))
        .sum();
    Some((sum_sq / points.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(4.0, 5.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_complex_conversion() {
        let p = Point::new(3.0, -2.0);
        let z = p.to_complex();
        assert_eq!(z, Complex64::new(3.0, -2.0));
        assert_eq!(Point::from(z), p);
    }

    #[test]
    fn test_centroid_and_spread() {
        let pts = points(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert_eq!(centroid(&pts), Some(Point::new(1.0, 1.0)));
        let spread = rms_spread(&pts).unwrap();
        assert!((spread - 2.0f64.sqrt()).abs() < 1e-12);

        assert!(centroid(&[]).is_none());
        assert!(rms_spread(&[]).is_none());
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY).is_finite());
    }
}
