//! Random similarity transforms and point sets for self tests and benchmarks.

use crate::geometry::{Point, SimilarityParameters};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Sampling ranges for random transforms, half-open `(low, high)`.
#[derive(Debug, Clone)]
pub struct TransformRanges {
    pub rotation_range: (f64, f64),
    pub scale_range: (f64, f64),
    pub translation_range: (f64, f64),
}

impl Default for TransformRanges {
    fn default() -> Self {
        Self {
            rotation_range: (-180.0, 180.0),
            scale_range: (0.25, 4.0),
            translation_range: (-500.0, 500.0),
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Draw a random similarity transform within `ranges`.
pub fn random_parameters<R: Rng + ?Sized>(
    rng: &mut R,
    ranges: &TransformRanges,
) -> crate::Result<SimilarityParameters> {
    let params = SimilarityParameters::from_scale_rotation(
        sample(rng, ranges.translation_range),
        sample(rng, ranges.translation_range),
        sample(rng, ranges.scale_range),
        sample(rng, ranges.rotation_range),
    )?;
    Ok(params)
}

/// `n` points uniformly distributed in `[0, extent)²`.
pub fn random_points<R: Rng + ?Sized>(rng: &mut R, n: usize, extent: f64) -> Vec<Point> {
    (0..n)
        .map(|_| Point::new(sample(rng, (0.0, extent)), sample(rng, (0.0, extent))))
        .collect()
}

/// Perturb every coordinate with zero-mean Gaussian noise of standard deviation `sigma`.
pub fn add_noise<R: Rng + ?Sized>(
    rng: &mut R,
    points: &[Point],
    sigma: f64,
) -> crate::Result<Vec<Point>> {
    if !(sigma.is_finite() && sigma >= 0.0) {
        anyhow::bail!("invalid noise sigma {}", sigma);
    }
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| anyhow::anyhow!("invalid noise sigma {}: {}", sigma, e))?;
    Ok(points
        .iter()
        .map(|p| Point::new(p.x + normal.sample(rng), p.y + normal.sample(rng)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parameters_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranges = TransformRanges {
            rotation_range: (10.0, 20.0),
            scale_range: (2.0, 3.0),
            translation_range: (-1.0, 1.0),
        };
        for _ in 0..50 {
            let p = random_parameters(&mut rng, &ranges).unwrap();
            assert!(p.scale() > 2.0 - 1e-9 && p.scale() < 3.0 + 1e-9);
            let rot = p.signed_rotation_degrees();
            assert!(rot > 10.0 - 1e-9 && rot < 20.0 + 1e-9);
            assert!(p.translation_x().abs() <= 1.0);
        }
    }

    #[test]
    fn test_points_and_noise() {
        let mut rng = StdRng::seed_from_u64(11);
        let pts = random_points(&mut rng, 20, 100.0);
        assert_eq!(pts.len(), 20);
        assert!(pts.iter().all(|p| (0.0..100.0).contains(&p.x) && (0.0..100.0).contains(&p.y)));

        let same = add_noise(&mut rng, &pts, 0.0).unwrap();
        assert_eq!(same, pts);

        assert!(add_noise(&mut rng, &pts, -1.0).is_err());
        assert!(add_noise(&mut rng, &pts, f64::NAN).is_err());
    }
}
