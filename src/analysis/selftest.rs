use super::metrics::{parameter_error, ParameterError};
use crate::data::synthetic::{random_parameters, random_points, TransformRanges};
use crate::geometry::{apply, estimate, points, similarity};
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const TRANSLATION_TOLERANCE: f64 = 1e-6;
const SCALE_TOLERANCE: f64 = 1e-9;
const ROTATION_TOLERANCE_DEGREES: f64 = 1e-7;
const WORKED_EXAMPLE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestSummary {
    pub worked_example_residual: f64,
    pub trials: usize,
    pub failures: usize,
    pub worst: ParameterError,
    pub mean_estimate_us: f64,
}

impl SelfTestSummary {
    pub fn passed(&self) -> bool {
        self.worked_example_residual < WORKED_EXAMPLE_TOLERANCE && self.failures == 0
    }
}

/// Residual of fitting A = [(1,1), (5,7)] onto B = [(8,11), (8,9)].
pub fn worked_example_residual() -> crate::Result<f64> {
    let a = points(&[(1.0, 1.0), (5.0, 7.0)]);
    let b = points(&[(8.0, 11.0), (8.0, 9.0)]);
    let params = estimate(&a, &b)?;
    Ok(similarity::error(&apply(&a, &params), &b)?)
}

/// Fit the worked example, then recover `trials` random transforms from exact
/// correspondences generated with `seed`.
pub fn run_self_test(trials: usize, seed: u64) -> crate::Result<SelfTestSummary> {
    let mut rng = StdRng::seed_from_u64(seed);
    let ranges = TransformRanges::default();

    let worked_example_residual = worked_example_residual()?;
    let mut worst = ParameterError::default();
    let mut failures = 0;
    let mut elapsed_us = 0.0;

    for trial in 0..trials {
        let truth = random_parameters(&mut rng, &ranges)?;
        let source = random_points(&mut rng, 3 + trial % 16, 1000.0);
        let target = apply(&source, &truth);

        let start = Instant::now();
        let fitted = estimate(&source, &target)?;
        elapsed_us += start.elapsed().as_secs_f64() * 1e6;

        let err = parameter_error(&fitted, &truth);
        worst.translation = worst.translation.max(err.translation);
        worst.relative_scale = worst.relative_scale.max(err.relative_scale);
        worst.rotation_degrees = worst.rotation_degrees.max(err.rotation_degrees.abs());

        if err.translation > TRANSLATION_TOLERANCE
            || err.relative_scale > SCALE_TOLERANCE
            || err.rotation_degrees.abs() > ROTATION_TOLERANCE_DEGREES
        {
            failures += 1;
            tracing::warn!(trial, %truth, %fitted, "transform not recovered");
        }
    }

    let summary = SelfTestSummary {
        worked_example_residual,
        trials,
        failures,
        worst,
        mean_estimate_us: if trials > 0 { elapsed_us / trials as f64 } else { 0.0 },
    };
    tracing::info!(?summary, "self test finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example_residual() {
        assert!(worked_example_residual().unwrap() < 1e-6);
    }

    #[test]
    fn test_self_test_passes() {
        let summary = run_self_test(64, 42).unwrap();
        assert_eq!(summary.trials, 64);
        assert_eq!(summary.failures, 0, "worst: {:?}", summary.worst);
        assert!(summary.passed());
    }

    #[test]
    fn test_zero_trials() {
        let summary = run_self_test(0, 1).unwrap();
        assert_eq!(summary.mean_estimate_us, 0.0);
        assert!(summary.passed());
    }
}
