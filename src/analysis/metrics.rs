use crate::geometry::SimilarityParameters;
use serde::{Deserialize, Serialize};

/// Difference between an estimated transform and the one that generated the data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParameterError {
    pub translation: f64,
    /// `|s_est − s_true| / s_true`
    pub relative_scale: f64,
    /// Smallest signed angle between the two rotations, in degrees
    pub rotation_degrees: f64,
}

pub fn calculate_translation_error(
    estimated: &SimilarityParameters,
    truth: &SimilarityParameters,
) -> f64 {
    (estimated.translation() - truth.translation()).norm()
}

pub fn calculate_scale_error(
    estimated: &SimilarityParameters,
    truth: &SimilarityParameters,
) -> f64 {
    (estimated.scale() - truth.scale()).abs() / truth.scale()
}

pub fn calculate_rotation_error(
    estimated: &SimilarityParameters,
    truth: &SimilarityParameters,
) -> f64 {
    let diff = estimated.signed_rotation_degrees() - truth.signed_rotation_degrees();
    (diff + 180.0).rem_euclid(360.0) - 180.0
}

pub fn parameter_error(
    estimated: &SimilarityParameters,
    truth: &SimilarityParameters,
) -> ParameterError {
    ParameterError {
        translation: calculate_translation_error(estimated, truth),
        relative_scale: calculate_scale_error(estimated, truth),
        rotation_degrees: calculate_rotation_error(estimated, truth),
    }
}
