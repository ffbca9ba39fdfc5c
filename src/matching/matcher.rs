use crate::config::MatchingConfig;
use crate::correlation_span;
use crate::data::{PoseLibrary, ReferencePose};
use crate::geometry::{self, similarity, Point, SimilarityParameters};
use crate::keypoints::{correspond, Correspondence, KeypointSet};
use crate::logging::{get_correlation_id, with_correlation_id};
use anyhow::Context;
use chrono::{DateTime, Utc};
use instant::Instant;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::Level;
use uuid::Uuid;

/// Outcome of fitting a reference pose onto the keypoints of a photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub reference_id: Option<u32>,
    pub correspondence_count: usize,
    pub labels: Vec<Option<String>>,

    /// Transform taking reference coordinates into photo pixel coordinates
    pub parameters: SimilarityParameters,
    pub scale: f64,
    pub signed_rotation_degrees: f64,
    /// Unsigned `acos`-based rotation, for comparison with older results
    pub legacy_rotation_degrees: f64,

    /// Summed distance between the transformed reference and the photo
    pub total_error: f64,
    /// Summed distance before transforming the reference
    pub baseline_error: f64,
    pub mean_error: f64,
    /// `mean_error` divided by the RMS spread of the photo keypoints
    pub normalized_error: f64,
    pub is_match: bool,

    /// Reference keypoints mapped into the photo, index-aligned with `labels`
    pub overlay: Vec<Point>,
    /// Photo keypoints that took part in the fit
    pub photo_points: Vec<Point>,

    pub processing_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMatch {
    pub pose_id: u32,
    pub name: String,
    pub report: MatchReport,
}

pub struct PoseMatcher {
    config: MatchingConfig,
}

impl Default for PoseMatcher {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl PoseMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Fit `reference` onto `photo` and decide whether they show the same pose.
    pub fn match_pose(
        &self,
        reference: &KeypointSet,
        photo: &KeypointSet,
    ) -> crate::Result<MatchReport> {
        self.evaluate(reference, photo, None)
    }

    pub fn match_reference(
        &self,
        reference: &ReferencePose,
        photo: &KeypointSet,
    ) -> crate::Result<MatchReport> {
        self.evaluate(&reference.keypoints, photo, Some(reference.id))
            .with_context(|| format!("matching against reference pose {}", reference.id))
    }

    /// Match `photo` against every pose in `library`, best match first.
    ///
    /// Poses that cannot be fitted are logged and left out.
    pub fn rank(&self, photo: &KeypointSet, library: &PoseLibrary) -> Vec<RankedMatch> {
        let correlation_id = get_correlation_id();

        let mut ranked: Vec<RankedMatch> = library
            .poses
            .par_iter()
            .filter_map(|pose| {
                with_correlation_id(correlation_id, || match self.match_reference(pose, photo) {
                    Ok(report) => Some(RankedMatch {
                        pose_id: pose.id,
                        name: pose.name.clone(),
                        report,
                    }),
                    Err(e) => {
                        tracing::warn!(pose_id = pose.id, "skipping reference pose: {:#}", e);
                        None
                    }
                })
            })
            .collect();

        ranked.sort_by(|a, b| a.report.normalized_error.total_cmp(&b.report.normalized_error));
        ranked
    }

    fn evaluate(
        &self,
        reference: &KeypointSet,
        photo: &KeypointSet,
        reference_id: Option<u32>,
    ) -> crate::Result<MatchReport> {
        let span = correlation_span!(Level::INFO, "match_pose", reference_id = ?reference_id);
        let _enter = span.enter();
        let start = Instant::now();

        let pairs = correspond(reference, photo, self.config.min_confidence)?;
        if pairs.len() < self.config.min_correspondences {
            anyhow::bail!(
                "only {} usable keypoint pairs, at least {} required",
                pairs.len(),
                self.config.min_correspondences
            );
        }

        let mut report = self.compare(pairs)?;
        report.reference_id = reference_id;
        report.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            pairs = report.correspondence_count,
            normalized_error = report.normalized_error,
            is_match = report.is_match,
            "pose compared"
        );
        Ok(report)
    }

    fn compare(&self, pairs: Correspondence) -> crate::Result<MatchReport> {
        let Correspondence {
            labels,
            source,
            target,
        } = pairs;

        let parameters = geometry::estimate(&source, &target)?;
        let overlay = geometry::apply(&source, &parameters);
        let total_error = similarity::error(&overlay, &target)?;
        let baseline_error = similarity::error(&source, &target)?;

        let count = target.len();
        let mean_error = total_error / count as f64;
        let spread = geometry::rms_spread(&target)
            .filter(|s| *s > 0.0)
            .context("photo keypoints have no spread")?;
        let normalized_error = mean_error / spread;

        Ok(MatchReport {
            reference_id: None,
            correspondence_count: count,
            labels,
            scale: parameters.scale(),
            signed_rotation_degrees: parameters.signed_rotation_degrees(),
            legacy_rotation_degrees: parameters.rotation_degrees(),
            parameters,
            total_error,
            baseline_error,
            mean_error,
            normalized_error,
            is_match: normalized_error <= self.config.match_threshold,
            overlay,
            photo_points: target,
            processing_time_ms: 0.0,
            timestamp: Utc::now(),
            correlation_id: get_correlation_id(),
        })
    }
}
