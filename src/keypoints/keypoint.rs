use crate::geometry::Point;
use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// A detected body part. Undetected parts may come back with `null`
/// coordinates, which are read as NaN and dropped when building correspondences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(deserialize_with = "nullable_coord")]
    pub x: f64,

    #[serde(deserialize_with = "nullable_coord")]
    pub y: f64,

    #[serde(default, alias = "score", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

fn nullable_coord<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            label: None,
            x,
            y,
            confidence: None,
        }
    }

    pub fn labelled(label: &str, x: f64, y: f64) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(x, y)
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Ordered keypoints of one person, serialized as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeypointSet {
    keypoints: Vec<Keypoint>,
}

impl KeypointSet {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keypoint> {
        self.keypoints.iter()
    }

    pub fn as_slice(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn points(&self) -> Vec<Point> {
        self.keypoints.iter().map(Keypoint::point).collect()
    }

    /// True when the set is non-empty and every keypoint carries a label.
    pub fn is_labelled(&self) -> bool {
        !self.keypoints.is_empty() && self.keypoints.iter().all(|k| k.label.is_some())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read keypoints from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid keypoint list in {}", path.display()))
    }
}

impl FromIterator<Keypoint> for KeypointSet {
    fn from_iter<I: IntoIterator<Item = Keypoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a KeypointSet {
    type Item = &'a Keypoint;
    type IntoIter = std::slice::Iter<'a, Keypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.keypoints.iter()
    }
}

/// The two keypoint lists returned by the detection service: one for the
/// captured photo and one for the stored reference pose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    #[serde(alias = "person1")]
    pub photo: KeypointSet,

    #[serde(default, alias = "person2")]
    pub reference: KeypointSet,
}

impl DetectionResponse {
    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        serde_json::from_str(content).context("invalid detection response")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read detection response {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("while loading {}", path.display()))
    }
}
