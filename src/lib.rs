pub mod analysis;
pub mod config;
pub mod data;
pub mod geometry;
pub mod keypoints;
pub mod logging;
pub mod matching;
pub mod visualization;

pub use geometry::{apply, estimate, similarity, Point, SimilarityError, SimilarityParameters};
pub use keypoints::{correspond, DetectionResponse, Keypoint, KeypointSet};
pub use matching::{MatchReport, PoseMatcher, RankedMatch};

pub type Result<T> = anyhow::Result<T>;
