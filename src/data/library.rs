use crate::keypoints::KeypointSet;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A stored reference pose that photos are matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePose {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub keypoints: KeypointSet,
}

/// Reference poses addressed by numeric id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseLibrary {
    pub poses: Vec<ReferencePose>,
}

impl PoseLibrary {
    pub fn new(poses: Vec<ReferencePose>) -> crate::Result<Self> {
        let library = Self { poses };
        library.check_unique_ids()?;
        Ok(library)
    }

    /// Load a library from JSON or TOML, chosen by the first non-blank character.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read pose library {}", path.display()))?;

        let library: PoseLibrary = if content.trim_start().starts_with('{') {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        library.check_unique_ids()?;

        tracing::info!(poses = library.poses.len(), path = %path.display(), "loaded pose library");
        Ok(library)
    }

    pub fn get(&self, id: u32) -> Option<&ReferencePose> {
        self.poses.iter().find(|p| p.id == id)
    }

    pub fn ids(&self) -> Vec<u32> {
        self.poses.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    fn check_unique_ids(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for pose in &self.poses {
            if !seen.insert(pose.id) {
                anyhow::bail!("duplicate reference pose id {}", pose.id);
            }
        }
        Ok(())
    }
}
