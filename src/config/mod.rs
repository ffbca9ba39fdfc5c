use crate::logging::LoggingConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Largest normalized error (mean point error over the photo's RMS spread)
    /// still reported as a match
    pub match_threshold: f64,
    pub min_correspondences: usize,
    /// Keypoints reported with a lower detector confidence are ignored
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub radius: f32,
    pub thickness: f32,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Style for the keypoints detected in the photo
    pub photo: MarkerStyle,
    /// Style for the reference pose mapped into the photo
    pub overlay: MarkerStyle,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.15,
            min_correspondences: 3,
            min_confidence: 0.1,
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 30.0,
            thickness: 10.0,
            color: [255, 0, 0, 255],
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            photo: MarkerStyle::default(),
            overlay: MarkerStyle {
                radius: 20.0,
                thickness: 6.0,
                color: [0, 200, 0, 255],
            },
        }
    }
}

impl MarkerStyle {
    fn validate(&self, name: &str, errors: &mut Vec<String>) {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            errors.push(format!("{} marker radius must be positive", name));
        }
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            errors.push(format!("{} marker thickness must be positive", name));
        }
    }
}

impl Config {
    /// Load from JSON (content starting with `{`) or TOML.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> crate::Result<()> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.matching.match_threshold.is_finite() && self.matching.match_threshold > 0.0) {
            errors.push("Match threshold must be positive and finite".to_string());
        }

        if self.matching.min_correspondences < 2 {
            errors.push("At least 2 correspondences are required to fit a transform".to_string());
        }

        if !(0.0..=1.0).contains(&self.matching.min_confidence) {
            errors.push("Minimum confidence must lie within [0, 1]".to_string());
        }

        self.render.photo.validate("Photo", &mut errors);
        self.render.overlay.validate("Overlay", &mut errors);

        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Json,
    Toml,
}

pub fn load_config_or_default(config_path: Option<&str>) -> Config {
    match config_path {
        Some(path) => {
            match Config::load_from_file(path) {
                Ok(config) => {
                    if let Err(errors) = config.validate() {
                        eprintln!("Configuration validation errors:");
                        for error in errors {
                            eprintln!("  - {}", error);
                        }
                        eprintln!("Using default configuration instead.");
                        Config::default()
                    } else {
                        config
                    }
                }
                Err(e) => {
                    eprintln!("Failed to load config from '{}': {:#}", path, e);
                    eprintln!("Using default configuration.");
                    Config::default()
                }
            }
        }
        None => Config::default(),
    }
}
