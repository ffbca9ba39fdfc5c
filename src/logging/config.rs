//! Logging configuration
//!
//! Per-component log levels, output destinations and file rotation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    Hourly,
    Daily,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    pub global_level: String,

    /// Enable console output
    pub console_output: bool,

    /// Directory for log files (None = no file logging)
    pub log_directory: Option<PathBuf>,

    /// Write file logs as JSON lines instead of plain text
    pub json_file_output: bool,

    /// Include file location in logs
    pub include_file_location: bool,

    /// Level for the estimator and point geometry
    pub geometry_level: String,

    /// Level for keypoint pairing and pose matching
    pub matching_level: String,

    pub rotation: FileRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_level: "info".to_string(),
            console_output: true,
            log_directory: None,
            json_file_output: true,
            include_file_location: false,
            geometry_level: "info".to_string(),
            matching_level: "info".to_string(),
            rotation: FileRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Verbose logging to the console and to `logs/`
    pub fn development() -> Self {
        Self {
            global_level: "debug".to_string(),
            log_directory: Some(PathBuf::from("logs")),
            include_file_location: true,
            geometry_level: "trace".to_string(),
            matching_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// File-only logging at warn level
    pub fn production() -> Self {
        Self {
            global_level: "warn".to_string(),
            console_output: false,
            log_directory: Some(PathBuf::from("/var/log/pose-match")),
            geometry_level: "warn".to_string(),
            matching_level: "info".to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, level) in [
            ("global_level", &self.global_level),
            ("geometry_level", &self.geometry_level),
            ("matching_level", &self.matching_level),
        ] {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(format!(
                    "Invalid {}: {}. Must be one of: {:?}",
                    name, level, VALID_LEVELS
                ));
            }
        }

        if !self.console_output && self.log_directory.is_none() {
            return Err(
                "Logging has no output: enable console_output or set log_directory".to_string(),
            );
        }

        Ok(())
    }

    /// Get the effective log level for a specific component
    pub fn get_component_level(&self, component: &str) -> &str {
        match component {
            "geometry" | "similarity" => &self.geometry_level,
            "matching" | "keypoints" => &self.matching_level,
            _ => &self.global_level,
        }
    }

    /// `EnvFilter` directives for this crate's components.
    pub fn filter_directives(&self, crate_name: &str) -> String {
        let mut directives = vec![format!("{}={}", crate_name, self.global_level)];
        for component in ["geometry", "keypoints", "matching"] {
            directives.push(format!(
                "{}::{}={}",
                crate_name,
                component,
                self.get_component_level(component)
            ));
        }
        directives.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.global_level, "info");
        assert!(config.console_output);
        assert!(config.log_directory.is_none());
        assert!(!config.include_file_location);
        assert_eq!(config.rotation, FileRotation::Daily);
    }

    #[test]
    fn test_presets() {
        let dev = LoggingConfig::development();
        assert_eq!(dev.global_level, "debug");
        assert_eq!(dev.geometry_level, "trace");
        assert!(dev.log_directory.is_some());

        let prod = LoggingConfig::production();
        assert_eq!(prod.global_level, "warn");
        assert!(!prod.console_output);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.matching_level = "loud".to_string();
        assert!(config.validate().is_err());

        config.matching_level = "debug".to_string();
        config.console_output = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_component_levels_and_directives() {
        let config = LoggingConfig::development();
        assert_eq!(config.get_component_level("similarity"), "trace");
        assert_eq!(config.get_component_level("matching"), "debug");
        assert_eq!(config.get_component_level("cli"), "debug");

        let directives = config.filter_directives("pose_match");
        assert!(directives.starts_with("pose_match=debug,"));
        assert!(directives.contains("pose_match::geometry=trace"));
        assert!(directives.contains("pose_match::keypoints=debug"));
        assert!(!directives.contains("pose_match::cli"));
    }
}
