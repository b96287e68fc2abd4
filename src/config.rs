//! Digest configuration
//!
//! All fields have defaults, so a config file only needs the keys it
//! changes.

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory holding one sub-folder per export download
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default output file prefix
pub const DEFAULT_OUTPUT_PREFIX: &str = "llm-ready";

/// Settings for building a digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Directory searched for the latest export folder
    pub data_dir: PathBuf,
    /// Activity types that get per-kilometre splits
    pub split_activity_types: Vec<String>,
    /// Activity types counted as runs in the summary
    pub run_activity_types: Vec<String>,
    /// Activity types counted as rides in the summary
    pub ride_activity_types: Vec<String>,
    /// Ascending heart rate zone upper bounds; empty disables zone output
    pub hr_zone_bounds: Vec<f64>,
    /// Calendar category kept as planned workouts
    pub workout_category: String,
    /// Output file name prefix, followed by the export id
    pub output_prefix: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            split_activity_types: vec!["Run".to_string()],
            run_activity_types: vec!["Run".to_string()],
            ride_activity_types: vec!["Ride".to_string(), "VirtualRide".to_string()],
            hr_zone_bounds: Vec::new(),
            workout_category: "WORKOUT".to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl DigestConfig {
    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self, DigestError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, DigestError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, DigestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the zone bounds are strictly ascending and the prefix usable
    pub fn validate(&self) -> Result<(), DigestError> {
        if self
            .hr_zone_bounds
            .windows(2)
            .any(|pair| pair[1] <= pair[0])
        {
            return Err(DigestError::ConfigError(
                "hr_zone_bounds must be strictly ascending".to_string(),
            ));
        }
        if self.output_prefix.is_empty() || self.output_prefix.contains(['/', '\\']) {
            return Err(DigestError::ConfigError(format!(
                "invalid output_prefix: {:?}",
                self.output_prefix
            )));
        }
        Ok(())
    }

    pub fn is_run(&self, activity_type: Option<&str>) -> bool {
        activity_type.is_some_and(|t| self.run_activity_types.iter().any(|r| r == t))
    }

    pub fn is_ride(&self, activity_type: Option<&str>) -> bool {
        activity_type.is_some_and(|t| self.ride_activity_types.iter().any(|r| r == t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = DigestConfig::from_json(r#"{ "hr_zone_bounds": [130, 150, 165, 178, 255] }"#)
            .unwrap();

        assert_eq!(config.hr_zone_bounds, vec![130.0, 150.0, 165.0, 178.0, 255.0]);
        assert_eq!(config.split_activity_types, vec!["Run".to_string()]);
        assert_eq!(config.workout_category, "WORKOUT");
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = DigestConfig {
            split_activity_types: vec!["Run".to_string(), "TrailRun".to_string()],
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(DigestConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_unordered_zone_bounds() {
        let err = DigestConfig::from_json(r#"{ "hr_zone_bounds": [150, 130] }"#).unwrap_err();
        assert!(matches!(err, DigestError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_path_like_prefix() {
        let err = DigestConfig::from_json(r#"{ "output_prefix": "../out" }"#).unwrap_err();
        assert!(matches!(err, DigestError::ConfigError(_)));
    }

    #[test]
    fn test_activity_type_groups() {
        let config = DigestConfig::default();
        assert!(config.is_run(Some("Run")));
        assert!(!config.is_run(Some("Walk")));
        assert!(config.is_ride(Some("VirtualRide")));
        assert!(!config.is_ride(None));
    }
}
