//! Configuration and serialization module.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::CameraPosition;
use crate::error::ConfigError;
use crate::geometry::ContentMode;
use crate::pipeline::BacklogPolicy;
use crate::pose::filter::{DEFAULT_BODY_CONFIDENCE, DEFAULT_LEAN_THRESHOLD};
use crate::pose::hand::DEFAULT_HAND_CONFIDENCE;
use crate::pose::{HandPointTracker, JointFilter, SkeletonTopology, TopologyKind};
use crate::render::OverlayStyle;
use crate::sensor::DEFAULT_TILT_THRESHOLD_DEGREES;

/// Which detector drives the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Full-body skeleton with lean classification
    #[default]
    Body,
    /// Single hand landmark
    Hand,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
    pub overlay: OverlayStyleConfig,
    pub tilt: TiltConfig,
}

/// Detection thresholds and skeleton choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub mode: TrackingMode,
    pub topology: TopologyKind,
    /// Body joints at or below this confidence are dropped.
    pub body_confidence_threshold: f32,
    /// Hand landmark at or below this confidence is hidden.
    pub hand_confidence_threshold: f32,
    /// Shoulder-to-hip horizontal offset beyond which the subject leans.
    /// Depends on camera resolution and distance; 0.03 suits close framing.
    pub lean_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Body,
            topology: TopologyKind::ShoulderHip,
            body_confidence_threshold: DEFAULT_BODY_CONFIDENCE,
            hand_confidence_threshold: DEFAULT_HAND_CONFIDENCE,
            lean_threshold: DEFAULT_LEAN_THRESHOLD,
        }
    }
}

/// Frame pipeline behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub backlog_policy: BacklogPolicy,
    /// How long `stop` waits for an in-flight detection.
    pub drain_timeout_ms: u64,
    pub initial_camera: CameraPosition,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backlog_policy: BacklogPolicy::DropNewest,
            drain_timeout_ms: 500,
            initial_camera: CameraPosition::Back,
        }
    }
}

/// Overlay shape sizes and image placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyleConfig {
    pub joint_radius: f64,
    pub bone_width: f64,
    pub hand_marker_radius: f64,
    pub hand_marker_offset: f64,
    pub content_mode: ContentMode,
}

impl Default for OverlayStyleConfig {
    fn default() -> Self {
        let style = OverlayStyle::default();
        Self {
            joint_radius: style.joint_radius,
            bone_width: style.bone_width,
            hand_marker_radius: style.hand_marker_radius,
            hand_marker_offset: style.hand_marker_offset,
            content_mode: ContentMode::Fit,
        }
    }
}

/// Tilt warning settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    pub threshold_degrees: f64,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            threshold_degrees: DEFAULT_TILT_THRESHOLD_DEGREES,
        }
    }
}

impl OverlayConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: OverlayConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.joint_filter()?;
        self.hand_tracker()?;
        let style = &self.overlay;
        for (name, value) in [
            ("joint_radius", style.joint_radius),
            ("bone_width", style.bone_width),
            ("hand_marker_radius", style.hand_marker_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !style.hand_marker_offset.is_finite() {
            return Err(ConfigError::Invalid("hand_marker_offset must be finite".to_string()));
        }
        if !self.tilt.threshold_degrees.is_finite() || self.tilt.threshold_degrees < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tilt threshold {} must be non-negative",
                self.tilt.threshold_degrees
            )));
        }
        Ok(())
    }

    pub fn topology(&self) -> SkeletonTopology {
        SkeletonTopology::new(self.detection.topology)
    }

    pub fn joint_filter(&self) -> Result<JointFilter, ConfigError> {
        JointFilter::new(
            self.topology(),
            self.detection.body_confidence_threshold,
            self.detection.lean_threshold,
        )
    }

    pub fn hand_tracker(&self) -> Result<HandPointTracker, ConfigError> {
        HandPointTracker::new(
            HandPointTracker::default().joint(),
            self.detection.hand_confidence_threshold,
        )
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            joint_radius: self.overlay.joint_radius,
            bone_width: self.overlay.bone_width,
            hand_marker_radius: self.overlay.hand_marker_radius,
            hand_marker_offset: self.overlay.hand_marker_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.detection.body_confidence_threshold, 0.1);
        assert_eq!(config.detection.hand_confidence_threshold, 0.2);
        assert_eq!(config.detection.lean_threshold, 0.1);
        assert_eq!(config.pipeline.backlog_policy, BacklogPolicy::DropNewest);
        assert_eq!(config.overlay.joint_radius, 3.0);
        assert_eq!(config.overlay.bone_width, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "detection": { "lean_threshold": 0.03, "topology": "NeckRoot" } }"#;
        let config: OverlayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.lean_threshold, 0.03);
        assert_eq!(config.detection.topology, TopologyKind::NeckRoot);
        assert_eq!(config.detection.body_confidence_threshold, 0.1);
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("posture-overlay-config-{}.json", std::process::id()));
        let mut config = OverlayConfig::default();
        config.pipeline.backlog_policy = BacklogPolicy::ReplacePending;
        config.detection.mode = TrackingMode::Hand;
        config.save(&path).unwrap();

        let loaded = OverlayConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = OverlayConfig::default();
        config.detection.body_confidence_threshold = 2.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = OverlayConfig::default();
        config.overlay.bone_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = OverlayConfig::load("/nonexistent/posture-overlay.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
