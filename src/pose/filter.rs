//! Joint filtering and lean classification
//!
//! Turns one frame's raw detections into the joints worth drawing and a
//! discrete lean of the torso. Nothing is remembered between frames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{JointName, JointObservation, NormalizedPoint, SkeletonTopology};
use crate::error::ConfigError;

/// Default confidence threshold for body joints
pub const DEFAULT_BODY_CONFIDENCE: f32 = 0.1;

/// Default shoulder-to-hip horizontal offset that counts as leaning
pub const DEFAULT_LEAN_THRESHOLD: f64 = 0.1;

/// Joints that survived confidence and topology filtering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredJointMap {
    joints: BTreeMap<JointName, NormalizedPoint>,
}

impl FilteredJointMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: JointName, point: NormalizedPoint) {
        self.joints.insert(name, point);
    }

    pub fn get(&self, name: JointName) -> Option<NormalizedPoint> {
        self.joints.get(&name).copied()
    }

    pub fn contains(&self, name: JointName) -> bool {
        self.joints.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Joints in `JointName` order
    pub fn iter(&self) -> impl Iterator<Item = (JointName, NormalizedPoint)> + '_ {
        self.joints.iter().map(|(name, point)| (*name, *point))
    }
}

impl FromIterator<(JointName, NormalizedPoint)> for FilteredJointMap {
    fn from_iter<I: IntoIterator<Item = (JointName, NormalizedPoint)>>(iter: I) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}

/// Horizontal lean of the torso
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeanDirection {
    Left,
    Right,
    /// Offset within the lean threshold
    Upright,
    /// Shoulders or hips not all visible this frame
    #[default]
    Unknown,
}

impl LeanDirection {
    pub fn display_name(&self) -> &'static str {
        match self {
            LeanDirection::Left => "Leaning to the left",
            LeanDirection::Right => "Leaning to the right",
            LeanDirection::Upright => "Standing upright",
            LeanDirection::Unknown => "Torso not visible",
        }
    }
}

/// Classify a shoulder-to-hip horizontal offset
pub fn classify_offset(offset: f64, lean_threshold: f64) -> LeanDirection {
    if offset > lean_threshold {
        LeanDirection::Right
    } else if offset < -lean_threshold {
        LeanDirection::Left
    } else {
        LeanDirection::Upright
    }
}

/// Shoulder midpoint x minus hip midpoint x, if all four torso joints are present
pub fn torso_offset(joints: &FilteredJointMap) -> Option<f64> {
    let left_shoulder = joints.get(JointName::LeftShoulder)?;
    let right_shoulder = joints.get(JointName::RightShoulder)?;
    let left_hip = joints.get(JointName::LeftHip)?;
    let right_hip = joints.get(JointName::RightHip)?;

    let shoulder_mid = left_shoulder.midpoint(right_shoulder);
    let hip_mid = left_hip.midpoint(right_hip);
    Some(shoulder_mid.x - hip_mid.x)
}

/// Classify lean from an already filtered map
pub fn classify_lean(joints: &FilteredJointMap, lean_threshold: f64) -> LeanDirection {
    match torso_offset(joints) {
        Some(offset) => classify_offset(offset, lean_threshold),
        None => LeanDirection::Unknown,
    }
}

/// Confidence + topology filter with lean classification
#[derive(Debug, Clone)]
pub struct JointFilter {
    topology: SkeletonTopology,
    confidence_threshold: f32,
    lean_threshold: f64,
}

impl JointFilter {
    pub fn new(
        topology: SkeletonTopology,
        confidence_threshold: f32,
        lean_threshold: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence threshold {} outside 0..=1",
                confidence_threshold
            )));
        }
        if !lean_threshold.is_finite() || lean_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "lean threshold {} must be finite and non-negative",
                lean_threshold
            )));
        }
        Ok(Self {
            topology,
            confidence_threshold,
            lean_threshold,
        })
    }

    pub fn topology(&self) -> &SkeletonTopology {
        &self.topology
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn lean_threshold(&self) -> f64 {
        self.lean_threshold
    }

    /// Keep joints strictly above the confidence threshold that belong to a bone
    pub fn filter(&self, observations: &[JointObservation]) -> FilteredJointMap {
        observations
            .iter()
            .filter(|obs| obs.exceeds(self.confidence_threshold))
            .filter(|obs| self.topology.contains_joint(obs.name))
            .map(|obs| (obs.name, obs.location))
            .collect()
    }

    /// Filter and classify in one pass
    pub fn analyze(&self, observations: &[JointObservation]) -> (FilteredJointMap, LeanDirection) {
        let joints = self.filter(observations);
        let lean = classify_lean(&joints, self.lean_threshold);
        (joints, lean)
    }
}

impl Default for JointFilter {
    fn default() -> Self {
        Self {
            topology: SkeletonTopology::default(),
            confidence_threshold: DEFAULT_BODY_CONFIDENCE,
            lean_threshold: DEFAULT_LEAN_THRESHOLD,
        }
    }
}
