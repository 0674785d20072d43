//! Single hand point tracking

use super::{HandJointName, HandObservation, NormalizedPoint};
use crate::error::ConfigError;

/// Default confidence threshold for the tracked hand landmark
pub const DEFAULT_HAND_CONFIDENCE: f32 = 0.2;

/// Follows one landmark of the first detected hand
#[derive(Debug, Clone)]
pub struct HandPointTracker {
    joint: HandJointName,
    confidence_threshold: f32,
}

impl HandPointTracker {
    pub fn new(joint: HandJointName, confidence_threshold: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "hand confidence threshold {} outside 0..=1",
                confidence_threshold
            )));
        }
        Ok(Self {
            joint,
            confidence_threshold,
        })
    }

    pub fn joint(&self) -> HandJointName {
        self.joint
    }

    /// Location of the tracked landmark, if present and confident
    pub fn track(&self, observations: &[HandObservation]) -> Option<NormalizedPoint> {
        observations
            .iter()
            .find(|obs| obs.name == self.joint)
            .filter(|obs| obs.exceeds(self.confidence_threshold))
            .map(|obs| obs.location)
    }
}

impl Default for HandPointTracker {
    /// Middle finger knuckle: the most stable point near the palm center
    fn default() -> Self {
        Self {
            joint: HandJointName::MiddleMcp,
            confidence_threshold: DEFAULT_HAND_CONFIDENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_middle_mcp() {
        let tracker = HandPointTracker::default();
        let observations = vec![
            HandObservation::new(HandJointName::Wrist, 0.1, 0.1, 0.9),
            HandObservation::new(HandJointName::MiddleMcp, 0.4, 0.6, 0.8),
        ];
        assert_eq!(tracker.track(&observations), Some(NormalizedPoint::new(0.4, 0.6)));
    }

    #[test]
    fn test_low_confidence_hides_point() {
        let tracker = HandPointTracker::default();
        let observations = vec![HandObservation::new(HandJointName::MiddleMcp, 0.4, 0.6, 0.2)];
        assert_eq!(tracker.track(&observations), None);
    }

    #[test]
    fn test_missing_joint() {
        let tracker = HandPointTracker::default();
        assert_eq!(tracker.track(&[]), None);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(HandPointTracker::new(HandJointName::IndexTip, -0.1).is_err());
    }
}
