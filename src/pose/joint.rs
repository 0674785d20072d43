//! Joint identifiers and per-frame observations

use serde::{Deserialize, Serialize};

/// Body landmarks reported by a vision-style body pose detector (19 points)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    Root,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl JointName {
    pub const COUNT: usize = 19;

    pub const ALL: [JointName; Self::COUNT] = [
        JointName::Nose,
        JointName::LeftEye,
        JointName::RightEye,
        JointName::LeftEar,
        JointName::RightEar,
        JointName::Neck,
        JointName::LeftShoulder,
        JointName::RightShoulder,
        JointName::LeftElbow,
        JointName::RightElbow,
        JointName::LeftWrist,
        JointName::RightWrist,
        JointName::Root,
        JointName::LeftHip,
        JointName::RightHip,
        JointName::LeftKnee,
        JointName::RightKnee,
        JointName::LeftAnkle,
        JointName::RightAnkle,
    ];
}

/// Hand landmarks reported by a hand pose detector (21 points)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandJointName {
    Wrist,
    ThumbCmc,
    ThumbMp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    LittleMcp,
    LittlePip,
    LittleDip,
    LittleTip,
}

impl HandJointName {
    pub const COUNT: usize = 21;

    /// Landmark index in the usual 21-point hand layout
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        use HandJointName::*;
        const ALL: [HandJointName; HandJointName::COUNT] = [
            Wrist, ThumbCmc, ThumbMp, ThumbIp, ThumbTip, IndexMcp, IndexPip, IndexDip, IndexTip,
            MiddleMcp, MiddlePip, MiddleDip, MiddleTip, RingMcp, RingPip, RingDip, RingTip,
            LittleMcp, LittlePip, LittleDip, LittleTip,
        ];
        ALL.get(index).copied()
    }
}

/// Point in detector space: [0,1] on both axes, origin bottom-left, y up
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise midpoint
    pub fn midpoint(self, other: NormalizedPoint) -> NormalizedPoint {
        NormalizedPoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// A single detected landmark
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointObservation<J = JointName> {
    pub name: J,
    pub location: NormalizedPoint,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
}

impl<J> JointObservation<J> {
    pub fn new(name: J, x: f64, y: f64, confidence: f32) -> Self {
        Self {
            name,
            location: NormalizedPoint::new(x, y),
            confidence,
        }
    }

    /// Strictly above the threshold; equal is not confident enough
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

/// Hand landmark observation
pub type HandObservation = JointObservation<HandJointName>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_name_all_is_sorted_and_unique() {
        let mut sorted = JointName::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), JointName::COUNT);
        assert_eq!(sorted, JointName::ALL.to_vec());
    }

    #[test]
    fn test_hand_joint_from_index() {
        assert_eq!(HandJointName::from_index(0), Some(HandJointName::Wrist));
        assert_eq!(HandJointName::from_index(9), Some(HandJointName::MiddleMcp));
        assert_eq!(HandJointName::from_index(20), Some(HandJointName::LittleTip));
        assert_eq!(HandJointName::from_index(21), None);
        assert_eq!(HandJointName::MiddleMcp.index(), 9);
    }

    #[test]
    fn test_midpoint_averages_both_axes() {
        let mid = NormalizedPoint::new(0.3, 0.8).midpoint(NormalizedPoint::new(0.7, 0.6));
        assert!((mid.x - 0.5).abs() < 1e-9);
        assert!((mid.y - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_exceeds_is_strict() {
        let obs = JointObservation::new(JointName::Nose, 0.5, 0.5, 0.1);
        assert!(!obs.exceeds(0.1));
        assert!(obs.exceeds(0.09));
    }
}
