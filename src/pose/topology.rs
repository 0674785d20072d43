//! Skeleton topology: which joint pairs are drawn as bones

use serde::{Deserialize, Serialize};

use super::JointName;

/// Unordered pair of joints drawn as a line segment
#[derive(Debug, Clone, Copy, Eq)]
pub struct Bone(pub JointName, pub JointName);

impl Bone {
    pub const fn new(a: JointName, b: JointName) -> Self {
        Self(a, b)
    }

    pub fn touches(&self, joint: JointName) -> bool {
        self.0 == joint || self.1 == joint
    }

    pub fn endpoints(&self) -> (JointName, JointName) {
        (self.0, self.1)
    }
}

impl PartialEq for Bone {
    fn eq(&self, other: &Self) -> bool {
        (self.0 == other.0 && self.1 == other.1) || (self.0 == other.1 && self.1 == other.0)
    }
}

/// Available skeleton layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TopologyKind {
    /// Shoulder bar and hip bar joined by the torso sides
    #[default]
    ShoulderHip,
    /// Neck and root as hubs for arms, hips and legs
    NeckRoot,
}

use JointName::*;

const SHOULDER_HIP_BONES: [Bone; 12] = [
    Bone::new(RightShoulder, LeftShoulder),
    Bone::new(LeftShoulder, LeftElbow),
    Bone::new(LeftElbow, LeftWrist),
    Bone::new(RightShoulder, RightElbow),
    Bone::new(RightElbow, RightWrist),
    Bone::new(LeftShoulder, LeftHip),
    Bone::new(RightShoulder, RightHip),
    Bone::new(LeftHip, RightHip),
    Bone::new(LeftHip, LeftKnee),
    Bone::new(LeftKnee, LeftAnkle),
    Bone::new(RightHip, RightKnee),
    Bone::new(RightKnee, RightAnkle),
];

const NECK_ROOT_BONES: [Bone; 13] = [
    Bone::new(Neck, LeftShoulder),
    Bone::new(LeftShoulder, LeftElbow),
    Bone::new(LeftElbow, LeftWrist),
    Bone::new(Neck, RightShoulder),
    Bone::new(RightShoulder, RightElbow),
    Bone::new(RightElbow, RightWrist),
    Bone::new(Neck, Root),
    Bone::new(Root, LeftHip),
    Bone::new(Root, RightHip),
    Bone::new(Root, LeftKnee),
    Bone::new(LeftKnee, LeftAnkle),
    Bone::new(Root, RightKnee),
    Bone::new(RightKnee, RightAnkle),
];

/// A fixed, ordered bone set. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonTopology {
    kind: TopologyKind,
    bones: &'static [Bone],
}

impl SkeletonTopology {
    pub fn new(kind: TopologyKind) -> Self {
        let bones: &'static [Bone] = match kind {
            TopologyKind::ShoulderHip => &SHOULDER_HIP_BONES,
            TopologyKind::NeckRoot => &NECK_ROOT_BONES,
        };
        Self { kind, bones }
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn bones(&self) -> &'static [Bone] {
        self.bones
    }

    /// Whether any bone references the joint
    pub fn contains_joint(&self, joint: JointName) -> bool {
        self.bones.iter().any(|bone| bone.touches(joint))
    }

    /// Distinct joints referenced by the bones, in first-appearance order
    pub fn joints(&self) -> Vec<JointName> {
        let mut joints = Vec::with_capacity(JointName::COUNT);
        for bone in self.bones {
            for joint in [bone.0, bone.1] {
                if !joints.contains(&joint) {
                    joints.push(joint);
                }
            }
        }
        joints
    }
}

impl Default for SkeletonTopology {
    fn default() -> Self {
        Self::new(TopologyKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_equality_is_unordered() {
        assert_eq!(Bone::new(LeftHip, RightHip), Bone::new(RightHip, LeftHip));
        assert_ne!(Bone::new(LeftHip, RightHip), Bone::new(LeftHip, LeftKnee));
    }

    #[test]
    fn test_shoulder_hip_topology() {
        let topology = SkeletonTopology::new(TopologyKind::ShoulderHip);
        assert_eq!(topology.bones().len(), 12);
        assert!(topology.contains_joint(LeftShoulder));
        assert!(topology.contains_joint(RightAnkle));
        assert!(!topology.contains_joint(Neck));
        assert!(!topology.contains_joint(Nose));
        assert_eq!(topology.joints().len(), 12);
    }

    #[test]
    fn test_neck_root_topology() {
        let topology = SkeletonTopology::new(TopologyKind::NeckRoot);
        assert_eq!(topology.bones().len(), 13);
        assert!(topology.contains_joint(Neck));
        assert!(topology.contains_joint(Root));
        assert!(topology.contains_joint(LeftHip));
        assert!(!topology.contains_joint(LeftEye));
        assert_eq!(topology.joints().len(), 14);
    }

    #[test]
    fn test_topologies_do_not_share_bone_sets() {
        let a = SkeletonTopology::new(TopologyKind::ShoulderHip);
        let b = SkeletonTopology::new(TopologyKind::NeckRoot);
        assert!(a.bones().iter().all(|bone| !bone.touches(Neck) && !bone.touches(Root)));
        assert!(!b.bones().contains(&Bone::new(LeftShoulder, RightShoulder)));
    }

    #[test]
    fn test_bones_have_no_duplicates() {
        for kind in [TopologyKind::ShoulderHip, TopologyKind::NeckRoot] {
            let bones = SkeletonTopology::new(kind).bones();
            for (i, a) in bones.iter().enumerate() {
                assert!(bones[i + 1..].iter().all(|b| b != a), "{:?} duplicated", a);
            }
        }
    }
}
