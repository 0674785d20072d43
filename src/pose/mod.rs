//! Pose data, skeleton topology, filtering and classification

pub mod detector;
pub mod filter;
pub mod hand;
pub mod joint;
pub mod topology;

pub use detector::{
    BodyAnalyzer, FrameAnalysis, FrameAnalyzer, HandAnalyzer, HandPoseDetector, PoseDetector,
};
pub use filter::{
    classify_lean, classify_offset, torso_offset, FilteredJointMap, JointFilter, LeanDirection,
};
pub use hand::HandPointTracker;
pub use joint::{HandJointName, HandObservation, JointName, JointObservation, NormalizedPoint};
pub use topology::{Bone, SkeletonTopology, TopologyKind};
