//! Detector boundary and per-frame analyzers
//!
//! The inference model itself lives outside this crate. Anything that can turn
//! a frame into named landmarks with confidences plugs in here.

use super::{
    FilteredJointMap, HandObservation, HandPointTracker, JointFilter, JointObservation,
    LeanDirection, NormalizedPoint,
};
use crate::camera::CameraFrame;
use crate::error::DetectionError;

/// Body pose detector
pub trait PoseDetector: Send {
    fn detect(&mut self, frame: &CameraFrame) -> Result<Vec<JointObservation>, DetectionError>;
}

impl<F> PoseDetector for F
where
    F: FnMut(&CameraFrame) -> Result<Vec<JointObservation>, DetectionError> + Send,
{
    fn detect(&mut self, frame: &CameraFrame) -> Result<Vec<JointObservation>, DetectionError> {
        self(frame)
    }
}

/// Hand pose detector (first hand only)
pub trait HandPoseDetector: Send {
    fn detect_hand(&mut self, frame: &CameraFrame) -> Result<Vec<HandObservation>, DetectionError>;
}

impl<F> HandPoseDetector for F
where
    F: FnMut(&CameraFrame) -> Result<Vec<HandObservation>, DetectionError> + Send,
{
    fn detect_hand(&mut self, frame: &CameraFrame) -> Result<Vec<HandObservation>, DetectionError> {
        self(frame)
    }
}

/// Result of analyzing a single frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameAnalysis {
    Body {
        joints: FilteredJointMap,
        lean: LeanDirection,
    },
    Hand {
        point: Option<NormalizedPoint>,
    },
}

impl FrameAnalysis {
    pub fn empty_body() -> Self {
        FrameAnalysis::Body {
            joints: FilteredJointMap::new(),
            lean: LeanDirection::Unknown,
        }
    }

    pub fn empty_hand() -> Self {
        FrameAnalysis::Hand { point: None }
    }

    /// Nothing to draw
    pub fn is_empty(&self) -> bool {
        match self {
            FrameAnalysis::Body { joints, .. } => joints.is_empty(),
            FrameAnalysis::Hand { point } => point.is_none(),
        }
    }

    pub fn lean(&self) -> LeanDirection {
        match self {
            FrameAnalysis::Body { lean, .. } => *lean,
            FrameAnalysis::Hand { .. } => LeanDirection::Unknown,
        }
    }
}

/// Detection plus interpretation for one tracking mode
pub trait FrameAnalyzer: Send {
    fn analyze(&mut self, frame: &CameraFrame) -> Result<FrameAnalysis, DetectionError>;

    /// Outcome used when detection fails or the frame has no subject
    fn empty(&self) -> FrameAnalysis;
}

/// Full-body analyzer: filter joints and classify lean
pub struct BodyAnalyzer<D> {
    detector: D,
    filter: JointFilter,
}

impl<D: PoseDetector> BodyAnalyzer<D> {
    pub fn new(detector: D, filter: JointFilter) -> Self {
        Self { detector, filter }
    }

    pub fn filter(&self) -> &JointFilter {
        &self.filter
    }
}

impl<D: PoseDetector> FrameAnalyzer for BodyAnalyzer<D> {
    fn analyze(&mut self, frame: &CameraFrame) -> Result<FrameAnalysis, DetectionError> {
        let observations = self.detector.detect(frame)?;
        let (joints, lean) = self.filter.analyze(&observations);
        Ok(FrameAnalysis::Body { joints, lean })
    }

    fn empty(&self) -> FrameAnalysis {
        FrameAnalysis::empty_body()
    }
}

/// Hand analyzer: a single tracked landmark
pub struct HandAnalyzer<D> {
    detector: D,
    tracker: HandPointTracker,
}

impl<D: HandPoseDetector> HandAnalyzer<D> {
    pub fn new(detector: D, tracker: HandPointTracker) -> Self {
        Self { detector, tracker }
    }
}

impl<D: HandPoseDetector> FrameAnalyzer for HandAnalyzer<D> {
    fn analyze(&mut self, frame: &CameraFrame) -> Result<FrameAnalysis, DetectionError> {
        let observations = self.detector.detect_hand(frame)?;
        Ok(FrameAnalysis::Hand {
            point: self.tracker.track(&observations),
        })
    }

    fn empty(&self) -> FrameAnalysis {
        FrameAnalysis::empty_hand()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraFrame, CameraPosition};
    use crate::pose::{HandJointName, JointName};

    fn frame() -> CameraFrame {
        CameraFrame::solid(4, 4, [0, 0, 0, 255], 0, CameraPosition::Back)
    }

    #[test]
    fn test_body_analyzer_filters_and_classifies() {
        let detector = |_: &CameraFrame| -> Result<Vec<JointObservation>, DetectionError> {
            Ok(vec![
                JointObservation::new(JointName::LeftShoulder, 0.3, 0.8, 0.9),
                JointObservation::new(JointName::RightShoulder, 0.7, 0.8, 0.9),
                JointObservation::new(JointName::LeftHip, 0.35, 0.2, 0.9),
                JointObservation::new(JointName::RightHip, 0.9, 0.2, 0.9),
                JointObservation::new(JointName::Nose, 0.5, 0.95, 0.9),
            ])
        };
        let mut analyzer = BodyAnalyzer::new(detector, JointFilter::default());
        let analysis = analyzer.analyze(&frame()).unwrap();
        match analysis {
            FrameAnalysis::Body { joints, lean } => {
                assert_eq!(joints.len(), 4);
                assert_eq!(lean, LeanDirection::Left);
            }
            other => panic!("unexpected analysis {:?}", other),
        }
    }

    #[test]
    fn test_body_analyzer_propagates_failure() {
        let detector = |_: &CameraFrame| -> Result<Vec<JointObservation>, DetectionError> {
            Err(DetectionError::Inference("model not loaded".to_string()))
        };
        let mut analyzer = BodyAnalyzer::new(detector, JointFilter::default());
        assert!(analyzer.analyze(&frame()).is_err());
        assert!(analyzer.empty().is_empty());
        assert_eq!(analyzer.empty().lean(), LeanDirection::Unknown);
    }

    #[test]
    fn test_hand_analyzer() {
        let detector = |_: &CameraFrame| -> Result<Vec<HandObservation>, DetectionError> {
            Ok(vec![HandObservation::new(HandJointName::MiddleMcp, 0.25, 0.75, 0.6)])
        };
        let mut analyzer = HandAnalyzer::new(detector, HandPointTracker::default());
        assert_eq!(
            analyzer.analyze(&frame()).unwrap(),
            FrameAnalysis::Hand {
                point: Some(NormalizedPoint::new(0.25, 0.75))
            }
        );
        assert_eq!(analyzer.empty(), FrameAnalysis::empty_hand());
    }
}
