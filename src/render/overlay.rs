//! Joint markers and bone segments

use crate::geometry::{CoordinateMapper, DisplayGeometry, Point2D};
use crate::pose::{FilteredJointMap, FrameAnalysis, JointName, NormalizedPoint, SkeletonTopology};

/// Sizes used when building shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Joint circle radius in view pixels
    pub joint_radius: f64,
    /// Bone stroke width in view pixels
    pub bone_width: f64,
    /// Hand marker circle radius
    pub hand_marker_radius: f64,
    /// Hand marker shift down the view, in pixels
    pub hand_marker_offset: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            joint_radius: 3.0,
            bone_width: 2.0,
            hand_marker_radius: 10.0,
            hand_marker_offset: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Joint(JointName),
    Hand,
}

/// Filled circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub center: Point2D,
    pub radius: f64,
}

/// Line between two joints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneSegment {
    pub from: JointName,
    pub to: JointName,
    pub start: Point2D,
    pub end: Point2D,
    pub width: f64,
}

/// Render-ready shape set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayShapes {
    pub markers: Vec<Marker>,
    pub segments: Vec<BoneSegment>,
}

impl OverlayShapes {
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.segments.is_empty()
    }

    pub fn shape_count(&self) -> usize {
        self.markers.len() + self.segments.len()
    }

    pub fn joint_marker(&self, joint: JointName) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind == MarkerKind::Joint(joint))
    }

    pub fn hand_marker(&self) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind == MarkerKind::Hand)
    }

    pub fn has_segment(&self, a: JointName, b: JointName) -> bool {
        self.segments
            .iter()
            .any(|s| (s.from == a && s.to == b) || (s.from == b && s.to == a))
    }
}

/// What the renderer last received, kept so a geometry change can re-render
#[derive(Debug, Clone, Default)]
enum Content {
    #[default]
    Empty,
    Joints(FilteredJointMap),
    Hand(NormalizedPoint),
}

/// Builds overlay shapes from filtered joints and the active topology
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    topology: SkeletonTopology,
    mapper: CoordinateMapper,
    style: OverlayStyle,
    content: Content,
    shapes: OverlayShapes,
}

impl OverlayRenderer {
    pub fn new(topology: SkeletonTopology, style: OverlayStyle) -> Self {
        Self {
            topology,
            mapper: CoordinateMapper::default(),
            style,
            content: Content::Empty,
            shapes: OverlayShapes::default(),
        }
    }

    pub fn topology(&self) -> &SkeletonTopology {
        &self.topology
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn shapes(&self) -> &OverlayShapes {
        &self.shapes
    }

    /// Replace the joint set and rebuild every shape
    pub fn set_joints(&mut self, joints: FilteredJointMap) {
        self.content = if joints.is_empty() {
            Content::Empty
        } else {
            Content::Joints(joints)
        };
        self.rebuild();
    }

    /// Show or hide the single hand marker
    pub fn set_hand_point(&mut self, point: Option<NormalizedPoint>) {
        self.content = match point {
            Some(point) => Content::Hand(point),
            None => Content::Empty,
        };
        self.rebuild();
    }

    /// Re-map the current content for a new surface layout
    pub fn set_display_geometry(&mut self, geometry: DisplayGeometry) {
        self.mapper = CoordinateMapper::new(geometry);
        self.rebuild();
    }

    pub fn render(&mut self, analysis: &FrameAnalysis) {
        match analysis {
            FrameAnalysis::Body { joints, .. } => self.set_joints(joints.clone()),
            FrameAnalysis::Hand { point } => self.set_hand_point(*point),
        }
    }

    /// Clear all shapes; the overlay is visibly empty afterwards
    pub fn reset(&mut self) {
        self.content = Content::Empty;
        self.shapes = OverlayShapes::default();
    }

    fn rebuild(&mut self) {
        self.shapes = match &self.content {
            Content::Empty => OverlayShapes::default(),
            Content::Joints(joints) => self.skeleton_shapes(joints),
            Content::Hand(point) => self.hand_shapes(*point),
        };
    }

    fn skeleton_shapes(&self, joints: &FilteredJointMap) -> OverlayShapes {
        let markers = joints
            .iter()
            .map(|(name, point)| Marker {
                kind: MarkerKind::Joint(name),
                center: self.mapper.map(point),
                radius: self.style.joint_radius,
            })
            .collect();

        // Bones with a missing endpoint are skipped, never drawn partially
        let segments = self
            .topology
            .bones()
            .iter()
            .filter_map(|bone| {
                let (from, to) = bone.endpoints();
                let start = joints.get(from)?;
                let end = joints.get(to)?;
                Some(BoneSegment {
                    from,
                    to,
                    start: self.mapper.map(start),
                    end: self.mapper.map(end),
                    width: self.style.bone_width,
                })
            })
            .collect();

        OverlayShapes { markers, segments }
    }

    fn hand_shapes(&self, point: NormalizedPoint) -> OverlayShapes {
        let mut center = self.mapper.map(point);
        center.y += self.style.hand_marker_offset;
        OverlayShapes {
            markers: vec![Marker {
                kind: MarkerKind::Hand,
                center,
                radius: self.style.hand_marker_radius,
            }],
            segments: Vec::new(),
        }
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(SkeletonTopology::default(), OverlayStyle::default())
    }
}
