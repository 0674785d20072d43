//! GPU-ready overlay data
//!
//! Circles become one instance each; bone segments become line-list vertex
//! pairs. Both are plain `#[repr(C)]` records that upload with `cast_slice`.

use bytemuck::{Pod, Zeroable};

use super::OverlayShapes;

/// Circle instance for an instanced quad draw
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub _pad: f32,
}

/// Line-list vertex (two per segment)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 2],
    pub width: f32,
    pub _pad: f32,
}

impl OverlayShapes {
    pub fn circle_instances(&self) -> Vec<CircleInstance> {
        self.markers
            .iter()
            .map(|m| CircleInstance {
                center: [m.center.x as f32, m.center.y as f32],
                radius: m.radius as f32,
                _pad: 0.0,
            })
            .collect()
    }

    pub fn line_vertices(&self) -> Vec<LineVertex> {
        self.segments
            .iter()
            .flat_map(|s| {
                let width = s.width as f32;
                [
                    LineVertex {
                        pos: [s.start.x as f32, s.start.y as f32],
                        width,
                        _pad: 0.0,
                    },
                    LineVertex {
                        pos: [s.end.x as f32, s.end.y as f32],
                        width,
                        _pad: 0.0,
                    },
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2D;
    use crate::pose::JointName;
    use crate::render::{BoneSegment, Marker, MarkerKind};

    #[test]
    fn test_vertex_export() {
        let shapes = OverlayShapes {
            markers: vec![Marker {
                kind: MarkerKind::Joint(JointName::LeftHip),
                center: Point2D::new(10.0, 20.0),
                radius: 3.0,
            }],
            segments: vec![BoneSegment {
                from: JointName::LeftHip,
                to: JointName::RightHip,
                start: Point2D::new(10.0, 20.0),
                end: Point2D::new(30.0, 20.0),
                width: 2.0,
            }],
        };

        let circles = shapes.circle_instances();
        assert_eq!(circles, vec![CircleInstance { center: [10.0, 20.0], radius: 3.0, _pad: 0.0 }]);

        let lines = shapes.line_vertices();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].pos, [30.0, 20.0]);

        let bytes: &[u8] = bytemuck::cast_slice(&lines);
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<LineVertex>());
        assert_eq!(std::mem::size_of::<CircleInstance>(), 16);
    }
}
