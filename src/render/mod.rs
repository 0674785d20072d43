//! Overlay rendering
//!
//! Produces resolution-independent shapes in view space. Drawing them is left
//! to whatever surface hosts the camera preview.

pub mod overlay;
pub mod vertex;

pub use overlay::{BoneSegment, Marker, MarkerKind, OverlayRenderer, OverlayShapes, OverlayStyle};
pub use vertex::{CircleInstance, LineVertex};
