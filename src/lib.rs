//! Posture Overlay - skeletal overlay and lean classification for live camera input
//!
//! Captures camera frames on a background thread, runs an injected pose or hand
//! detector on a processing thread, filters the detected joints against a fixed
//! skeleton, classifies the subject's lean and renders an overlay in view space.

pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod pose;
pub mod render;
pub mod sensor;

pub use config::OverlayConfig;
pub use error::{CaptureError, ConfigError, DetectionError, GeometryError, SessionError};
pub use pipeline::{FramePipeline, OverlaySnapshot, PipelineState};
