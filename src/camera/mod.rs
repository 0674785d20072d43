//! Camera capture module
//!
//! Defines the frame-delivery contract between a capture device and the
//! processing pipeline. Sources deliver frames from their own thread through a
//! [`FrameSink`]; the sink never blocks on processing.

#[cfg(feature = "native-camera")]
pub mod native;
pub mod synthetic;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

#[cfg(feature = "native-camera")]
pub use native::NativeCamera;
pub use synthetic::SyntheticCamera;

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
}

impl CameraPosition {
    pub fn flipped(self) -> Self {
        match self {
            CameraPosition::Back => CameraPosition::Front,
            CameraPosition::Front => CameraPosition::Back,
        }
    }
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Front => write!(f, "front"),
        }
    }
}

/// Negotiated output format of a started source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
}

/// Camera frame data
#[derive(Clone)]
pub struct CameraFrame {
    /// RGBA pixels, shared so hand-off between lanes never copies
    pub image: Arc<RgbaImage>,
    /// Frame number
    pub frame_number: u64,
    /// Frame timestamp
    pub timestamp: Instant,
    /// Camera that produced the frame
    pub position: CameraPosition,
}

impl CameraFrame {
    pub fn new(image: RgbaImage, frame_number: u64, position: CameraPosition) -> Self {
        Self {
            image: Arc::new(image),
            frame_number,
            timestamp: Instant::now(),
            position,
        }
    }

    /// Single-color frame
    pub fn solid(
        width: u32,
        height: u32,
        rgba: [u8; 4],
        frame_number: u64,
        position: CameraPosition,
    ) -> Self {
        Self::new(
            RgbaImage::from_pixel(width, height, Rgba(rgba)),
            frame_number,
            position,
        )
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA bytes
    pub fn raw(&self) -> &[u8] {
        self.image.as_raw()
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("frame_number", &self.frame_number)
            .field("position", &self.position)
            .finish()
    }
}

/// Receives frames on the capture thread
#[derive(Clone)]
pub struct FrameSink {
    deliver: Arc<dyn Fn(CameraFrame) + Send + Sync>,
}

impl FrameSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(CameraFrame) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Hand a frame to the consumer. Returns immediately.
    pub fn deliver(&self, frame: CameraFrame) {
        (self.deliver)(frame)
    }
}

impl fmt::Debug for FrameSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSink").finish_non_exhaustive()
    }
}

/// A capture device.
///
/// Calls are serialized by the capture session; implementations never see
/// two lifecycle calls at once.
pub trait CaptureSource: Send {
    /// Select the device for `position`. Fails if it has no usable input.
    fn configure(&mut self, position: CameraPosition) -> Result<(), CaptureError>;

    /// Begin delivering frames to `sink` from a capture thread
    fn start(&mut self, sink: FrameSink) -> Result<FrameFormat, CaptureError>;

    /// Stop delivery. No frame reaches the sink once this returns.
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_position_flip() {
        assert_eq!(CameraPosition::Back.flipped(), CameraPosition::Front);
        assert_eq!(CameraPosition::Front.flipped().flipped(), CameraPosition::Front);
        assert_eq!(CameraPosition::default(), CameraPosition::Back);
    }

    #[test]
    fn test_solid_frame() {
        let frame = CameraFrame::solid(8, 4, [10, 20, 30, 255], 7, CameraPosition::Front);
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.raw().len(), 8 * 4 * 4);
        assert_eq!(&frame.raw()[..4], &[10, 20, 30, 255]);
        assert_eq!(frame.frame_number, 7);
    }

    #[test]
    fn test_sink_delivers() {
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();
        let sink = FrameSink::new(move |frame| {
            count_clone.fetch_add(frame.frame_number, Ordering::Relaxed);
        });
        sink.deliver(CameraFrame::solid(1, 1, [0; 4], 3, CameraPosition::Back));
        sink.clone().deliver(CameraFrame::solid(1, 1, [0; 4], 4, CameraPosition::Back));
        assert_eq!(count.load(Ordering::Relaxed), 7);
    }
}
