//! Synthetic camera producing solid test-pattern frames
//!
//! Used by the demo binary and tests where no capture hardware is present.
//! Back and front cameras produce different colors so a flip is visible.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{CameraFrame, CameraPosition, CaptureSource, FrameFormat, FrameSink};
use crate::error::CaptureError;

/// Frame generator running on a background thread
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    frame_interval: Duration,
    available: Vec<CameraPosition>,
    position: Option<CameraPosition>,
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl SyntheticCamera {
    /// Both cameras available
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self::with_positions(width, height, fps, vec![CameraPosition::Back, CameraPosition::Front])
    }

    /// Only the given cameras can be configured
    pub fn with_positions(
        width: u32,
        height: u32,
        fps: u32,
        available: Vec<CameraPosition>,
    ) -> Self {
        Self {
            width,
            height,
            frame_interval: Duration::from_nanos(1_000_000_000u64 / fps.max(1) as u64),
            available,
            position: None,
            running: Arc::new(AtomicBool::new(false)),
            frame_count: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Frames generated so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    fn color(position: CameraPosition) -> [u8; 4] {
        match position {
            CameraPosition::Back => [32, 96, 160, 255],
            CameraPosition::Front => [160, 96, 32, 255],
        }
    }
}

impl CaptureSource for SyntheticCamera {
    fn configure(&mut self, position: CameraPosition) -> Result<(), CaptureError> {
        if !self.available.contains(&position) {
            return Err(CaptureError::InputUnavailable(format!("no {} camera", position)));
        }
        self.position = Some(position);
        Ok(())
    }

    fn start(&mut self, sink: FrameSink) -> Result<FrameFormat, CaptureError> {
        let position = self
            .position
            .ok_or_else(|| CaptureError::OutputUnavailable("camera not configured".to_string()))?;

        // Restarting replaces any previous delivery thread
        self.stop();
        self.running.store(true, Ordering::Release);

        let running = self.running.clone();
        let frame_count = self.frame_count.clone();
        let (width, height, interval) = (self.width, self.height, self.frame_interval);
        let color = Self::color(position);

        let handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                log::info!("Synthetic {} camera started ({}x{})", position, width, height);
                while running.load(Ordering::Acquire) {
                    let frame_number = frame_count.fetch_add(1, Ordering::Relaxed);
                    sink.deliver(CameraFrame::solid(width, height, color, frame_number, position));
                    std::thread::sleep(interval);
                }
                log::info!("Synthetic {} camera stopped", position);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                CaptureError::ThreadSpawn(e.to_string())
            })?;
        self.thread_handle = Some(handle);

        Ok(FrameFormat { width, height })
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_unavailable_position() {
        let mut camera = SyntheticCamera::with_positions(4, 4, 30, vec![CameraPosition::Back]);
        assert!(camera.configure(CameraPosition::Back).is_ok());
        assert!(matches!(
            camera.configure(CameraPosition::Front),
            Err(CaptureError::InputUnavailable(_))
        ));
    }

    #[test]
    fn test_start_requires_configure() {
        let mut camera = SyntheticCamera::new(4, 4, 30);
        let result = camera.start(FrameSink::new(|_| {}));
        assert!(matches!(result, Err(CaptureError::OutputUnavailable(_))));
    }

    #[test]
    fn test_delivers_until_stopped() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let frames_clone = frames.clone();
        let mut camera = SyntheticCamera::new(4, 2, 200);
        camera.configure(CameraPosition::Front).unwrap();
        let format = camera
            .start(FrameSink::new(move |frame| frames_clone.lock().push(frame)))
            .unwrap();
        assert_eq!(format, FrameFormat { width: 4, height: 2 });

        std::thread::sleep(Duration::from_millis(50));
        camera.stop();
        let delivered = frames.lock().len();
        assert!(delivered > 0);
        assert!(frames.lock().iter().all(|f| f.position == CameraPosition::Front));

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(frames.lock().len(), delivered);
    }
}
