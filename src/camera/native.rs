//! Native camera capture using the nokhwa crate
//!
//! The device is opened on the capture thread; the open result is reported
//! back to `start` so a missing or busy camera surfaces as a [`CaptureError`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use super::{CameraFrame, CameraPosition, CaptureSource, FrameFormat, FrameSink};
use crate::error::CaptureError;

/// Hardware camera with one device index per position
pub struct NativeCamera {
    back_index: u32,
    front_index: u32,
    selected: Option<(CameraPosition, u32)>,
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl NativeCamera {
    pub fn new(back_index: u32, front_index: u32) -> Self {
        Self {
            back_index,
            front_index,
            selected: None,
            running: Arc::new(AtomicBool::new(false)),
            frame_count: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Names of the cameras the platform reports
    pub fn list_cameras() -> Vec<String> {
        match nokhwa::query(ApiBackend::Auto) {
            Ok(cameras) => cameras.iter().map(|info| info.human_name().to_string()).collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    fn open(index: u32) -> Result<Camera, CaptureError> {
        let index = CameraIndex::Index(index);
        let attempts = [
            RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
            RequestedFormatType::AbsoluteHighestResolution,
            RequestedFormatType::None,
        ];

        let mut last_error = String::new();
        for attempt in attempts {
            match Camera::new(index.clone(), RequestedFormat::new::<RgbAFormat>(attempt)) {
                Ok(mut camera) => {
                    camera
                        .open_stream()
                        .map_err(|e| CaptureError::OutputUnavailable(format!("{:?}", e)))?;
                    return Ok(camera);
                }
                Err(e) => {
                    log::warn!("Failed to open camera with {:?}: {:?}", attempt, e);
                    last_error = format!("{:?}", e);
                }
            }
        }
        Err(CaptureError::InputUnavailable(last_error))
    }

    fn capture_loop(
        mut camera: Camera,
        position: CameraPosition,
        sink: FrameSink,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        while running.load(Ordering::Acquire) {
            let buffer = match camera.frame() {
                Ok(buffer) => buffer,
                Err(e) => {
                    log::warn!("Failed to capture frame: {:?}", e);
                    std::thread::sleep(Duration::from_millis(10));
                    continue;
                }
            };

            let resolution = buffer.resolution();
            let decoded = match buffer.decode_image::<RgbAFormat>() {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::warn!("Failed to decode frame: {:?}", e);
                    continue;
                }
            };

            let (width, height) = (resolution.width(), resolution.height());
            let Some(image) = RgbaImage::from_raw(width, height, decoded.into_raw()) else {
                log::warn!("Decoded frame does not match {}x{}", width, height);
                continue;
            };

            let frame_number = frame_count.fetch_add(1, Ordering::Relaxed);
            sink.deliver(CameraFrame::new(image, frame_number, position));
        }

        if let Err(e) = camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {:?}", e);
        }
        log::info!("Camera capture thread stopped");
    }
}

impl CaptureSource for NativeCamera {
    fn configure(&mut self, position: CameraPosition) -> Result<(), CaptureError> {
        let index = match position {
            CameraPosition::Back => self.back_index,
            CameraPosition::Front => self.front_index,
        };
        let cameras = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| CaptureError::InputUnavailable(format!("{:?}", e)))?;
        if index as usize >= cameras.len() {
            return Err(CaptureError::InputUnavailable(format!(
                "no {} camera at index {} ({} found)",
                position,
                index,
                cameras.len()
            )));
        }
        self.selected = Some((position, index));
        Ok(())
    }

    fn start(&mut self, sink: FrameSink) -> Result<FrameFormat, CaptureError> {
        let (position, index) = self
            .selected
            .ok_or_else(|| CaptureError::OutputUnavailable("camera not configured".to_string()))?;

        self.stop();
        self.running.store(true, Ordering::Release);

        let running = self.running.clone();
        let frame_count = self.frame_count.clone();
        let (ready_tx, ready_rx) =
            crossbeam_channel::bounded::<Result<FrameFormat, CaptureError>>(1);

        let handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                log::info!("Starting camera capture thread ({} camera {})", position, index);
                let camera = match Self::open(index) {
                    Ok(camera) => camera,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let resolution = camera.resolution();
                log::info!(
                    "Camera opened: {} ({}x{})",
                    camera.info().human_name(),
                    resolution.width(),
                    resolution.height()
                );
                let _ = ready_tx.send(Ok(FrameFormat {
                    width: resolution.width(),
                    height: resolution.height(),
                }));
                Self::capture_loop(camera, position, sink, running, frame_count);
            })
            .map_err(|e| CaptureError::ThreadSpawn(e.to_string()))?;

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(CaptureError::OutputUnavailable(
                "capture thread exited".to_string(),
            ))
        });
        match ready {
            Ok(format) => {
                self.thread_handle = Some(handle);
                Ok(format)
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NativeCamera {
    fn drop(&mut self) {
        self.stop();
    }
}
