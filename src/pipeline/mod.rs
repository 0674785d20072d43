//! Frame pipeline controller
//!
//! Three lanes cooperate:
//! - the capture source's thread delivers frames into a single-slot buffer,
//! - the `pose-detection` thread runs the analyzer on the pending frame,
//!   renders the overlay and publishes a snapshot,
//! - the `camera-session` thread serializes setup/start/stop/flip.
//!
//! Results are published as a whole `Arc<OverlaySnapshot>`. Publishing and
//! overlay resets both happen under the renderer lock, and a result is only
//! published if its epoch is still current, so nothing from a stopped or
//! flipped session shows up afterwards.

mod session;
pub mod slot;
pub mod stats;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::camera::{CameraFrame, CameraPosition, CaptureSource, FrameFormat, FrameSink};
use crate::config::OverlayConfig;
use crate::error::{CaptureError, SessionError};
use crate::geometry::DisplayGeometry;
use crate::pose::{FrameAnalysis, FrameAnalyzer, LeanDirection, SkeletonTopology};
use crate::render::{OverlayRenderer, OverlayShapes, OverlayStyle};
use crate::sensor::TiltMonitor;

use session::{CaptureSession, SessionCommand, SessionOp};
pub use slot::{BacklogPolicy, FrameSlot, Offer};
pub use stats::PipelineStats;
use stats::FrameCounters;

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Configuring,
    Running,
    Stopping,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Configuring => "configuring",
            PipelineState::Running => "running",
            PipelineState::Stopping => "stopping",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the display side needs for one overlay update
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    /// Session epoch the result belongs to
    pub epoch: u64,
    /// Source frame, `None` after a reset
    pub frame_number: Option<u64>,
    pub position: CameraPosition,
    pub analysis: FrameAnalysis,
    pub shapes: OverlayShapes,
    /// Advisory device tilt at publication time
    pub tilting: bool,
}

impl OverlaySnapshot {
    pub fn lean(&self) -> LeanDirection {
        self.analysis.lean()
    }
}

/// Pipeline construction parameters
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub topology: SkeletonTopology,
    pub style: OverlayStyle,
    pub backlog_policy: BacklogPolicy,
    pub drain_timeout: Duration,
    pub initial_camera: CameraPosition,
    pub tilt_monitor: Arc<TiltMonitor>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            topology: SkeletonTopology::default(),
            style: OverlayStyle::default(),
            backlog_policy: BacklogPolicy::default(),
            drain_timeout: Duration::from_millis(500),
            initial_camera: CameraPosition::Back,
            tilt_monitor: Arc::new(TiltMonitor::default()),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &OverlayConfig) -> Self {
        Self {
            topology: config.topology(),
            style: config.overlay_style(),
            backlog_policy: config.pipeline.backlog_policy,
            drain_timeout: Duration::from_millis(config.pipeline.drain_timeout_ms),
            initial_camera: config.pipeline.initial_camera,
            tilt_monitor: Arc::new(TiltMonitor::new(config.tilt.threshold_degrees)),
        }
    }
}

/// State shared by the three lanes
pub(crate) struct Shared {
    slot: FrameSlot,
    /// Also the publication lock: the snapshot is only written while held
    renderer: Mutex<OverlayRenderer>,
    snapshot: Mutex<Arc<OverlaySnapshot>>,
    state: Mutex<PipelineState>,
    position: Mutex<CameraPosition>,
    format: Mutex<Option<FrameFormat>>,
    /// Analysis published after a reset
    empty: FrameAnalysis,
    tilt: Arc<TiltMonitor>,
    counters: FrameCounters,
}

impl Shared {
    fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    fn set_state(&self, state: PipelineState) {
        let mut current = self.state.lock();
        if *current != state {
            log::debug!("Pipeline {} -> {}", *current, state);
            *current = state;
        }
    }

    fn camera_position(&self) -> CameraPosition {
        *self.position.lock()
    }

    fn set_camera_position(&self, position: CameraPosition) {
        *self.position.lock() = position;
    }

    fn set_frame_format(&self, format: Option<FrameFormat>) {
        *self.format.lock() = format;
    }

    /// Sink bound to `epoch`; goes stale when the epoch ends
    fn sink(self: &Arc<Self>, epoch: u64) -> FrameSink {
        let shared = Arc::clone(self);
        FrameSink::new(move |frame| shared.offer(frame, epoch))
    }

    fn offer(&self, frame: CameraFrame, epoch: u64) {
        self.counters.delivered();
        let frame_number = frame.frame_number;
        match self.slot.offer(frame, epoch) {
            Offer::Accepted => {}
            Offer::Replaced => self.counters.replaced(),
            Offer::Dropped => {
                self.counters.dropped();
                log::trace!("Dropped frame {} (detection busy)", frame_number);
            }
            Offer::Stale => {
                self.counters.stale();
                log::debug!("Ignored frame {} from ended session epoch {}", frame_number, epoch);
            }
        }
    }

    fn store_snapshot(&self, renderer: &OverlayRenderer, snapshot: OverlaySnapshot) {
        debug_assert_eq!(&snapshot.shapes, renderer.shapes());
        *self.snapshot.lock() = Arc::new(snapshot);
    }

    /// Render and publish a result if its epoch is still current
    fn publish(&self, epoch: u64, frame: &CameraFrame, analysis: FrameAnalysis) -> bool {
        let mut renderer = self.renderer.lock();
        if self.slot.current_epoch() != epoch {
            return false;
        }
        renderer.render(&analysis);
        let snapshot = OverlaySnapshot {
            epoch,
            frame_number: Some(frame.frame_number),
            position: frame.position,
            analysis,
            shapes: renderer.shapes().clone(),
            tilting: self.tilt.is_tilting(),
        };
        self.store_snapshot(&renderer, snapshot);
        true
    }

    /// Publish a visibly empty overlay for `position`
    fn reset_overlay(&self, position: CameraPosition) {
        let mut renderer = self.renderer.lock();
        renderer.reset();
        let snapshot = OverlaySnapshot {
            epoch: self.slot.current_epoch(),
            frame_number: None,
            position,
            analysis: self.empty.clone(),
            shapes: OverlayShapes::default(),
            tilting: self.tilt.is_tilting(),
        };
        self.store_snapshot(&renderer, snapshot);
    }

    fn set_display_geometry(&self, geometry: DisplayGeometry) {
        let mut renderer = self.renderer.lock();
        renderer.set_display_geometry(geometry);
        let previous = Arc::clone(&self.snapshot.lock());
        let snapshot = OverlaySnapshot {
            shapes: renderer.shapes().clone(),
            tilting: self.tilt.is_tilting(),
            ..(*previous).clone()
        };
        self.store_snapshot(&renderer, snapshot);
    }
}

/// Per-frame overlay pipeline bound to one capture source and one analyzer
pub struct FramePipeline {
    shared: Arc<Shared>,
    commands: Option<Sender<SessionCommand>>,
    session_thread: Option<std::thread::JoinHandle<()>>,
    processing_thread: Option<std::thread::JoinHandle<()>>,
}

impl FramePipeline {
    /// Spawn the session and processing threads. Capture starts with [`setup`](Self::setup).
    pub fn new(
        source: Box<dyn CaptureSource>,
        analyzer: Box<dyn FrameAnalyzer>,
        options: PipelineOptions,
    ) -> Result<Self, SessionError> {
        let empty = analyzer.empty();
        let initial = OverlaySnapshot {
            epoch: 0,
            frame_number: None,
            position: options.initial_camera,
            analysis: empty.clone(),
            shapes: OverlayShapes::default(),
            tilting: options.tilt_monitor.is_tilting(),
        };

        let shared = Arc::new(Shared {
            slot: FrameSlot::new(options.backlog_policy),
            renderer: Mutex::new(OverlayRenderer::new(options.topology, options.style)),
            snapshot: Mutex::new(Arc::new(initial)),
            state: Mutex::new(PipelineState::Idle),
            position: Mutex::new(options.initial_camera),
            format: Mutex::new(None),
            empty,
            tilt: options.tilt_monitor,
            counters: FrameCounters::default(),
        });

        let processing_shared = shared.clone();
        let processing_thread = std::thread::Builder::new()
            .name("pose-detection".to_string())
            .spawn(move || Self::processing_thread(processing_shared, analyzer))
            .map_err(|e| CaptureError::ThreadSpawn(format!("processing thread: {}", e)))?;

        let (command_sender, command_receiver) = crossbeam_channel::unbounded();
        let session = CaptureSession::new(source, shared.clone(), options.drain_timeout);
        let session_thread = match std::thread::Builder::new()
            .name("camera-session".to_string())
            .spawn(move || session.run(command_receiver))
        {
            Ok(handle) => handle,
            Err(e) => {
                shared.slot.shutdown();
                let _ = processing_thread.join();
                return Err(CaptureError::ThreadSpawn(format!("session thread: {}", e)).into());
            }
        };

        Ok(Self {
            shared,
            commands: Some(command_sender),
            session_thread: Some(session_thread),
            processing_thread: Some(processing_thread),
        })
    }

    /// Processing thread main loop
    fn processing_thread(shared: Arc<Shared>, mut analyzer: Box<dyn FrameAnalyzer>) {
        log::info!("Pose detection thread started");
        let mut last_lean = LeanDirection::Unknown;

        while let Some((frame, epoch)) = shared.slot.take() {
            let analysis = match analyzer.analyze(&frame) {
                Ok(analysis) => analysis,
                Err(e) => {
                    log::warn!("Detection failed on frame {}: {}", frame.frame_number, e);
                    shared.counters.detection_failed();
                    analyzer.empty()
                }
            };

            let lean = analysis.lean();
            if shared.publish(epoch, &frame, analysis) {
                shared.counters.processed();
                if lean != last_lean {
                    log::debug!("{}", lean.display_name());
                    last_lean = lean;
                }
            } else {
                shared.counters.discarded();
                log::debug!(
                    "Discarded result for frame {} from ended epoch {}",
                    frame.frame_number,
                    epoch
                );
            }

            shared.slot.finish();
        }

        log::info!("Pose detection thread stopped");
    }

    fn request(&self, op: SessionOp) -> Result<(), SessionError> {
        let commands = self.commands.as_ref().ok_or(SessionError::Closed)?;
        let (reply, response) = crossbeam_channel::bounded(1);
        commands
            .send(SessionCommand { op, reply })
            .map_err(|_| SessionError::Closed)?;
        response.recv().map_err(|_| SessionError::Closed)?
    }

    /// Acquire the camera and start processing
    pub fn setup(&self) -> Result<(), SessionError> {
        self.request(SessionOp::Setup)
    }

    /// Resume after [`stop`](Self::stop)
    pub fn start(&self) -> Result<(), SessionError> {
        self.request(SessionOp::Start)
    }

    /// Stop capture. No detection starts after this returns.
    pub fn stop(&self) -> Result<(), SessionError> {
        self.request(SessionOp::Stop)
    }

    /// Switch between back and front camera
    pub fn flip(&self) -> Result<(), SessionError> {
        self.request(SessionOp::Flip)
    }

    /// Renderer boundary: new surface layout
    pub fn set_display_geometry(&self, geometry: DisplayGeometry) {
        self.shared.set_display_geometry(geometry);
    }

    /// Latest published overlay
    pub fn latest_snapshot(&self) -> Arc<OverlaySnapshot> {
        Arc::clone(&self.shared.snapshot.lock())
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    pub fn camera_position(&self) -> CameraPosition {
        self.shared.camera_position()
    }

    /// Output format of the running capture source
    pub fn frame_format(&self) -> Option<FrameFormat> {
        *self.shared.format.lock()
    }

    pub fn backlog_policy(&self) -> BacklogPolicy {
        self.shared.slot.policy()
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    /// Feed sensor updates here
    pub fn tilt_monitor(&self) -> &Arc<TiltMonitor> {
        &self.shared.tilt
    }

    pub fn tilt_warning(&self) -> bool {
        self.shared.tilt.is_tilting()
    }

    /// Stop the session and join every thread
    pub fn shutdown(&mut self) {
        if let Some(commands) = self.commands.take() {
            let (reply, response) = crossbeam_channel::bounded(1);
            if commands
                .send(SessionCommand {
                    op: SessionOp::Shutdown,
                    reply,
                })
                .is_ok()
            {
                let _ = response.recv();
            }
        }
        if let Some(handle) = self.session_thread.take() {
            let _ = handle.join();
        }

        self.shared.slot.shutdown();
        if let Some(handle) = self.processing_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
