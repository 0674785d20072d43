//! Capture session lifecycle
//!
//! Setup, start, stop and flip run one at a time on the `camera-session`
//! thread, in the order they were requested. Callers block on a reply channel.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use super::{PipelineState, Shared};
use crate::camera::{CameraPosition, CaptureSource};
use crate::error::{CaptureError, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionOp {
    Setup,
    Start,
    Stop,
    Flip,
    Shutdown,
}

pub(crate) struct SessionCommand {
    pub op: SessionOp,
    pub reply: Sender<Result<(), SessionError>>,
}

pub(crate) struct CaptureSession {
    source: Box<dyn CaptureSource>,
    shared: Arc<Shared>,
    drain_timeout: Duration,
    /// Source configured for the current camera position
    configured: bool,
}

impl CaptureSession {
    pub fn new(
        source: Box<dyn CaptureSource>,
        shared: Arc<Shared>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            source,
            shared,
            drain_timeout,
            configured: false,
        }
    }

    /// Session thread main loop
    pub fn run(mut self, commands: Receiver<SessionCommand>) {
        log::info!("Capture session thread started");

        while let Ok(command) = commands.recv() {
            let result = match command.op {
                SessionOp::Setup => self.setup(),
                SessionOp::Start => self.start(),
                SessionOp::Stop => self.stop(),
                SessionOp::Flip => self.flip(),
                SessionOp::Shutdown => {
                    self.shutdown();
                    let _ = command.reply.send(Ok(()));
                    break;
                }
            };
            let _ = command.reply.send(result);
        }

        self.shutdown();
        log::info!("Capture session thread stopped");
    }

    fn setup(&mut self) -> Result<(), SessionError> {
        self.expect_state("set up", PipelineState::Idle)?;
        self.configured = false;
        self.launch()
    }

    fn start(&mut self) -> Result<(), SessionError> {
        let state = self.shared.state();
        if state == PipelineState::Running {
            return Ok(());
        }
        self.expect_state("start", PipelineState::Idle)?;
        self.launch()
    }

    fn stop(&mut self) -> Result<(), SessionError> {
        match self.shared.state() {
            PipelineState::Idle => Ok(()),
            PipelineState::Running => {
                self.shared.set_state(PipelineState::Stopping);
                self.halt(self.shared.camera_position());
                self.shared.set_state(PipelineState::Idle);
                Ok(())
            }
            state => Err(SessionError::InvalidState {
                operation: "stop",
                state: state.name(),
            }),
        }
    }

    fn flip(&mut self) -> Result<(), SessionError> {
        let previous = self.shared.camera_position();
        let position = previous.flipped();

        match self.shared.state() {
            PipelineState::Idle => {
                // Applied by the next setup or start
                self.shared.set_camera_position(position);
                self.configured = false;
                log::info!("Camera switched to {} (not running)", position);
                Ok(())
            }
            PipelineState::Running => {
                self.shared.set_state(PipelineState::Configuring);
                // The cleared overlay already belongs to the new camera
                self.shared.set_camera_position(position);
                self.halt(position);
                match self.configure_and_start(position) {
                    Ok(()) => {
                        self.shared.set_state(PipelineState::Running);
                        log::info!("Camera switched to {}", position);
                        Ok(())
                    }
                    Err(e) => {
                        log::error!("Failed to switch to {} camera: {}", position, e);
                        self.configured = false;
                        self.shared.set_camera_position(previous);
                        self.shared.reset_overlay(previous);
                        self.shared.set_state(PipelineState::Idle);
                        Err(e.into())
                    }
                }
            }
            state => Err(SessionError::InvalidState {
                operation: "flip",
                state: state.name(),
            }),
        }
    }

    /// Idle -> Configuring -> Running, or back to Idle on failure
    fn launch(&mut self) -> Result<(), SessionError> {
        self.shared.set_state(PipelineState::Configuring);
        let position = self.shared.camera_position();

        let result = if self.configured {
            self.start_delivery()
        } else {
            self.configure_and_start(position)
        };

        match result {
            Ok(()) => {
                self.shared.set_state(PipelineState::Running);
                log::info!("Capture session running ({} camera)", position);
                Ok(())
            }
            Err(e) => {
                log::error!("Capture configuration failed: {}", e);
                self.shared.set_state(PipelineState::Idle);
                Err(e.into())
            }
        }
    }

    fn configure_and_start(&mut self, position: CameraPosition) -> Result<(), CaptureError> {
        self.configured = false;
        self.source.configure(position)?;
        self.configured = true;
        self.start_delivery()
    }

    fn start_delivery(&mut self) -> Result<(), CaptureError> {
        let sink = self.shared.sink(self.shared.slot.current_epoch());
        let format = self.source.start(sink)?;
        log::info!("Capture format {}x{}", format.width, format.height);
        self.shared.set_frame_format(Some(format));
        Ok(())
    }

    /// End the current epoch, stop delivery, drain and clear the overlay
    fn halt(&mut self, position: CameraPosition) {
        // No detection starts after this point
        self.shared.slot.invalidate();
        self.source.stop();
        if !self.shared.slot.wait_idle(self.drain_timeout) {
            log::warn!(
                "In-flight detection still running after {:?}; its result will be discarded",
                self.drain_timeout
            );
        }
        self.shared.reset_overlay(position);
    }

    fn shutdown(&mut self) {
        if matches!(
            self.shared.state(),
            PipelineState::Running | PipelineState::Configuring | PipelineState::Stopping
        ) {
            self.shared.set_state(PipelineState::Stopping);
            self.halt(self.shared.camera_position());
            self.shared.set_state(PipelineState::Idle);
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: PipelineState,
    ) -> Result<(), SessionError> {
        let state = self.shared.state();
        if state != expected {
            return Err(SessionError::InvalidState {
                operation,
                state: state.name(),
            });
        }
        Ok(())
    }
}
