//! Single-slot frame buffer between the capture and processing lanes
//!
//! Holds at most one pending frame. Every frame is offered with the epoch of
//! the sink that delivered it; invalidating the slot bumps the epoch, clears
//! the pending frame and makes every older sink stale.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::camera::CameraFrame;

/// What happens to a frame that arrives while another is pending or in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BacklogPolicy {
    /// Discard the newcomer. Latency stays bounded by one detection.
    #[default]
    DropNewest,
    /// Newcomer replaces the pending frame and runs after the current detection
    ReplacePending,
}

/// Outcome of offering a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// Accepted, discarding an older pending frame
    Replaced,
    Dropped,
    /// Delivered through a sink from an earlier epoch
    Stale,
}

#[derive(Default)]
struct SlotState {
    pending: Option<CameraFrame>,
    busy: bool,
    epoch: u64,
    shutdown: bool,
}

pub struct FrameSlot {
    policy: BacklogPolicy,
    state: Mutex<SlotState>,
    ready: Condvar,
    idle: Condvar,
}

impl FrameSlot {
    pub fn new(policy: BacklogPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(SlotState::default()),
            ready: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    pub fn policy(&self) -> BacklogPolicy {
        self.policy
    }

    /// Called on the capture lane. Never waits for processing.
    pub fn offer(&self, frame: CameraFrame, epoch: u64) -> Offer {
        let mut state = self.state.lock();
        if state.shutdown || epoch != state.epoch {
            return Offer::Stale;
        }

        let outcome = match self.policy {
            BacklogPolicy::DropNewest => {
                if state.busy || state.pending.is_some() {
                    return Offer::Dropped;
                }
                Offer::Accepted
            }
            BacklogPolicy::ReplacePending => {
                if state.pending.is_some() {
                    Offer::Replaced
                } else {
                    Offer::Accepted
                }
            }
        };

        state.pending = Some(frame);
        self.ready.notify_one();
        outcome
    }

    /// Block until a frame is pending, then mark a detection in flight.
    ///
    /// Returns `None` once the slot is shut down.
    pub fn take(&self) -> Option<(CameraFrame, u64)> {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(frame) = state.pending.take() {
                state.busy = true;
                return Some((frame, state.epoch));
            }
            self.ready.wait(&mut state);
        }
    }

    /// The in-flight detection is done
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.busy = false;
        self.idle.notify_all();
    }

    pub fn current_epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Start a new epoch. No frame from an earlier epoch is taken after this returns.
    pub fn invalidate(&self) -> u64 {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.pending = None;
        state.epoch
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Wait for the in-flight detection, if any. `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.busy {
            if self.idle.wait_until(&mut state, deadline).timed_out() {
                return !state.busy;
            }
        }
        true
    }

    /// Wake the processing lane and make every further `take` return `None`
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        state.pending = None;
        self.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraPosition;
    use std::sync::Arc;

    fn frame(n: u64) -> CameraFrame {
        CameraFrame::solid(1, 1, [0; 4], n, CameraPosition::Back)
    }

    #[test]
    fn test_drop_newest() {
        let slot = FrameSlot::new(BacklogPolicy::DropNewest);
        assert_eq!(slot.offer(frame(0), 0), Offer::Accepted);
        assert_eq!(slot.offer(frame(1), 0), Offer::Dropped);

        let (taken, epoch) = slot.take().unwrap();
        assert_eq!(taken.frame_number, 0);
        assert_eq!(epoch, 0);

        // In flight: still dropping
        assert_eq!(slot.offer(frame(2), 0), Offer::Dropped);
        assert!(!slot.has_pending());

        slot.finish();
        assert_eq!(slot.offer(frame(3), 0), Offer::Accepted);
    }

    #[test]
    fn test_replace_pending() {
        let slot = FrameSlot::new(BacklogPolicy::ReplacePending);
        assert_eq!(slot.offer(frame(0), 0), Offer::Accepted);
        let _ = slot.take().unwrap();

        assert_eq!(slot.offer(frame(1), 0), Offer::Accepted);
        assert_eq!(slot.offer(frame(2), 0), Offer::Replaced);
        slot.finish();

        let (taken, _) = slot.take().unwrap();
        assert_eq!(taken.frame_number, 2);
    }

    #[test]
    fn test_invalidate_rejects_old_epoch() {
        let slot = FrameSlot::new(BacklogPolicy::DropNewest);
        assert_eq!(slot.offer(frame(0), 0), Offer::Accepted);
        assert_eq!(slot.invalidate(), 1);
        assert!(!slot.has_pending());
        assert_eq!(slot.offer(frame(1), 0), Offer::Stale);
        assert_eq!(slot.offer(frame(2), 1), Offer::Accepted);
    }

    #[test]
    fn test_wait_idle() {
        let slot = Arc::new(FrameSlot::new(BacklogPolicy::DropNewest));
        assert!(slot.wait_idle(Duration::from_millis(1)));

        slot.offer(frame(0), 0);
        let _ = slot.take().unwrap();
        assert!(!slot.wait_idle(Duration::from_millis(10)));

        let slot_clone = slot.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            slot_clone.finish();
        });
        assert!(slot.wait_idle(Duration::from_secs(2)));
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_wakes_taker() {
        let slot = Arc::new(FrameSlot::new(BacklogPolicy::DropNewest));
        let slot_clone = slot.clone();
        let handle = std::thread::spawn(move || slot_clone.take().is_none());
        std::thread::sleep(Duration::from_millis(20));
        slot.shutdown();
        assert!(handle.join().unwrap());
        assert_eq!(slot.offer(frame(0), 0), Offer::Stale);
    }
}
