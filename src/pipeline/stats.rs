//! Frame counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Frames handed to a sink by the capture source
    pub frames_delivered: u64,
    /// Dropped because a frame was already pending or in flight
    pub frames_dropped: u64,
    /// Pending frames replaced by a newer one
    pub frames_replaced: u64,
    /// Delivered through a sink from a stopped or flipped session
    pub frames_stale: u64,
    /// Results published to the overlay
    pub frames_processed: u64,
    pub detection_failures: u64,
    /// Results computed for an epoch that ended mid-detection
    pub results_discarded: u64,
}

#[derive(Default)]
pub(crate) struct FrameCounters {
    delivered: AtomicU64,
    dropped: AtomicU64,
    replaced: AtomicU64,
    stale: AtomicU64,
    processed: AtomicU64,
    detection_failures: AtomicU64,
    discarded: AtomicU64,
}

impl FrameCounters {
    pub fn delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detection_failed(&self) {
        self.detection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_delivered: self.delivered.load(Ordering::Relaxed),
            frames_dropped: self.dropped.load(Ordering::Relaxed),
            frames_replaced: self.replaced.load(Ordering::Relaxed),
            frames_stale: self.stale.load(Ordering::Relaxed),
            frames_processed: self.processed.load(Ordering::Relaxed),
            detection_failures: self.detection_failures.load(Ordering::Relaxed),
            results_discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}
