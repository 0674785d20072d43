//! Device tilt monitoring
//!
//! The motion sensor itself is external. Whatever reads it feeds attitude or a
//! ready-made tilt flag into a [`TiltMonitor`] owned by the capture session.
//! Tilt is advisory: it raises a warning and never changes pipeline behavior.

use std::sync::atomic::{AtomicBool, Ordering};

/// Default roll/pitch beyond which the device counts as tilted
pub const DEFAULT_TILT_THRESHOLD_DEGREES: f64 = 20.0;

#[derive(Debug)]
pub struct TiltMonitor {
    threshold_degrees: f64,
    tilting: AtomicBool,
}

impl TiltMonitor {
    pub fn new(threshold_degrees: f64) -> Self {
        Self {
            threshold_degrees,
            tilting: AtomicBool::new(false),
        }
    }

    pub fn threshold_degrees(&self) -> f64 {
        self.threshold_degrees
    }

    /// Sensor callback with a precomputed tilt flag
    pub fn on_tilt_changed(&self, is_tilting: bool) {
        let was = self.tilting.swap(is_tilting, Ordering::AcqRel);
        if was != is_tilting {
            if is_tilting {
                log::info!("Device tilted; overlay may be skewed");
            } else {
                log::info!("Device level again");
            }
        }
    }

    /// Feed attitude in radians. Tilted when both roll and pitch exceed the threshold.
    pub fn update_attitude(&self, roll: f64, pitch: f64) -> bool {
        let tilting = is_tilted(roll, pitch, self.threshold_degrees);
        self.on_tilt_changed(tilting);
        tilting
    }

    /// Whether the tilt warning should be shown
    pub fn is_tilting(&self) -> bool {
        self.tilting.load(Ordering::Acquire)
    }
}

impl Default for TiltMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_TILT_THRESHOLD_DEGREES)
    }
}

fn is_tilted(roll: f64, pitch: f64, threshold_degrees: f64) -> bool {
    roll.to_degrees().abs() > threshold_degrees && pitch.to_degrees().abs() > threshold_degrees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_both_axes() {
        let monitor = TiltMonitor::default();
        assert!(!monitor.update_attitude(30f64.to_radians(), 5f64.to_radians()));
        assert!(!monitor.update_attitude(5f64.to_radians(), -30f64.to_radians()));
        assert!(monitor.update_attitude(-25f64.to_radians(), 25f64.to_radians()));
        assert!(monitor.is_tilting());
    }

    #[test]
    fn test_custom_threshold() {
        let monitor = TiltMonitor::new(40.0);
        assert!(!monitor.update_attitude(35f64.to_radians(), 35f64.to_radians()));
        assert!(monitor.update_attitude(45f64.to_radians(), 45f64.to_radians()));
    }

    #[test]
    fn test_flag_callback() {
        let monitor = TiltMonitor::default();
        monitor.on_tilt_changed(true);
        assert!(monitor.is_tilting());
        monitor.on_tilt_changed(false);
        assert!(!monitor.is_tilting());
    }
}
