//! Posture Overlay - demo entry point
//!
//! Runs the pipeline against a synthetic camera and a scripted detector that
//! sways the subject left and right, logging what the overlay would show.
//!
//! Usage: posture-overlay [config.json]

use std::time::Duration;

use posture_overlay::camera::{CameraFrame, SyntheticCamera};
use posture_overlay::config::TrackingMode;
use posture_overlay::error::DetectionError;
use posture_overlay::geometry::{DisplayGeometry, Rect, Size};
use posture_overlay::pipeline::PipelineOptions;
use posture_overlay::pose::{
    BodyAnalyzer, FrameAnalyzer, HandAnalyzer, HandJointName, HandObservation, JointName,
    JointObservation,
};
use posture_overlay::{ConfigError, FramePipeline, OverlayConfig};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const TARGET_FPS: u32 = 30;
const VIEW_WIDTH: f64 = 390.0;
const VIEW_HEIGHT: f64 = 844.0;

/// Hips drift sideways with the frame number
fn scripted_body(frame: &CameraFrame) -> Result<Vec<JointObservation>, DetectionError> {
    let phase = (frame.frame_number as f64 / 20.0).sin();
    let hip_shift = 0.2 * phase;
    Ok(vec![
        JointObservation::new(JointName::Neck, 0.5, 0.85, 0.9),
        JointObservation::new(JointName::LeftShoulder, 0.35, 0.8, 0.9),
        JointObservation::new(JointName::RightShoulder, 0.65, 0.8, 0.9),
        JointObservation::new(JointName::LeftElbow, 0.3, 0.6, 0.6),
        JointObservation::new(JointName::RightElbow, 0.7, 0.6, 0.05),
        JointObservation::new(JointName::Root, 0.5 + hip_shift, 0.45, 0.8),
        JointObservation::new(JointName::LeftHip, 0.4 + hip_shift, 0.45, 0.8),
        JointObservation::new(JointName::RightHip, 0.6 + hip_shift, 0.45, 0.8),
    ])
}

fn scripted_hand(frame: &CameraFrame) -> Result<Vec<HandObservation>, DetectionError> {
    let t = frame.frame_number as f64 / 15.0;
    let confidence = if frame.frame_number % 40 < 30 { 0.9 } else { 0.1 };
    Ok(vec![HandObservation::new(
        HandJointName::MiddleMcp,
        0.5 + 0.3 * t.cos(),
        0.5 + 0.3 * t.sin(),
        confidence,
    )])
}

fn build_analyzer(config: &OverlayConfig) -> Result<Box<dyn FrameAnalyzer>, ConfigError> {
    Ok(match config.detection.mode {
        TrackingMode::Body => Box::new(BodyAnalyzer::new(scripted_body, config.joint_filter()?)),
        TrackingMode::Hand => Box::new(HandAnalyzer::new(scripted_hand, config.hand_tracker()?)),
    })
}

fn log_snapshot(pipeline: &FramePipeline) {
    let snapshot = pipeline.latest_snapshot();
    log::info!(
        "frame {:?} ({} camera): {} | {} shapes{}",
        snapshot.frame_number,
        snapshot.position,
        snapshot.lean().display_name(),
        snapshot.shapes.shape_count(),
        if snapshot.tilting { " | device tilted" } else { "" }
    );
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Posture Overlay v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => match OverlayConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => OverlayConfig::default(),
    };

    let analyzer = match build_analyzer(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            log::error!("Invalid detection settings: {}", e);
            std::process::exit(1);
        }
    };

    let camera = SyntheticCamera::new(FRAME_WIDTH, FRAME_HEIGHT, TARGET_FPS);
    let options = PipelineOptions::from_config(&config);
    let mut pipeline = FramePipeline::new(Box::new(camera), analyzer, options)
        .expect("Failed to start pipeline threads");

    pipeline.set_display_geometry(DisplayGeometry::new(
        Size::new(FRAME_WIDTH as f64, FRAME_HEIGHT as f64),
        Rect::new(0.0, 0.0, VIEW_WIDTH, VIEW_HEIGHT),
        config.overlay.content_mode,
    ));

    if let Err(e) = pipeline.setup() {
        log::error!("Camera setup failed: {}", e);
        std::process::exit(1);
    }

    for tick in 0..20 {
        std::thread::sleep(Duration::from_millis(200));
        if tick == 10 {
            // Roll and pitch of 30 degrees
            pipeline.tilt_monitor().update_attitude(0.52, 0.52);
            if let Err(e) = pipeline.flip() {
                log::error!("Camera flip failed: {}", e);
            }
        }
        if tick == 15 {
            pipeline.tilt_monitor().update_attitude(0.0, 0.0);
        }
        log_snapshot(&pipeline);
    }

    if let Err(e) = pipeline.stop() {
        log::error!("Stop failed: {}", e);
    }

    let stats = pipeline.stats();
    log::info!(
        "Delivered {} frames: {} processed, {} dropped, {} replaced, {} stale, {} discarded, {} detection failures",
        stats.frames_delivered,
        stats.frames_processed,
        stats.frames_dropped,
        stats.frames_replaced,
        stats.frames_stale,
        stats.results_discarded,
        stats.detection_failures
    );

    pipeline.shutdown();
}
