//! Neurux gaze — synthetic eye-tracking gaze simulation for heatmap
//! overlays.
//!
//! This library crate exposes the simulator and its event-loop harness.
//! The binary entry point lives in `main.rs`.

pub mod clock;
pub mod error;
pub mod gaze;
pub mod geometry;
pub mod headless;
pub mod input_source;
pub mod recorder;
pub mod runtime;
