//! Synthetic gaze engine — fixation/saccade path simulation, intensity
//! signals, and heat styling for eye-tracking heatmap overlays.
//!
//! Pure and deterministic given a clock and a seeded random source; the
//! event-loop harness lives in `crate::runtime`.

pub mod config;
pub mod heat;
pub mod intensity;
pub mod simulator;
pub mod trail;

pub use config::{FixationRange, IntensitySource, Preset, SimulatorConfig};
pub use heat::{HeatStyle, HeatStyleConfig, Rgb};
pub use intensity::{DwellConfig, DwellIntensity, FixationRamp, FixationRampConfig};
pub use simulator::{GazeFrame, GazeSession, GazeState};
pub use trail::{Trail, TrailSegment};
