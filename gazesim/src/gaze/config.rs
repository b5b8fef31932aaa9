//! Simulator configuration, validation, and tuning presets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::intensity::{DwellConfig, FixationRampConfig};
use crate::error::ConfigError;
use crate::geometry::{Point2D, Viewport};

// ── Fixation range ──────────────────────────────────────────

/// Bounds for the fixation duration drawn at every fixation entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationRange {
    pub min_ms: f64,
    pub max_ms: f64,
}

impl FixationRange {
    pub const fn new(min_ms: f64, max_ms: f64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn contains(&self, ms: f64) -> bool {
        ms >= self.min_ms && ms <= self.max_ms
    }

    /// Uniform sample in `[min_ms, max_ms]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max_ms <= self.min_ms {
            return self.min_ms;
        }
        rng.gen_range(self.min_ms..=self.max_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.min_ms.is_finite()
            && self.max_ms.is_finite()
            && self.min_ms > 0.0
            && self.max_ms >= self.min_ms;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidFixationRange {
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            })
        }
    }
}

// ── Intensity source ────────────────────────────────────────

/// Where the exposed intensity signal comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum IntensitySource {
    /// Synthesised from time spent in the current fixation.
    Fixation(FixationRampConfig),
    /// Dwell heat driven by real pointer input.
    Pointer(DwellConfig),
}

impl Default for IntensitySource {
    fn default() -> Self {
        Self::Fixation(FixationRampConfig::default())
    }
}

// ── SimulatorConfig ─────────────────────────────────────────

/// Configuration for one gaze simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Candidate fixation targets, offsets from viewport centre.
    pub waypoints: Vec<Point2D>,
    /// The same waypoints in percent of the viewport. When set, the
    /// waypoints are laid out again whenever the viewport changes size.
    pub landmarks_percent: Option<Vec<Point2D>>,
    /// Bounds for the per-fixation dwell time.
    pub fixation_duration: FixationRange,
    /// Fixed dwell per waypoint, used instead of sampling
    /// `fixation_duration`. Entries must lie inside that range.
    pub fixation_overrides_ms: Option<Vec<f64>>,
    /// Time spent in SACCADE before the next fixation begins.
    pub saccade_duration_ms: f64,
    /// Full width of the per-tick fixation jitter (half on each side).
    pub jitter_amplitude_px: f64,
    /// Probability that a saccade lands on a random waypoint instead of
    /// the next one in sequence.
    pub random_jump_probability: f64,
    /// Saccade segments kept for path drawing (0 disables the trail).
    pub trail_capacity: usize,
    /// Period of the frame tick when run on an event loop.
    pub frame_interval_ms: f64,
    /// Intensity variant exposed to renderers.
    pub intensity: IntensitySource,
    /// Seed for the random source; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Preset::HyperScan.config(&Viewport::default())
    }
}

impl SimulatorConfig {
    /// Check every option. A config that passes can start a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waypoints.is_empty() {
            return Err(ConfigError::NoWaypoints);
        }
        if let Some(index) = self.waypoints.iter().position(|p| !p.is_finite()) {
            return Err(ConfigError::NonFiniteWaypoint { index });
        }
        self.fixation_duration.validate()?;
        let n = self.waypoints.len();
        if let Some(landmarks) = &self.landmarks_percent {
            same_len("percent landmarks", landmarks.len(), n)?;
            if let Some(index) = landmarks.iter().position(|p| !p.is_finite()) {
                return Err(ConfigError::NonFiniteWaypoint { index });
            }
        }
        if let Some(overrides) = &self.fixation_overrides_ms {
            same_len("fixation overrides", overrides.len(), n)?;
            let range = self.fixation_duration;
            if let Some(index) = overrides.iter().position(|&ms| !range.contains(ms)) {
                return Err(ConfigError::FixationOverrideOutOfRange {
                    index,
                    value_ms: overrides[index],
                });
            }
        }
        positive("saccade duration", self.saccade_duration_ms)?;
        positive("frame interval", self.frame_interval_ms)?;
        if !self.jitter_amplitude_px.is_finite() || self.jitter_amplitude_px < 0.0 {
            return Err(ConfigError::InvalidJitter(self.jitter_amplitude_px));
        }
        if !(0.0..=1.0).contains(&self.random_jump_probability) {
            return Err(ConfigError::InvalidProbability(self.random_jump_probability));
        }
        match &self.intensity {
            IntensitySource::Fixation(ramp) => positive("fixation ramp", ramp.ramp_ms)?,
            IntensitySource::Pointer(dwell) => {
                positive("dwell tick period", dwell.tick_period_ms)?;
                if !dwell.stationary_threshold_ms.is_finite() || dwell.stationary_threshold_ms < 0.0 {
                    return Err(ConfigError::NonPositiveDuration {
                        name: "stationary threshold",
                        value_ms: dwell.stationary_threshold_ms,
                    });
                }
                if !(dwell.step > 0.0 && dwell.step <= 1.0) {
                    return Err(ConfigError::InvalidIntensityStep(dwell.step));
                }
            }
        }
        Ok(())
    }

    /// Random source for a session built from this config.
    pub fn build_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Waypoint offsets for `viewport`. Percent landmarks are laid out
    /// again; plain offsets come back unchanged.
    pub fn waypoints_for(&self, viewport: &Viewport) -> Vec<Point2D> {
        match &self.landmarks_percent {
            Some(landmarks) => viewport.lay_out(landmarks),
            None => self.waypoints.clone(),
        }
    }

    /// Copy of this config with its waypoints laid out for `viewport`.
    pub fn laid_out(&self, viewport: &Viewport) -> Self {
        Self {
            waypoints: self.waypoints_for(viewport),
            ..self.clone()
        }
    }

    /// Builder-style seed override.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder-style switch to pointer-driven dwell intensity.
    pub fn with_pointer_intensity(mut self, dwell: DwellConfig) -> Self {
        self.intensity = IntensitySource::Pointer(dwell);
        self
    }
}

fn same_len(table: &'static str, actual: usize, expected: usize) -> Result<(), ConfigError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ConfigError::WaypointCountMismatch {
            table,
            expected,
            actual,
        })
    }
}

fn positive(name: &'static str, value_ms: f64) -> Result<(), ConfigError> {
    if value_ms.is_finite() && value_ms > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveDuration { name, value_ms })
    }
}

// ── Presets ─────────────────────────────────────────────────

/// Trail length used by both presets.
pub const DEFAULT_TRAIL_CAPACITY: usize = 7;

/// Named tuning presets. The numbers are visual tuning, not behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Rapid, scattered scanning across a dark hero section.
    HyperScan,
    /// Slow sequential tour of page landmarks.
    Tour,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HyperScan => "hyper-scan",
            Self::Tour => "tour",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hyper-scan" => Some(Self::HyperScan),
            "tour" => Some(Self::Tour),
            _ => None,
        }
    }

    /// Build the preset's config for a viewport. Only `Tour` depends on
    /// the viewport; its landmarks are placed in percent of the page and
    /// each has its own dwell time.
    pub fn config(&self, viewport: &Viewport) -> SimulatorConfig {
        match self {
            Self::HyperScan => SimulatorConfig {
                waypoints: HYPER_SCAN_PATH.iter().map(|&p| Point2D::from(p)).collect(),
                landmarks_percent: None,
                fixation_duration: FixationRange::new(40.0, 180.0),
                fixation_overrides_ms: None,
                saccade_duration_ms: 30.0,
                jitter_amplitude_px: 8.0,
                random_jump_probability: 1.0,
                trail_capacity: DEFAULT_TRAIL_CAPACITY,
                frame_interval_ms: 16.0,
                intensity: IntensitySource::default(),
                seed: None,
            },
            Self::Tour => SimulatorConfig {
                waypoints: TOUR_LANDMARKS
                    .iter()
                    .map(|&(px, py, _)| viewport.percent_to_offset(px, py))
                    .collect(),
                landmarks_percent: Some(
                    TOUR_LANDMARKS
                        .iter()
                        .map(|&(px, py, _)| Point2D::new(px, py))
                        .collect(),
                ),
                fixation_duration: FixationRange::new(500.0, 2500.0),
                fixation_overrides_ms: Some(TOUR_LANDMARKS.iter().map(|&(_, _, ms)| ms).collect()),
                // Covers the eased move between landmarks.
                saccade_duration_ms: 400.0,
                jitter_amplitude_px: 2.0,
                random_jump_probability: 0.0,
                trail_capacity: DEFAULT_TRAIL_CAPACITY,
                frame_interval_ms: 16.0,
                intensity: IntensitySource::default(),
                seed: None,
            },
        }
    }
}

/// Scattered offsets around the centre of a wide hero section.
const HYPER_SCAN_PATH: [(f64, f64); 12] = [
    (-300.0, -120.0),
    (200.0, -100.0),
    (-100.0, -80.0),
    (350.0, -50.0),
    (-400.0, 0.0),
    (100.0, 50.0),
    (-200.0, 150.0),
    (300.0, 200.0),
    (0.0, -200.0),
    (450.0, 100.0),
    (-450.0, -150.0),
    (50.0, 0.0),
];

/// Logo, headline lines, header menu, header scan, centre, both CTAs.
/// `(x %, y %, dwell ms)`.
const TOUR_LANDMARKS: [(f64, f64, f64); 8] = [
    (10.0, 5.0, 2500.0),
    (50.0, 35.0, 1500.0),
    (50.0, 45.0, 2000.0),
    (85.0, 5.0, 1000.0),
    (50.0, 5.0, 800.0),
    (50.0, 50.0, 500.0),
    (35.0, 75.0, 2000.0),
    (65.0, 75.0, 1000.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulatorConfig::default().validate().is_ok());
        assert!(Preset::Tour.config(&Viewport::default()).validate().is_ok());
    }

    #[test]
    fn test_preset_roundtrip() {
        for p in [Preset::HyperScan, Preset::Tour] {
            assert_eq!(Preset::from_str(p.as_str()), Some(p));
        }
        assert_eq!(Preset::from_str("saccadic"), None);
    }

    #[test]
    fn test_tour_uses_viewport() {
        let cfg = Preset::Tour.config(&Viewport::new(1000.0, 1000.0));
        assert_eq!(cfg.waypoints.len(), 8);
        // Centre-screen landmark sits at the origin
        assert_eq!(cfg.waypoints[5], Point2D::ZERO);
    }

    #[test]
    fn test_tour_relayout_follows_viewport() {
        let cfg = Preset::Tour.config(&Viewport::new(1000.0, 1000.0));
        let big = Viewport::new(2000.0, 2000.0);
        let laid_out = cfg.laid_out(&big);
        // Logo landmark sits at (10 %, 5 %) of the new page
        let logo = big.to_screen(laid_out.waypoints[0]);
        assert!(logo.distance(Point2D::new(200.0, 100.0)) < 1e-9);
        assert_eq!(laid_out.landmarks_percent, cfg.landmarks_percent);
        assert!(laid_out.validate().is_ok());
    }

    #[test]
    fn test_plain_waypoints_ignore_viewport() {
        let cfg = SimulatorConfig::default();
        assert_eq!(cfg.waypoints_for(&Viewport::new(10.0, 10.0)), cfg.waypoints);
    }

    #[test]
    fn test_tour_dwell_overrides() {
        let cfg = Preset::Tour.config(&Viewport::default());
        let overrides = cfg.fixation_overrides_ms.clone().unwrap();
        assert_eq!(overrides[0], 2500.0);
        assert_eq!(overrides[5], 500.0);
        assert!(overrides.iter().all(|&ms| cfg.fixation_duration.contains(ms)));
        assert_eq!(cfg.saccade_duration_ms, 400.0);
    }

    #[test]
    fn test_waypoint_tables_must_match() {
        let mut cfg = Preset::Tour.config(&Viewport::default());
        cfg.waypoints.pop();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::WaypointCountMismatch {
                table: "percent landmarks",
                expected: 7,
                actual: 8,
            })
        );

        let mut cfg = SimulatorConfig::default();
        cfg.fixation_overrides_ms = Some(vec![100.0; 3]);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::WaypointCountMismatch { table: "fixation overrides", .. })
        ));
    }

    #[test]
    fn test_override_outside_range_rejected() {
        let mut cfg = SimulatorConfig::default();
        let mut overrides = vec![100.0; cfg.waypoints.len()];
        overrides[2] = 5000.0;
        cfg.fixation_overrides_ms = Some(overrides);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::FixationOverrideOutOfRange {
                index: 2,
                value_ms: 5000.0
            })
        );
    }

    #[test]
    fn test_empty_waypoints_rejected() {
        let mut cfg = SimulatorConfig::default();
        cfg.waypoints.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::NoWaypoints));
    }

    #[test]
    fn test_non_finite_waypoint_rejected() {
        let mut cfg = SimulatorConfig::default();
        cfg.waypoints[3] = Point2D::new(f64::NAN, 0.0);
        assert_eq!(cfg.validate(), Err(ConfigError::NonFiniteWaypoint { index: 3 }));
    }

    #[test]
    fn test_bad_durations_rejected() {
        let mut cfg = SimulatorConfig::default();
        cfg.fixation_duration = FixationRange::new(200.0, 100.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidFixationRange { .. })
        ));

        let mut cfg = SimulatorConfig::default();
        cfg.fixation_duration = FixationRange::new(0.0, 100.0);
        assert!(cfg.validate().is_err());

        let mut cfg = SimulatorConfig::default();
        cfg.saccade_duration_ms = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositiveDuration {
                name: "saccade duration",
                value_ms: 0.0
            })
        );

        let mut cfg = SimulatorConfig::default();
        cfg.frame_interval_ms = -16.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_probability_and_jitter_rejected() {
        let mut cfg = SimulatorConfig::default();
        cfg.random_jump_probability = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidProbability(1.5)));

        let mut cfg = SimulatorConfig::default();
        cfg.jitter_amplitude_px = -1.0;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidJitter(-1.0)));
    }

    #[test]
    fn test_pointer_intensity_validation() {
        let cfg = SimulatorConfig::default().with_pointer_intensity(DwellConfig {
            step: 0.0,
            ..DwellConfig::default()
        });
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidIntensityStep(0.0)));

        let cfg = SimulatorConfig::default().with_pointer_intensity(DwellConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_fixation_sample_in_range() {
        let range = FixationRange::new(40.0, 180.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        let fixed = FixationRange::new(500.0, 500.0);
        assert_eq!(fixed.sample(&mut rng), 500.0);
    }

    #[test]
    fn test_seeded_rng_reproducible() {
        let cfg = SimulatorConfig::default().with_seed(42);
        let a: u64 = cfg.build_rng().gen();
        let b: u64 = cfg.build_rng().gen();
        assert_eq!(a, b);
    }
}
