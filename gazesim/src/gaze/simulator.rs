//! Fixation/saccade gaze path simulation.
//!
//! A synthetic gaze dwells on a waypoint with per-tick jitter (FIXATION),
//! then jumps to the next waypoint (SACCADE) and holds it exactly for a
//! short flight time before dwelling again. Time comes only from the
//! timestamps passed to `tick`, randomness only from the injected `Rng`.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::config::{FixationRange, SimulatorConfig};
use super::trail::{Trail, TrailSegment};
use crate::error::ConfigError;
use crate::geometry::Point2D;

// ── Gaze state ──────────────────────────────────────────────

/// Which phase the simulated gaze is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeState {
    /// Dwelling near the target with jitter.
    Fixation,
    /// Jumped to a new target; held there exactly.
    Saccade,
}

impl GazeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixation => "fixation",
            Self::Saccade => "saccade",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fixation" => Some(Self::Fixation),
            "saccade" => Some(Self::Saccade),
            _ => None,
        }
    }
}

// ── Frame ───────────────────────────────────────────────────

/// Snapshot emitted by every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeFrame {
    pub timestamp_ms: f64,
    pub state: GazeState,
    /// Rendered position (offset from viewport centre).
    pub position: Point2D,
    pub target: Point2D,
    pub path_index: usize,
    /// Time since the current state was entered, after this tick.
    pub time_in_state_ms: f64,
    /// True if this tick changed state.
    pub transitioned: bool,
}

// ── Session ─────────────────────────────────────────────────

/// Live gaze simulation state.
#[derive(Debug)]
pub struct GazeSession<R: Rng = StdRng> {
    waypoints: Vec<Point2D>,
    fixation_range: FixationRange,
    fixation_overrides_ms: Option<Vec<f64>>,
    saccade_duration_ms: f64,
    jitter_amplitude_px: f64,
    random_jump_probability: f64,
    rng: R,

    state: GazeState,
    state_entered_at_ms: f64,
    current_target: Point2D,
    fixation_duration_ms: f64,
    path_index: usize,
    position: Point2D,
    trail: Trail,

    /// Latest timestamp seen, for anomaly reporting.
    last_tick_ms: f64,
    /// Completed saccades since start.
    saccade_count: u64,
}

impl GazeSession<StdRng> {
    /// Session with the random source described by `config.seed`.
    pub fn from_config(config: &SimulatorConfig, now_ms: f64) -> Result<Self, ConfigError> {
        Self::new(config, config.build_rng(), now_ms)
    }
}

impl<R: Rng> GazeSession<R> {
    /// Start a session in FIXATION on the first waypoint at `now_ms`.
    pub fn new(config: &SimulatorConfig, mut rng: R, now_ms: f64) -> Result<Self, ConfigError> {
        config.validate()?;

        let current_target = config.waypoints[0];
        let fixation_duration_ms = match config.fixation_overrides_ms.as_deref() {
            Some([first, ..]) => *first,
            _ => config.fixation_duration.sample(&mut rng),
        };

        Ok(Self {
            waypoints: config.waypoints.clone(),
            fixation_range: config.fixation_duration,
            fixation_overrides_ms: config.fixation_overrides_ms.clone(),
            saccade_duration_ms: config.saccade_duration_ms,
            jitter_amplitude_px: config.jitter_amplitude_px,
            random_jump_probability: config.random_jump_probability,
            rng,
            state: GazeState::Fixation,
            state_entered_at_ms: now_ms,
            current_target,
            fixation_duration_ms,
            path_index: 0,
            position: current_target,
            trail: Trail::new(config.trail_capacity),
            last_tick_ms: now_ms,
            saccade_count: 0,
        })
    }

    /// Advance the simulation to `now_ms` and return the new frame.
    pub fn tick(&mut self, now_ms: f64) -> GazeFrame {
        if now_ms < self.last_tick_ms {
            debug!(
                "Gaze clock went backwards ({:.1} -> {:.1} ms), clamping",
                self.last_tick_ms, now_ms
            );
        }
        self.last_tick_ms = self.last_tick_ms.max(now_ms);

        let elapsed = (now_ms - self.state_entered_at_ms).max(0.0);
        let mut transitioned = false;

        match self.state {
            GazeState::Fixation => {
                let amplitude = self.jitter_amplitude_px;
                let jitter = Point2D::new(
                    (self.rng.gen::<f64>() - 0.5) * amplitude,
                    (self.rng.gen::<f64>() - 0.5) * amplitude,
                );
                self.position = self.current_target + jitter;

                if elapsed > self.fixation_duration_ms {
                    self.enter_saccade(now_ms);
                    transitioned = true;
                }
            }
            GazeState::Saccade => {
                self.position = self.current_target;

                if elapsed > self.saccade_duration_ms {
                    self.enter_fixation(now_ms);
                    transitioned = true;
                }
            }
        }

        self.frame(now_ms, transitioned)
    }

    fn enter_saccade(&mut self, now_ms: f64) {
        let previous = self.current_target;
        let n = self.waypoints.len();

        let random_jump =
            self.random_jump_probability > 0.0 && self.rng.gen_bool(self.random_jump_probability);
        self.path_index = if random_jump {
            self.rng.gen_range(0..n)
        } else {
            (self.path_index + 1) % n
        };
        self.current_target = self.waypoints[self.path_index];
        // The jump is committed at once; easing toward it is the renderer's job.
        self.position = self.current_target;

        self.state = GazeState::Saccade;
        self.state_entered_at_ms = now_ms;
        self.saccade_count += 1;
        self.trail.push(TrailSegment {
            start: previous,
            end: self.current_target,
        });

        debug!(
            "Saccade -> waypoint {} ({:.0}, {:.0}){}",
            self.path_index,
            self.current_target.x,
            self.current_target.y,
            if random_jump { " [random]" } else { "" }
        );
    }

    fn enter_fixation(&mut self, now_ms: f64) {
        self.state = GazeState::Fixation;
        self.state_entered_at_ms = now_ms;
        self.fixation_duration_ms = self.next_fixation_ms();
        debug!(
            "Fixation on waypoint {} for {:.0} ms",
            self.path_index, self.fixation_duration_ms
        );
    }

    fn next_fixation_ms(&mut self) -> f64 {
        let fixed = self
            .fixation_overrides_ms
            .as_ref()
            .and_then(|overrides| overrides.get(self.path_index).copied());
        match fixed {
            Some(ms) => ms,
            None => self.fixation_range.sample(&mut self.rng),
        }
    }

    /// Move every waypoint to a new layout of the same path, e.g. after a
    /// viewport resize. The gaze keeps its state, timing and waypoint
    /// index and follows its target; the trail is cleared since its
    /// segments belong to the old layout.
    pub fn relayout(&mut self, waypoints: Vec<Point2D>) -> Result<(), ConfigError> {
        if waypoints.len() != self.waypoints.len() {
            return Err(ConfigError::WaypointCountMismatch {
                table: "new layout",
                expected: self.waypoints.len(),
                actual: waypoints.len(),
            });
        }
        if let Some(index) = waypoints.iter().position(|p| !p.is_finite()) {
            return Err(ConfigError::NonFiniteWaypoint { index });
        }

        let target = waypoints[self.path_index];
        self.position = match self.state {
            GazeState::Fixation => target + (self.position - self.current_target),
            GazeState::Saccade => target,
        };
        self.current_target = target;
        self.waypoints = waypoints;
        self.trail.clear();
        debug!(
            "Gaze relayout: waypoint {} now at ({:.0}, {:.0})",
            self.path_index, target.x, target.y
        );
        Ok(())
    }

    /// Current frame without advancing the simulation.
    pub fn snapshot(&self, now_ms: f64) -> GazeFrame {
        self.frame(now_ms, false)
    }

    fn frame(&self, now_ms: f64, transitioned: bool) -> GazeFrame {
        GazeFrame {
            timestamp_ms: now_ms,
            state: self.state,
            position: self.position,
            target: self.current_target,
            path_index: self.path_index,
            time_in_state_ms: self.time_in_state(now_ms),
            transitioned,
        }
    }

    pub fn state(&self) -> GazeState {
        self.state
    }

    pub fn is_fixating(&self) -> bool {
        self.state == GazeState::Fixation
    }

    pub fn position(&self) -> Point2D {
        self.position
    }

    pub fn current_target(&self) -> Point2D {
        self.current_target
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn fixation_duration_ms(&self) -> f64 {
        self.fixation_duration_ms
    }

    pub fn state_entered_at_ms(&self) -> f64 {
        self.state_entered_at_ms
    }

    /// Time spent in the current state, never negative.
    pub fn time_in_state(&self, now_ms: f64) -> f64 {
        (now_ms - self.state_entered_at_ms).max(0.0)
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn waypoints(&self) -> &[Point2D] {
        &self.waypoints
    }

    pub fn saccade_count(&self) -> u64 {
        self.saccade_count
    }

    /// Status as an s-expression for logs and status queries.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:state :{} :waypoint {} :target ({:.1} {:.1}) :position ({:.1} {:.1}) :fixation-ms {:.0} :saccades {} :trail {})",
            self.state.as_str(),
            self.path_index,
            self.current_target.x,
            self.current_target.y,
            self.position.x,
            self.position.y,
            self.fixation_duration_ms,
            self.saccade_count,
            self.trail.len(),
        )
    }
}
