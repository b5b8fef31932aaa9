//! Error types for simulator configuration and scheduling.

use thiserror::Error;

/// Invalid simulator configuration. Raised before any loop starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("waypoint list is empty")]
    NoWaypoints,

    #[error("waypoint {index} is not a finite point")]
    NonFiniteWaypoint { index: usize },

    #[error("fixation duration range [{min_ms}, {max_ms}] ms must be positive and ordered")]
    InvalidFixationRange { min_ms: f64, max_ms: f64 },

    #[error("{name} must be a positive duration, got {value_ms} ms")]
    NonPositiveDuration { name: &'static str, value_ms: f64 },

    #[error("jitter amplitude must be finite and non-negative, got {0} px")]
    InvalidJitter(f64),

    #[error("random jump probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("intensity step must lie in (0, 1], got {0}")]
    InvalidIntensityStep(f64),

    #[error("{table} has {actual} entries but there are {expected} waypoints")]
    WaypointCountMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("fixation override {value_ms} ms for waypoint {index} is outside the fixation range")]
    FixationOverrideOutOfRange { index: usize, value_ms: f64 },
}

/// Failure to start a simulation.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot register {source_name} with the event loop: {reason}")]
    Scheduler {
        source_name: &'static str,
        reason: String,
    },
}

/// Failure to read back or re-verify a recorded frame trace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    #[error("trace has no header line")]
    Empty,

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("trace dropped {0} frame(s) and cannot be replayed from its start")]
    Truncated(u64),

    #[error("frame {index} at {timestamp_ms} ms diverged: expected {expected}, got {actual}")]
    Diverged {
        index: usize,
        timestamp_ms: f64,
        expected: String,
        actual: String,
    },
}
