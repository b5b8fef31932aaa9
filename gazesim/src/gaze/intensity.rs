//! Intensity ("heat") signals for heatmap renderers.
//!
//! Two independent variants:
//! - `DwellIntensity`: rises on a fixed timer while the real pointer is
//!   stationary, drops to zero on any pointer movement.
//! - `FixationRamp`: derived from time spent in the current simulated
//!   fixation.

use tracing::debug;

// ── Dwell intensity ─────────────────────────────────────────

/// Tuning for pointer dwell heat.
#[derive(Debug, Clone, PartialEq)]
pub struct DwellConfig {
    /// Period of the dwell timer (ms).
    pub tick_period_ms: f64,
    /// Pointer must be still for longer than this before heat rises (ms).
    pub stationary_threshold_ms: f64,
    /// Heat added per timer tick.
    pub step: f64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 50.0,
            stationary_threshold_ms: 100.0,
            step: 0.05,
        }
    }
}

/// Dwell heat state machine driven by real pointer input.
#[derive(Debug, Clone)]
pub struct DwellIntensity {
    pub config: DwellConfig,
    /// Timer ticks accumulated since the last movement, saturating once
    /// the intensity reaches 1.
    steps: u32,
    /// Timestamp of the last pointer movement (ms).
    last_move_ms: f64,
}

impl DwellIntensity {
    /// New signal at zero heat; the pointer counts as having moved at
    /// `now_ms`.
    pub fn new(config: DwellConfig, now_ms: f64) -> Self {
        Self {
            config,
            steps: 0,
            last_move_ms: now_ms,
        }
    }

    /// Current heat in [0, 1].
    pub fn intensity(&self) -> f64 {
        (self.steps as f64 * self.config.step).min(1.0)
    }

    pub fn last_move_ms(&self) -> f64 {
        self.last_move_ms
    }

    /// Pointer moved: heat resets immediately.
    pub fn pointer_moved(&mut self, now_ms: f64) {
        if self.steps > 0 {
            debug!("Dwell heat reset from {:.2}", self.intensity());
        }
        self.steps = 0;
        self.last_move_ms = now_ms;
    }

    /// Dwell timer fired. Returns the updated heat.
    pub fn on_timer(&mut self, now_ms: f64) -> f64 {
        let still_for = (now_ms - self.last_move_ms).max(0.0);
        if still_for > self.config.stationary_threshold_ms && self.intensity() < 1.0 {
            self.steps += 1;
        }
        self.intensity()
    }
}

// ── Fixation ramp ───────────────────────────────────────────

/// Tuning for heat synthesised from fixation time.
#[derive(Debug, Clone, PartialEq)]
pub struct FixationRampConfig {
    /// Fixation time at which heat reaches 1 (ms).
    pub ramp_ms: f64,
}

impl Default for FixationRampConfig {
    fn default() -> Self {
        Self { ramp_ms: 2000.0 }
    }
}

/// Heat as a linear function of time in the current fixation.
#[derive(Debug, Clone)]
pub struct FixationRamp {
    pub config: FixationRampConfig,
}

impl FixationRamp {
    pub fn new(config: FixationRampConfig) -> Self {
        Self { config }
    }

    /// Heat in [0, 1]; always 0 outside a fixation.
    pub fn intensity(&self, fixating: bool, time_in_state_ms: f64) -> f64 {
        if !fixating || self.config.ramp_ms <= 0.0 {
            return 0.0;
        }
        (time_in_state_ms / self.config.ramp_ms).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dwell_rises_only_when_still() {
        let mut d = DwellIntensity::new(DwellConfig::default(), 0.0);
        // Within the stationary threshold: no heat
        assert_eq!(d.on_timer(50.0), 0.0);
        assert_eq!(d.on_timer(100.0), 0.0);
        // Past it: one step per tick
        assert_eq!(d.on_timer(150.0), 0.05);
    }

    #[test]
    fn test_dwell_k_ticks() {
        let mut d = DwellIntensity::new(DwellConfig::default(), 0.0);
        for k in 1..=30u32 {
            let now = 100.0 + 50.0 * k as f64;
            let value = d.on_timer(now);
            assert_eq!(value, (k as f64 * 0.05).min(1.0), "tick {k}");
        }
        assert_eq!(d.intensity(), 1.0);
    }

    #[test]
    fn test_dwell_resets_on_move() {
        let mut d = DwellIntensity::new(DwellConfig::default(), 0.0);
        for i in 0..10 {
            d.on_timer(150.0 + 50.0 * i as f64);
        }
        assert!(d.intensity() > 0.0);

        d.pointer_moved(700.0);
        assert_eq!(d.intensity(), 0.0);
        assert_eq!(d.last_move_ms(), 700.0);

        // Freshly moved: threshold applies again
        assert_eq!(d.on_timer(750.0), 0.0);
        assert_eq!(d.on_timer(850.0), 0.05);
    }

    #[test]
    fn test_dwell_clock_anomaly() {
        let mut d = DwellIntensity::new(DwellConfig::default(), 1000.0);
        assert_eq!(d.on_timer(500.0), 0.0);
    }

    #[test]
    fn test_fixation_ramp() {
        let ramp = FixationRamp::new(FixationRampConfig::default());
        assert_eq!(ramp.intensity(true, 0.0), 0.0);
        assert_eq!(ramp.intensity(true, 1000.0), 0.5);
        assert_eq!(ramp.intensity(true, 5000.0), 1.0);
        assert_eq!(ramp.intensity(false, 1000.0), 0.0);
        assert_eq!(ramp.intensity(true, -10.0), 0.0);
    }
}
