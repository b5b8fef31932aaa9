//! Event-loop harness for a gaze simulation.
//!
//! `start` registers three calloop sources for one session:
//! - a frame timer that ticks the gaze simulator,
//! - a dwell timer (pointer intensity only),
//! - an input channel carrying pointer moves and viewport resizes.
//!
//! The returned `SimulationHandle` owns all three registrations. Cancelling
//! or dropping it removes them, and any callback already queued by the
//! loop sees the session as dead and leaves it untouched.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use calloop::channel::{self, Sender};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::SimulatorError;
use crate::gaze::{
    DwellIntensity, FixationRamp, GazeFrame, GazeSession, GazeState, HeatStyle,
    HeatStyleConfig, IntensitySource, SimulatorConfig, TrailSegment,
};
use crate::geometry::{Point2D, Viewport};
use crate::recorder::FrameRecorder;

// ── Host input ──────────────────────────────────────────────

/// Input delivered to a running simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Real pointer moved, in screen coordinates.
    PointerMoved(Point2D),
    /// Host viewport changed size.
    ViewportResized(Viewport),
}

// ── Session state ───────────────────────────────────────────

/// Intensity signal selected by the config.
#[derive(Debug)]
enum IntensitySignal {
    Fixation(FixationRamp),
    Dwell(DwellIntensity),
}

/// Everything the loop callbacks mutate.
#[derive(Debug)]
struct Session {
    gaze: GazeSession,
    /// Waypoints in percent of the viewport, if they follow it.
    landmarks: Option<Vec<Point2D>>,
    intensity: IntensitySignal,
    heat: HeatStyleConfig,
    viewport: Viewport,
    pointer: Option<Point2D>,
    last_frame: GazeFrame,
    recorder: FrameRecorder,
    ticks: u64,
}

impl Session {
    fn new(gaze: GazeSession, config: &SimulatorConfig, viewport: Viewport, now_ms: f64) -> Self {
        let intensity = match &config.intensity {
            IntensitySource::Fixation(ramp) => IntensitySignal::Fixation(FixationRamp::new(ramp.clone())),
            IntensitySource::Pointer(dwell) => {
                IntensitySignal::Dwell(DwellIntensity::new(dwell.clone(), now_ms))
            }
        };
        let last_frame = gaze.snapshot(now_ms);
        Self {
            gaze,
            landmarks: config.landmarks_percent.clone(),
            intensity,
            heat: HeatStyleConfig::default(),
            viewport,
            pointer: None,
            last_frame,
            recorder: FrameRecorder::default(),
            ticks: 0,
        }
    }

    fn on_frame(&mut self, now_ms: f64) {
        let frame = self.gaze.tick(now_ms);
        self.last_frame = frame;
        self.ticks += 1;
        let intensity = self.intensity();
        self.recorder.record(&frame, intensity);
    }

    fn on_dwell_timer(&mut self, now_ms: f64) {
        if let IntensitySignal::Dwell(dwell) = &mut self.intensity {
            dwell.on_timer(now_ms);
        }
    }

    fn on_host_event(&mut self, event: HostEvent, now_ms: f64) {
        match event {
            HostEvent::PointerMoved(p) => {
                self.pointer = Some(p);
                if let IntensitySignal::Dwell(dwell) = &mut self.intensity {
                    dwell.pointer_moved(now_ms);
                }
            }
            HostEvent::ViewportResized(vp) => {
                info!("Gaze viewport resized to {:.0}x{:.0}", vp.width, vp.height);
                self.viewport = vp;
                if let Some(landmarks) = &self.landmarks {
                    if let Err(e) = self.gaze.relayout(vp.lay_out(landmarks)) {
                        warn!("Gaze relayout failed: {}", e);
                    }
                }
            }
        }
    }

    fn intensity(&self) -> f64 {
        match &self.intensity {
            IntensitySignal::Fixation(ramp) => ramp.intensity(
                self.last_frame.state == GazeState::Fixation,
                self.last_frame.time_in_state_ms,
            ),
            IntensitySignal::Dwell(dwell) => dwell.intensity(),
        }
    }
}

// ── Callbacks ───────────────────────────────────────────────

fn frame_callback(
    live: &Cell<bool>,
    session: &RefCell<Session>,
    clock: &dyn Clock,
    interval: Duration,
) -> TimeoutAction {
    if !live.get() {
        return TimeoutAction::Drop;
    }
    session.borrow_mut().on_frame(clock.now_ms());
    TimeoutAction::ToDuration(interval)
}

fn dwell_callback(
    live: &Cell<bool>,
    session: &RefCell<Session>,
    clock: &dyn Clock,
    period: Duration,
) -> TimeoutAction {
    if !live.get() {
        return TimeoutAction::Drop;
    }
    session.borrow_mut().on_dwell_timer(clock.now_ms());
    TimeoutAction::ToDuration(period)
}

fn input_callback(
    live: &Cell<bool>,
    session: &RefCell<Session>,
    clock: &dyn Clock,
    event: channel::Event<HostEvent>,
) {
    if !live.get() {
        return;
    }
    match event {
        channel::Event::Msg(ev) => session.borrow_mut().on_host_event(ev, clock.now_ms()),
        channel::Event::Closed => debug!("Gaze input channel closed"),
    }
}

fn millis(ms: f64) -> Duration {
    Duration::from_secs_f64(ms / 1000.0)
}

fn scheduler_error(source_name: &'static str, error: calloop::Error) -> SimulatorError {
    SimulatorError::Scheduler {
        source_name,
        reason: error.to_string(),
    }
}

// ── Start / handle ──────────────────────────────────────────

/// Start a simulation on `loop_handle`.
///
/// Fails without registering anything if the config is invalid. If any
/// source cannot be registered, the ones already registered are removed
/// before the error is returned.
pub fn start<D: 'static>(
    loop_handle: &LoopHandle<'static, D>,
    config: &SimulatorConfig,
    viewport: Viewport,
    clock: Rc<dyn Clock>,
) -> Result<SimulationHandle<D>, SimulatorError> {
    config.validate()?;
    let config = &config.laid_out(&viewport);
    let now = clock.now_ms();
    let gaze = GazeSession::from_config(config, now)?;
    let session = Rc::new(RefCell::new(Session::new(gaze, config, viewport, now)));
    let live = Rc::new(Cell::new(true));
    let (sender, input) = channel::channel::<HostEvent>();

    let mut handle = SimulationHandle {
        loop_handle: loop_handle.clone(),
        session: session.clone(),
        live: live.clone(),
        tokens: Vec::new(),
        sender,
    };

    // Frame tick
    let interval = millis(config.frame_interval_ms);
    let (s, l, c) = (session.clone(), live.clone(), clock.clone());
    let token = loop_handle
        .insert_source(Timer::from_duration(interval), move |_, _, _| {
            frame_callback(&l, &s, c.as_ref(), interval)
        })
        .map_err(|e| scheduler_error("frame timer", e.error))?;
    handle.tokens.push(("frame timer", token));

    // Dwell tick
    if let IntensitySource::Pointer(dwell) = &config.intensity {
        let period = millis(dwell.tick_period_ms);
        let (s, l, c) = (session.clone(), live.clone(), clock.clone());
        let token = loop_handle
            .insert_source(Timer::from_duration(period), move |_, _, _| {
                dwell_callback(&l, &s, c.as_ref(), period)
            })
            .map_err(|e| scheduler_error("dwell timer", e.error))?;
        handle.tokens.push(("dwell timer", token));
    }

    // Pointer / viewport input
    let (s, l, c) = (session, live, clock);
    let token = loop_handle
        .insert_source(input, move |event, _, _| {
            input_callback(&l, &s, c.as_ref(), event)
        })
        .map_err(|e| scheduler_error("input channel", e.error))?;
    handle.tokens.push(("input channel", token));

    info!(
        "Gaze simulation started: {} waypoint(s), frame every {:.0} ms, {} source(s)",
        config.waypoints.len(),
        config.frame_interval_ms,
        handle.tokens.len()
    );
    Ok(handle)
}

/// Owner of a running simulation's loop registrations, and the read side
/// for renderers.
pub struct SimulationHandle<D: 'static> {
    loop_handle: LoopHandle<'static, D>,
    session: Rc<RefCell<Session>>,
    live: Rc<Cell<bool>>,
    tokens: Vec<(&'static str, RegistrationToken)>,
    sender: Sender<HostEvent>,
}

impl<D: 'static> SimulationHandle<D> {
    /// Stop the simulation. Idempotent; also runs on drop.
    pub fn cancel(&mut self) {
        let was_live = self.live.replace(false);
        for (name, token) in self.tokens.drain(..) {
            self.loop_handle.remove(token);
            debug!("Removed gaze {}", name);
        }
        if was_live {
            let ticks = self.session.try_borrow().map(|s| s.ticks).unwrap_or(0);
            info!("Gaze simulation cancelled after {} tick(s)", ticks);
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Sender for pointer and viewport events. Sends fail once cancelled.
    pub fn input_sender(&self) -> Sender<HostEvent> {
        self.sender.clone()
    }

    /// Rendered position, offset from the viewport centre.
    pub fn current_position(&self) -> Point2D {
        self.session.borrow().gaze.position()
    }

    /// Rendered position in screen coordinates.
    pub fn screen_position(&self) -> Point2D {
        let s = self.session.borrow();
        s.viewport.to_screen(s.gaze.position())
    }

    pub fn current_intensity(&self) -> f64 {
        self.session.borrow().intensity()
    }

    pub fn is_fixating(&self) -> bool {
        self.session.borrow().gaze.is_fixating()
    }

    /// Waypoint the gaze is on or heading to, offset from the viewport
    /// centre.
    pub fn current_target(&self) -> Point2D {
        self.session.borrow().gaze.current_target()
    }

    /// Recent saccades, oldest first.
    pub fn trail(&self) -> Vec<TrailSegment> {
        self.session.borrow().gaze.trail().to_vec()
    }

    /// Blob styling for the current frame.
    pub fn heat_style(&self) -> HeatStyle {
        let s = self.session.borrow();
        HeatStyle::derive(&s.heat, s.intensity(), s.gaze.is_fixating())
    }

    pub fn last_frame(&self) -> GazeFrame {
        self.session.borrow().last_frame
    }

    /// Last real pointer position seen, in screen coordinates.
    pub fn pointer_position(&self) -> Option<Point2D> {
        self.session.borrow().pointer
    }

    pub fn viewport(&self) -> Viewport {
        self.session.borrow().viewport
    }

    /// Frame ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.session.borrow().ticks
    }

    /// Begin recording emitted frames.
    pub fn start_recording(&self, name: Option<String>) {
        let mut s = self.session.borrow_mut();
        let now = s.last_frame.timestamp_ms;
        s.recorder.start(name, now);
    }

    /// Stop recording and return the trace as s-expression lines.
    pub fn finish_recording(&self) -> String {
        let mut s = self.session.borrow_mut();
        s.recorder.stop();
        if s.recorder.dropped > 0 {
            warn!("Frame recorder dropped {} frame(s)", s.recorder.dropped);
        }
        s.recorder.to_sexp_lines()
    }

    /// Status as an s-expression.
    pub fn status_sexp(&self) -> String {
        let s = self.session.borrow();
        format!(
            "(:live {} :ticks {} :intensity {:.2} :viewport ({:.0} {:.0}) :gaze {} :recorder {})",
            if self.live.get() { "t" } else { "nil" },
            s.ticks,
            s.intensity(),
            s.viewport.width,
            s.viewport.height,
            s.gaze.status_sexp(),
            s.recorder.status_sexp(),
        )
    }
}

impl<D: 'static> Drop for SimulationHandle<D> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::gaze::{DwellConfig, FixationRange, Preset};

    fn config() -> SimulatorConfig {
        SimulatorConfig {
            waypoints: vec![Point2D::new(0.0, 0.0), Point2D::new(100.0, 0.0)],
            fixation_duration: FixationRange::new(500.0, 500.0),
            saccade_duration_ms: 50.0,
            jitter_amplitude_px: 0.0,
            random_jump_probability: 0.0,
            seed: Some(3),
            ..SimulatorConfig::default()
        }
    }

    fn session(config: &SimulatorConfig) -> RefCell<Session> {
        let gaze = GazeSession::from_config(config, 0.0).unwrap();
        RefCell::new(Session::new(gaze, config, Viewport::default(), 0.0))
    }

    #[test]
    fn test_frame_callback_ticks_while_live() {
        let cfg = config();
        let s = session(&cfg);
        let live = Cell::new(true);
        let clock = TestClock::at(600.0);
        let action = frame_callback(&live, &s, &clock, Duration::from_millis(16));
        assert!(matches!(action, TimeoutAction::ToDuration(_)));
        assert_eq!(s.borrow().ticks, 1);
        assert!(!s.borrow().gaze.is_fixating());
    }

    #[test]
    fn test_queued_callbacks_after_cancel_do_nothing() {
        let cfg = config().with_pointer_intensity(DwellConfig::default());
        let s = session(&cfg);
        let live = Cell::new(false);
        let clock = TestClock::at(10_000.0);

        let action = frame_callback(&live, &s, &clock, Duration::from_millis(16));
        assert!(matches!(action, TimeoutAction::Drop));
        let action = dwell_callback(&live, &s, &clock, Duration::from_millis(50));
        assert!(matches!(action, TimeoutAction::Drop));
        input_callback(
            &live,
            &s,
            &clock,
            channel::Event::Msg(HostEvent::PointerMoved(Point2D::new(5.0, 5.0))),
        );

        let s = s.borrow();
        assert_eq!(s.ticks, 0);
        assert!(s.gaze.is_fixating());
        assert_eq!(s.intensity(), 0.0);
        assert!(s.pointer.is_none());
    }

    #[test]
    fn test_pointer_event_resets_dwell() {
        let cfg = config().with_pointer_intensity(DwellConfig::default());
        let s = session(&cfg);
        let live = Cell::new(true);
        let clock = TestClock::new();
        for k in 1..=5 {
            clock.set_ms(100.0 + 50.0 * k as f64);
            dwell_callback(&live, &s, &clock, Duration::from_millis(50));
        }
        assert_eq!(s.borrow().intensity(), (5.0 * 0.05f64).min(1.0));

        input_callback(
            &live,
            &s,
            &clock,
            channel::Event::Msg(HostEvent::PointerMoved(Point2D::new(5.0, 5.0))),
        );
        assert_eq!(s.borrow().intensity(), 0.0);
        assert_eq!(s.borrow().pointer, Some(Point2D::new(5.0, 5.0)));
    }

    #[test]
    fn test_viewport_resize() {
        let cfg = config();
        let s = session(&cfg);
        let live = Cell::new(true);
        input_callback(
            &live,
            &s,
            &TestClock::new(),
            channel::Event::Msg(HostEvent::ViewportResized(Viewport::new(800.0, 600.0))),
        );
        assert_eq!(s.borrow().viewport, Viewport::new(800.0, 600.0));
    }

    #[test]
    fn test_resize_relays_out_percent_landmarks() {
        let cfg = Preset::Tour.config(&Viewport::new(1000.0, 1000.0));
        let gaze = GazeSession::from_config(&cfg, 0.0).unwrap();
        let s = RefCell::new(Session::new(gaze, &cfg, Viewport::new(1000.0, 1000.0), 0.0));
        let live = Cell::new(true);
        input_callback(
            &live,
            &s,
            &TestClock::new(),
            channel::Event::Msg(HostEvent::ViewportResized(Viewport::new(2000.0, 2000.0))),
        );

        let s = s.borrow();
        // Logo landmark at (10 %, 5 %) of the new page
        let logo = s.viewport.to_screen(s.gaze.current_target());
        assert!(logo.distance(Point2D::new(200.0, 100.0)) < 1e-9);
        let header = s.viewport.to_screen(s.gaze.waypoints()[3]);
        assert!(header.distance(Point2D::new(1700.0, 100.0)) < 1e-9);
    }

    #[test]
    fn test_resize_keeps_plain_offsets() {
        let cfg = config();
        let s = session(&cfg);
        input_callback(
            &Cell::new(true),
            &s,
            &TestClock::new(),
            channel::Event::Msg(HostEvent::ViewportResized(Viewport::new(640.0, 480.0))),
        );
        assert_eq!(s.borrow().gaze.waypoints(), cfg.waypoints.as_slice());
    }

    #[test]
    fn test_fixation_intensity_follows_last_frame() {
        let cfg = config();
        let s = session(&cfg);
        s.borrow_mut().on_frame(400.0);
        // 400 ms into a fixation with a 2000 ms ramp
        assert!((s.borrow().intensity() - 0.2).abs() < 1e-9);
        s.borrow_mut().on_frame(520.0);
        assert_eq!(s.borrow().intensity(), 0.0);
    }
}
