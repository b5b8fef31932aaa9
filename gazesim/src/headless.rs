//! Headless driver — runs one gaze simulation on a calloop event loop.
//!
//! Supports a scripted pointer demo, graceful signal handling, an exit
//! timer for CI, periodic status logging, and frame trace recording.
//! `verify` checks a recorded trace against a seeded rerun.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use calloop::channel::Sender;
use calloop::signals::{Signal, Signals};
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::gaze::{DwellConfig, GazeSession, Preset, SimulatorConfig};
use crate::geometry::Viewport;
use crate::input_source::{InputEvent, InputProvider, ScriptedInputProvider};
use crate::recorder::FrameReplayer;
use crate::runtime::{self, HostEvent};

/// Headless run configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub preset: Preset,
    pub viewport: Viewport,
    /// Seed for reproducible paths; None seeds from entropy.
    pub seed: Option<u64>,
    pub frame_interval_ms: f64,
    /// Drive pointer dwell intensity from a scripted pointer sweep.
    pub pointer_demo: bool,
    /// Exit after N seconds.
    pub exit_after: Option<u64>,
    /// Seconds between status log lines.
    pub status_interval_s: u64,
    /// Write the frame trace here on exit.
    pub record: Option<PathBuf>,
    /// Event loop dispatch timeout in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            preset: Preset::HyperScan,
            viewport: Viewport::default(),
            seed: None,
            frame_interval_ms: 16.0,
            pointer_demo: false,
            exit_after: None,
            status_interval_s: 5,
            record: None,
            poll_interval_ms: 100,
        }
    }
}

/// State shared with loop callbacks.
struct LoopState {
    running: bool,
    status_due: bool,
}

/// Simulator config for a headless run.
fn simulation_config(config: &HeadlessConfig) -> SimulatorConfig {
    let mut sim_config = config.preset.config(&config.viewport);
    sim_config.seed = config.seed;
    sim_config.frame_interval_ms = config.frame_interval_ms;
    if config.pointer_demo {
        sim_config = sim_config.with_pointer_intensity(DwellConfig::default());
    }
    sim_config
}

/// Replay a pointer sweep into the simulation until the channel closes.
fn spawn_pointer_demo(sender: Sender<HostEvent>, viewport: Viewport) {
    thread::spawn(move || loop {
        let mut provider = ScriptedInputProvider::sweep_then_rest(
            &viewport,
            24,
            Duration::from_millis(30),
            Duration::from_millis(1500),
        );
        while let Some(event) = provider.next_event() {
            match event {
                InputEvent::Wait { duration } => thread::sleep(duration),
                other => {
                    let Some(host_event) = other.to_host_event() else {
                        continue;
                    };
                    if sender.send(host_event).is_err() {
                        debug!("Pointer demo stopped: simulation gone");
                        return;
                    }
                }
            }
        }
    });
}

/// Run a simulation until a signal or the exit timer stops it.
pub fn run(config: HeadlessConfig) -> anyhow::Result<()> {
    let mut event_loop: EventLoop<'static, LoopState> = EventLoop::try_new()?;
    let mut state = LoopState {
        running: true,
        status_due: false,
    };

    let sim_config = simulation_config(&config);

    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let mut sim = runtime::start(&event_loop.handle(), &sim_config, config.viewport, clock)
        .context("failed to start gaze simulation")?;
    info!(
        "Preset {} on {:.0}x{:.0} viewport{}",
        config.preset.as_str(),
        config.viewport.width,
        config.viewport.height,
        match config.seed {
            Some(seed) => format!(", seed {}", seed),
            None => String::new(),
        }
    );

    if config.record.is_some() {
        sim.start_recording(Some(config.preset.as_str().to_string()));
    }
    if config.pointer_demo {
        spawn_pointer_demo(sim.input_sender(), config.viewport);
    }

    // Signal handling: SIGTERM and SIGINT for graceful shutdown
    let signals = Signals::new(&[Signal::SIGTERM, Signal::SIGINT])
        .map_err(|e| anyhow::anyhow!("failed to create signal source: {}", e))?;
    event_loop
        .handle()
        .insert_source(signals, |event, _, state: &mut LoopState| {
            info!("Received signal {:?}, shutting down", event.signal());
            state.running = false;
        })
        .map_err(|e| anyhow::anyhow!("failed to register signal handler: {}", e.error))?;

    // Exit timer for CI
    if let Some(seconds) = config.exit_after {
        info!("Will exit after {} seconds", seconds);
        event_loop
            .handle()
            .insert_source(
                Timer::from_duration(Duration::from_secs(seconds)),
                |_, _, state: &mut LoopState| {
                    info!("Exit timer fired");
                    state.running = false;
                    TimeoutAction::Drop
                },
            )
            .map_err(|e| anyhow::anyhow!("failed to register exit timer: {}", e.error))?;
    }

    // Periodic status logging
    let status_every = Duration::from_secs(config.status_interval_s.max(1));
    event_loop
        .handle()
        .insert_source(
            Timer::from_duration(status_every),
            move |_, _, state: &mut LoopState| {
                state.status_due = true;
                TimeoutAction::ToDuration(status_every)
            },
        )
        .map_err(|e| anyhow::anyhow!("failed to register status timer: {}", e.error))?;

    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    while state.running {
        event_loop.dispatch(Some(poll_interval), &mut state)?;
        if state.status_due {
            state.status_due = false;
            info!("Gaze status: {}", sim.status_sexp());
        }
    }

    sim.cancel();

    if let Some(path) = &config.record {
        let trace = sim.finish_recording();
        std::fs::write(path, trace)
            .with_context(|| format!("failed to write frame trace to {}", path.display()))?;
        info!("Frame trace written to {}", path.display());
    }

    info!("Headless run finished after {} tick(s)", sim.ticks());
    Ok(())
}

/// Check a trace written by `run` against a rerun with the same preset,
/// viewport and seed. Fails at the first frame whose gaze path differs.
pub fn verify(config: &HeadlessConfig, trace: &Path) -> anyhow::Result<()> {
    if config.seed.is_none() {
        anyhow::bail!("verifying a trace needs the --seed it was recorded with");
    }

    let text = std::fs::read_to_string(trace)
        .with_context(|| format!("failed to read frame trace {}", trace.display()))?;
    let mut replayer = FrameReplayer::parse(&text)
        .with_context(|| format!("invalid frame trace {}", trace.display()))?;

    let sim_config = simulation_config(config).laid_out(&config.viewport);
    let mut gaze = GazeSession::from_config(&sim_config, replayer.started_at_ms)?;
    let checked = replayer.verify(&mut gaze)?;

    info!(
        "Frame trace {} matches: {} frame(s), preset {}",
        trace.display(),
        checked,
        config.preset.as_str()
    );
    Ok(())
}
