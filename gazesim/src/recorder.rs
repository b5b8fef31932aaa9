//! Gaze frame recording and replay for visual regression checks.
//!
//! Records the frames a session emits (state, position, intensity) and
//! serializes them as s-expressions. A trace can be parsed back and
//! checked against a rerun with the same seed.

use std::collections::VecDeque;

use rand::Rng;

use crate::error::TraceError;
use crate::gaze::{GazeFrame, GazeSession, GazeState};
use crate::geometry::Point2D;

/// Positions are written with two decimals.
const POSITION_TOLERANCE: f64 = 0.006;

/// A single recorded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    /// Simulation timestamp (ms).
    pub timestamp_ms: f64,
    pub state: GazeState,
    pub position: Point2D,
    pub path_index: usize,
    pub intensity: f64,
    /// Whether the frame changed state.
    pub transitioned: bool,
}

impl RecordedFrame {
    pub fn from_frame(frame: &GazeFrame, intensity: f64) -> Self {
        Self {
            timestamp_ms: frame.timestamp_ms,
            state: frame.state,
            position: frame.position,
            path_index: frame.path_index,
            intensity,
            transitioned: frame.transitioned,
        }
    }

    /// Serialize to a simple s-expression. The timestamp is written
    /// exactly so a rerun can tick at the same instants.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:t {:?} :state :{} :x {:.2} :y {:.2} :waypoint {} :intensity {:.3}{})",
            self.timestamp_ms,
            self.state.as_str(),
            self.position.x,
            self.position.y,
            self.path_index,
            self.intensity,
            if self.transitioned { " :transition t" } else { "" },
        )
    }

    /// Parse one frame line written by `to_sexp`.
    fn parse_sexp(line: &str) -> Result<Self, String> {
        let mut timestamp_ms = None;
        let mut state = None;
        let mut x = None;
        let mut y = None;
        let mut path_index = None;
        let mut intensity = None;
        let mut transitioned = false;

        for (key, value) in plist(line)? {
            match key {
                ":t" => timestamp_ms = Some(number(key, value)?),
                ":state" => {
                    state = Some(
                        value
                            .strip_prefix(':')
                            .and_then(GazeState::from_str)
                            .ok_or_else(|| format!("unknown state {}", value))?,
                    )
                }
                ":x" => x = Some(number(key, value)?),
                ":y" => y = Some(number(key, value)?),
                ":waypoint" => {
                    path_index = Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| format!("bad waypoint index {}", value))?,
                    )
                }
                ":intensity" => intensity = Some(number(key, value)?),
                ":transition" => transitioned = value == "t",
                other => return Err(format!("unknown key {}", other)),
            }
        }

        Ok(Self {
            timestamp_ms: timestamp_ms.ok_or("missing :t")?,
            state: state.ok_or("missing :state")?,
            position: Point2D::new(x.ok_or("missing :x")?, y.ok_or("missing :y")?),
            path_index: path_index.ok_or("missing :waypoint")?,
            intensity: intensity.ok_or("missing :intensity")?,
            transitioned,
        })
    }

    /// Same gaze path as `other`, up to the precision of a written trace.
    /// Intensity is not compared since pointer dwell depends on live input.
    fn same_path(&self, other: &Self) -> bool {
        self.timestamp_ms == other.timestamp_ms
            && self.state == other.state
            && self.path_index == other.path_index
            && self.transitioned == other.transitioned
            && (self.position.x - other.position.x).abs() <= POSITION_TOLERANCE
            && (self.position.y - other.position.y).abs() <= POSITION_TOLERANCE
    }
}

/// Split `(:k v :k v)` into key/value pairs.
fn plist(line: &str) -> Result<Vec<(&str, &str)>, String> {
    let body = line
        .trim()
        .strip_prefix('(')
        .and_then(|l| l.strip_suffix(')'))
        .ok_or("not an s-expression")?;
    let mut tokens = body.split_whitespace();
    let mut pairs = Vec::new();
    while let Some(key) = tokens.next() {
        let value = tokens
            .next()
            .ok_or_else(|| format!("{} has no value", key))?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn number(key: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("{} is not a number: {}", key, value))
}

/// Frame recorder. Keeps at most `max_frames`, dropping the oldest.
#[derive(Debug)]
pub struct FrameRecorder {
    /// Whether recording is active.
    pub active: bool,
    /// Recorded frames in order.
    pub frames: VecDeque<RecordedFrame>,
    /// Session name/label.
    pub session_name: Option<String>,
    /// Simulation time when recording started.
    pub started_at_ms: Option<f64>,
    pub max_frames: usize,
    /// Frames dropped because the recorder was full.
    pub dropped: u64,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl FrameRecorder {
    /// Create a new inactive recorder.
    pub fn new(max_frames: usize) -> Self {
        Self {
            active: false,
            frames: VecDeque::new(),
            session_name: None,
            started_at_ms: None,
            max_frames,
            dropped: 0,
        }
    }

    /// Start recording, discarding any previous frames.
    pub fn start(&mut self, session_name: Option<String>, now_ms: f64) {
        self.active = true;
        self.frames.clear();
        self.dropped = 0;
        self.session_name = session_name;
        self.started_at_ms = Some(now_ms);
    }

    /// Stop recording.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Record a frame if recording is active.
    pub fn record(&mut self, frame: &GazeFrame, intensity: f64) {
        if !self.active || self.max_frames == 0 {
            return;
        }
        if self.frames.len() >= self.max_frames {
            self.frames.pop_front();
            self.dropped += 1;
        }
        self.frames.push_back(RecordedFrame::from_frame(frame, intensity));
    }

    /// Serialize the recording, one frame per line after a header line.
    pub fn to_sexp_lines(&self) -> String {
        let mut out = self.header_sexp();
        out.push('\n');
        for frame in &self.frames {
            out.push_str(&frame.to_sexp());
            out.push('\n');
        }
        out
    }

    fn header_sexp(&self) -> String {
        format!(
            "(:session-name {} :started-at {:?} :frame-count {} :dropped {})",
            match &self.session_name {
                Some(n) => format!("\"{}\"", n.replace('\\', "\\\\").replace('"', "\\\"")),
                None => "nil".to_string(),
            },
            self.started_at_ms.unwrap_or(0.0),
            self.frames.len(),
            self.dropped,
        )
    }

    /// Get recording status as s-expression.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:active {} :frame-count {} :dropped {})",
            if self.active { "t" } else { "nil" },
            self.frames.len(),
            self.dropped,
        )
    }
}

/// Replays a recorded trace in order.
#[derive(Debug)]
pub struct FrameReplayer {
    frames: VecDeque<RecordedFrame>,
    /// Simulation time the recording started at.
    pub started_at_ms: f64,
    /// Frames the recorder dropped before writing the trace.
    pub dropped: u64,
    /// Total frames in the recording.
    pub total: usize,
    /// Frames consumed so far.
    pub consumed: usize,
}

impl FrameReplayer {
    pub fn new(started_at_ms: f64, frames: impl IntoIterator<Item = RecordedFrame>) -> Self {
        let frames: VecDeque<RecordedFrame> = frames.into_iter().collect();
        let total = frames.len();
        Self {
            frames,
            started_at_ms,
            dropped: 0,
            total,
            consumed: 0,
        }
    }

    /// Parse a trace written by `FrameRecorder::to_sexp_lines`.
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let (_, header) = lines.next().ok_or(TraceError::Empty)?;

        let malformed = |line: usize, reason: String| TraceError::Malformed {
            line: line + 1,
            reason,
        };

        // The session name may hold anything, so read from `:started-at` on.
        let fields = header
            .rfind(":started-at ")
            .map(|at| format!("({}", &header[at..]))
            .ok_or_else(|| malformed(0, "header has no :started-at".to_string()))?;
        let mut started_at_ms = None;
        let mut frame_count = None;
        let mut dropped = 0;
        for (key, value) in plist(&fields).map_err(|r| malformed(0, r))? {
            match key {
                ":started-at" => started_at_ms = Some(number(key, value).map_err(|r| malformed(0, r))?),
                ":frame-count" => {
                    frame_count = Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| malformed(0, format!("bad frame count {}", value)))?,
                    )
                }
                ":dropped" => {
                    dropped = value
                        .parse::<u64>()
                        .map_err(|_| malformed(0, format!("bad dropped count {}", value)))?
                }
                other => return Err(malformed(0, format!("unknown header key {}", other))),
            }
        }
        let started_at_ms =
            started_at_ms.ok_or_else(|| malformed(0, "header has no :started-at".to_string()))?;

        let frames = lines
            .map(|(n, line)| RecordedFrame::parse_sexp(line).map_err(|r| malformed(n, r)))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(expected) = frame_count {
            if expected != frames.len() {
                return Err(malformed(
                    0,
                    format!("header lists {} frame(s), found {}", expected, frames.len()),
                ));
            }
        }

        let mut replayer = Self::new(started_at_ms, frames);
        replayer.dropped = dropped;
        Ok(replayer)
    }

    /// Next frame of any kind.
    pub fn next_frame(&mut self) -> Option<RecordedFrame> {
        let frame = self.frames.pop_front()?;
        self.consumed += 1;
        Some(frame)
    }

    /// Tick `gaze` at every remaining recorded timestamp and check it
    /// reproduces the recorded path. `gaze` must have been started at
    /// `started_at_ms` from the recorded run's config and seed. Returns
    /// the number of frames checked.
    pub fn verify<R: Rng>(&mut self, gaze: &mut GazeSession<R>) -> Result<usize, TraceError> {
        if self.dropped > 0 {
            return Err(TraceError::Truncated(self.dropped));
        }
        let mut checked = 0;
        while let Some(expected) = self.next_frame() {
            let frame = gaze.tick(expected.timestamp_ms);
            let actual = RecordedFrame::from_frame(&frame, expected.intensity);
            if !expected.same_path(&actual) {
                return Err(TraceError::Diverged {
                    index: self.consumed - 1,
                    timestamp_ms: expected.timestamp_ms,
                    expected: expected.to_sexp(),
                    actual: actual.to_sexp(),
                });
            }
            checked += 1;
        }
        Ok(checked)
    }
}
