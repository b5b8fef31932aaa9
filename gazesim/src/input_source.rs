//! Scripted host input for demos and integration tests.
//!
//! Provides `InputEvent` and the `InputProvider` trait so a pointer path
//! (moves, rests, viewport resizes) can be replayed into a running
//! simulation through its input channel.

use std::collections::VecDeque;
use std::time::Duration;

use crate::geometry::{Point2D, Viewport};
use crate::runtime::HostEvent;

/// A scripted input step.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to screen coordinates.
    PointerMove { x: f64, y: f64 },
    /// Viewport resized.
    Resize { width: f64, height: f64 },
    /// Wait before the next event.
    Wait { duration: Duration },
}

impl InputEvent {
    /// Host event to forward, or None for pacing steps.
    pub fn to_host_event(&self) -> Option<HostEvent> {
        match *self {
            Self::PointerMove { x, y } => Some(HostEvent::PointerMoved(Point2D::new(x, y))),
            Self::Resize { width, height } => {
                Some(HostEvent::ViewportResized(Viewport::new(width, height)))
            }
            Self::Wait { .. } => None,
        }
    }
}

/// Source of scripted input events.
pub trait InputProvider: Send {
    /// Get the next input event, if any.
    fn next_event(&mut self) -> Option<InputEvent>;
    /// Whether there are more events to deliver.
    fn has_events(&self) -> bool;
}

/// Delivers events from a pre-defined queue.
pub struct ScriptedInputProvider {
    events: VecDeque<InputEvent>,
}

impl ScriptedInputProvider {
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self {
            events: VecDeque::from(events),
        }
    }

    /// Pointer sweeps across the viewport in `steps` moves spaced `step`
    /// apart, then rests for `rest`.
    pub fn sweep_then_rest(
        viewport: &Viewport,
        steps: usize,
        step: Duration,
        rest: Duration,
    ) -> Self {
        let mut events = Vec::with_capacity(steps * 2 + 1);
        let y = viewport.height / 2.0;
        for i in 0..steps {
            let x = viewport.width * (i as f64 + 0.5) / steps.max(1) as f64;
            events.push(InputEvent::PointerMove { x, y });
            events.push(InputEvent::Wait { duration: step });
        }
        events.push(InputEvent::Wait { duration: rest });
        Self::new(events)
    }

    /// Number of remaining events.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputProvider for ScriptedInputProvider {
    fn next_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}
