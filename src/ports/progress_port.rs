//! Progress observer port.
//!
//! Sinks are handed to the orchestrator per run, so concurrent runs never share
//! a registry. Delivery is fire-and-forget: `send` has no return value and a
//! sink must not block the simulation.

use crate::domain::progress::ProgressEvent;

pub trait ProgressSink {
    fn send(&self, event: ProgressEvent);
}

impl<F: Fn(ProgressEvent)> ProgressSink for F {
    fn send(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn send(&self, _event: ProgressEvent) {}
}
