//! Wall-clock stopwatch for pipeline stages.

use std::time::Instant;

/// A simple timer that measures elapsed time for one named stage.
#[derive(Debug)]
pub struct StageTimer {
    label: &'static str,
    start: Instant,
}

impl StageTimer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Seconds since the timer was started.
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stop the timer and return elapsed time in seconds.
    pub fn stop(self) -> f64 {
        self.elapsed_s()
    }
}
