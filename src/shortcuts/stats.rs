//! Execution counters and timing telemetry. Read-only to callers.

use std::time::{Duration, Instant};

/// Engine-wide counters, snapshot via
/// [`crate::shortcuts::ShortcutEngine::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub total_executed: u64,
    pub total_registered: u64,
    pub conflicts_detected: u64,
    pub sequences_completed: u64,
    pub chords_executed: u64,
    pub context_switches: u64,
    pub customizations_applied: u64,
}

/// Per-binding execution telemetry.
#[derive(Clone, Copy, Debug)]
pub struct BindingStats {
    pub registered_at: Instant,
    pub last_executed: Option<Instant>,
    pub execution_count: u64,
    /// Running mean of callback execution time.
    pub average_execution_time: Duration,
}

impl BindingStats {
    pub(crate) fn new(registered_at: Instant) -> Self {
        Self {
            registered_at,
            last_executed: None,
            execution_count: 0,
            average_execution_time: Duration::ZERO,
        }
    }

    pub(crate) fn record_execution(&mut self, at: Instant, duration: Duration) {
        self.execution_count += 1;
        self.last_executed = Some(at);
        let n = self.execution_count as f64;
        let prev = self.average_execution_time.as_secs_f64();
        self.average_execution_time =
            Duration::from_secs_f64((prev * (n - 1.0) + duration.as_secs_f64()) / n);
    }
}
