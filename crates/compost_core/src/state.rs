use std::time::Duration;

use crate::{StartupPolicy, Timings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    PendingDebounce,
    Reconciling,
    /// A pass just touched the DOM; mutations are ours until it settles.
    Suppressed,
}

/// Reconciler state driven by [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileState {
    phase: Phase,
    generation: u64,
    passes_started: u64,
    items_seen: bool,
    polls_left: u32,
    poll_interval: Duration,
    timings: Timings,
}

impl Default for ReconcileState {
    fn default() -> Self {
        Self::new(Timings::default(), &StartupPolicy::default())
    }
}

impl ReconcileState {
    pub fn new(timings: Timings, startup: &StartupPolicy) -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            passes_started: 0,
            items_seen: false,
            polls_left: startup.poll_retries,
            poll_interval: startup.poll_interval,
            timings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn passes_started(&self) -> u64 {
        self.passes_started
    }

    /// Whether any pass has found at least one qualifying item.
    pub fn items_seen(&self) -> bool {
        self.items_seen
    }

    pub fn polls_left(&self) -> u32 {
        self.polls_left
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn arm_debounce(&mut self) -> u64 {
        self.generation += 1;
        self.phase = Phase::PendingDebounce;
        self.generation
    }

    pub(crate) fn begin_pass(&mut self) {
        self.passes_started += 1;
        self.phase = Phase::Reconciling;
    }

    pub(crate) fn mark_items_seen(&mut self) {
        self.items_seen = true;
    }

    pub(crate) fn consume_poll(&mut self) -> bool {
        if self.polls_left == 0 {
            return false;
        }
        self.polls_left -= 1;
        true
    }
}
