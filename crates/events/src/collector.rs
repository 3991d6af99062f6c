//! Per-transaction event collector.

use tracing::debug;

use tagrelay_core::types::FiredEvent;

/// Accumulates fired events for one logical unit of work — one page request,
/// one cart mutation. Create a fresh collector per scope and discard it at
/// the end; events never leak across scopes.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<FiredEvent>,
    delayed: Vec<FiredEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fired event.
    pub fn add(&mut self, event: FiredEvent) {
        debug!(event = %event.name(), "event collected");
        self.events.push(event);
    }

    /// Record an event that must surface on the *next* response — the
    /// current one redirects before any snippet renders. The host drains
    /// these with [`take_delayed`](Self::take_delayed), stashes them in its
    /// session store, and replays them into the next request's collector via
    /// [`add`](Self::add).
    pub fn add_delayed(&mut self, event: FiredEvent) {
        debug!(event = %event.name(), "event delayed to next response");
        self.delayed.push(event);
    }

    /// Snapshot of the collected events in firing order. The returned
    /// sequence does not alias the collector; events added afterwards do not
    /// appear in it.
    pub fn events(&self) -> Vec<FiredEvent> {
        self.events.clone()
    }

    /// Drain the delayed events. Each drains exactly once.
    pub fn take_delayed(&mut self) -> Vec<FiredEvent> {
        std::mem::take(&mut self.delayed)
    }

    /// Drop everything collected in this scope.
    pub fn reset(&mut self) {
        self.events.clear();
        self.delayed.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
