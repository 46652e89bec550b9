//! Change detection for a node's watched image slot
//!
//! The watcher is a plain state machine; something else drives it (a poll
//! timer or a change notification) and runs the probes it asks for.
//!
//! ```text
//! Idle --value changed--> Transitioning --probe issued--> Computing
//!  ^                            |                            |
//!  +------ empty value ---------+------- probe completed ----+
//!
//! any state --stop--> Stopped (absorbing)
//! ```

use crate::probe::ImageReference;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Transitioning,
    Computing,
    Stopped,
}

/// What to do with a probe result that arrives after the slot moved on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOrder {
    /// Apply a result only if the slot still holds the reference it was issued for
    #[default]
    DiscardStale,
    /// Apply every result as it arrives; the last to complete wins
    LastCompletedWins,
}

/// A probe the watcher asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTicket {
    pub reference: ImageReference,
    pub sequence: u64,
}

/// Outcome of looking at the slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    /// The slot was emptied; nothing to show, nothing to probe
    Cleared,
    Probe(ProbeTicket),
    Stopped,
}

#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    state: WatcherState,
    last_observed: Option<String>,
    in_flight: usize,
    issued: u64,
    order: CompletionOrder,
}

impl ChangeWatcher {
    /// Start watching with the slot's value at creation; that value is not probed
    pub fn new(initial: Option<&str>, order: CompletionOrder) -> Self {
        Self {
            state: WatcherState::Idle,
            last_observed: initial.map(str::to_string),
            in_flight: 0,
            issued: 0,
            order,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn order(&self) -> CompletionOrder {
        self.order
    }

    pub fn last_observed(&self) -> Option<&str> {
        self.last_observed.as_deref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Take `current` as already seen without probing it.
    ///
    /// Used when a restored node brings its own lines for the slot's value.
    /// Probes already in flight are still accounted for.
    pub fn rebase(&mut self, current: Option<&str>) {
        if self.state == WatcherState::Stopped {
            return;
        }
        self.last_observed = current.map(str::to_string);
    }

    /// Compare the slot's current value against the last one seen
    pub fn observe(&mut self, current: Option<&str>) -> Observation {
        if self.state == WatcherState::Stopped {
            return Observation::Stopped;
        }
        if current == self.last_observed.as_deref() {
            return Observation::Unchanged;
        }

        self.state = WatcherState::Transitioning;
        self.last_observed = current.map(str::to_string);

        match ImageReference::parse(current) {
            Some(reference) => {
                self.issued += 1;
                self.in_flight += 1;
                self.state = WatcherState::Computing;
                Observation::Probe(ProbeTicket {
                    reference,
                    sequence: self.issued,
                })
            }
            None => {
                self.settle();
                Observation::Cleared
            }
        }
    }

    /// Record that a probe finished; returns whether its result should be applied
    pub fn complete(&mut self, ticket: &ProbeTicket) -> bool {
        if self.state == WatcherState::Stopped {
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        self.settle();

        match self.order {
            CompletionOrder::LastCompletedWins => true,
            CompletionOrder::DiscardStale => {
                self.last_observed.as_deref() == Some(ticket.reference.as_str())
            }
        }
    }

    /// Stop for good; returns false if already stopped
    pub fn stop(&mut self) -> bool {
        if self.state == WatcherState::Stopped {
            return false;
        }
        self.state = WatcherState::Stopped;
        self.in_flight = 0;
        true
    }

    fn settle(&mut self) {
        self.state = if self.in_flight > 0 {
            WatcherState::Computing
        } else {
            WatcherState::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(observation: Observation) -> ProbeTicket {
        match observation {
            Observation::Probe(ticket) => ticket,
            other => panic!("expected a probe, got {:?}", other),
        }
    }

    #[test]
    fn test_initial_value_is_not_probed() {
        let mut watcher = ChangeWatcher::new(Some("a.png"), CompletionOrder::default());
        assert_eq!(watcher.observe(Some("a.png")), Observation::Unchanged);
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn test_change_issues_probe() {
        let mut watcher = ChangeWatcher::new(None, CompletionOrder::default());
        let t = ticket(watcher.observe(Some("a.png")));
        assert_eq!(t.reference.as_str(), "a.png");
        assert_eq!(watcher.state(), WatcherState::Computing);
        assert_eq!(watcher.observe(Some("a.png")), Observation::Unchanged);

        assert!(watcher.complete(&t));
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn test_empty_value_clears_without_probe() {
        let mut watcher = ChangeWatcher::new(Some("a.png"), CompletionOrder::default());
        assert_eq!(watcher.observe(Some("")), Observation::Cleared);
        assert_eq!(watcher.state(), WatcherState::Idle);
        assert_eq!(watcher.last_observed(), Some(""));
        assert_eq!(watcher.observe(None), Observation::Cleared);
    }

    #[test]
    fn test_discard_stale_drops_superseded_result() {
        let mut watcher = ChangeWatcher::new(None, CompletionOrder::DiscardStale);
        let first = ticket(watcher.observe(Some("a.png")));
        let second = ticket(watcher.observe(Some("b.png")));
        assert_eq!(watcher.in_flight(), 2);

        assert!(watcher.complete(&second));
        assert_eq!(watcher.state(), WatcherState::Computing);
        assert!(!watcher.complete(&first));
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn test_last_completed_wins_applies_everything() {
        let mut watcher = ChangeWatcher::new(None, CompletionOrder::LastCompletedWins);
        let first = ticket(watcher.observe(Some("a.png")));
        let second = ticket(watcher.observe(Some("b.png")));
        assert!(watcher.complete(&second));
        assert!(watcher.complete(&first));
    }

    #[test]
    fn test_rebase_takes_value_as_seen() {
        let mut watcher = ChangeWatcher::new(Some(""), CompletionOrder::default());
        watcher.rebase(Some("restored.png"));
        assert_eq!(watcher.observe(Some("restored.png")), Observation::Unchanged);
        assert_eq!(watcher.state(), WatcherState::Idle);

        let t = ticket(watcher.observe(Some("next.png")));
        assert_eq!(t.reference.as_str(), "next.png");
    }

    #[test]
    fn test_rebase_after_stop_is_ignored() {
        let mut watcher = ChangeWatcher::new(Some("a.png"), CompletionOrder::default());
        watcher.stop();
        watcher.rebase(Some("b.png"));
        assert_eq!(watcher.last_observed(), Some("a.png"));
    }

    #[test]
    fn test_stopped_is_absorbing() {
        let mut watcher = ChangeWatcher::new(None, CompletionOrder::default());
        let t = ticket(watcher.observe(Some("a.png")));
        assert!(watcher.stop());
        assert!(!watcher.stop());
        assert!(!watcher.complete(&t));
        assert_eq!(watcher.observe(Some("b.png")), Observation::Stopped);
        assert_eq!(watcher.state(), WatcherState::Stopped);
    }
}
