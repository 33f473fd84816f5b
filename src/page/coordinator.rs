//! MutationCoordinator: debounced rescans without feedback loops
//!
//! ```text
//!   Detached --suspend--> SuspendedRescanning --resume--> Observing
//!                               ^                            |
//!                               +------- debounce fires -----+
//! ```
//!
//! The observer is disconnected for the whole rescan and reconnected only
//! after the last batch has been applied, so our own link insertions never
//! schedule another rescan.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::page::host::{Host, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorState {
    Detached,
    Observing { debounce: Option<TimerId> },
    SuspendedRescanning,
}

#[derive(Debug)]
pub struct MutationCoordinator {
    state: CoordinatorState,
    debounce_ms: u32,
}

impl MutationCoordinator {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            state: CoordinatorState::Detached,
            debounce_ms,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn is_observing(&self) -> bool {
        matches!(self.state, CoordinatorState::Observing { .. })
    }

    /// Mutation notification. Restarts the debounce timer while observing;
    /// ignored otherwise. Returns whether it was accepted.
    pub fn on_mutations<H: Host>(&mut self, host: &mut H) -> bool {
        let CoordinatorState::Observing { debounce } = self.state else {
            return false;
        };
        if let Some(pending) = debounce {
            host.clear_timeout(pending);
        }
        self.state = CoordinatorState::Observing {
            debounce: Some(host.set_timeout(self.debounce_ms)),
        };
        true
    }

    /// Timer notification. Returns `true` when `id` was the debounce timer,
    /// in which case the observer is now disconnected and a rescan is due.
    pub fn on_timer<H: Host>(&mut self, host: &mut H, id: TimerId) -> bool {
        match self.state {
            CoordinatorState::Observing { debounce: Some(pending) } if pending == id => {
                debug!("[MutationCoordinator] debounce elapsed, suspending observer");
                self.suspend(host);
                true
            }
            _ => false,
        }
    }

    /// Stop observing for the duration of a rescan
    pub fn suspend<H: Host>(&mut self, host: &mut H) {
        match self.state {
            CoordinatorState::Observing { debounce } => {
                if let Some(pending) = debounce {
                    host.clear_timeout(pending);
                }
                host.disconnect();
            }
            CoordinatorState::Detached | CoordinatorState::SuspendedRescanning => {}
        }
        self.state = CoordinatorState::SuspendedRescanning;
    }

    /// Rescan finished: reconnect with the same options
    pub fn resume<H: Host>(&mut self, host: &mut H) {
        if self.state == CoordinatorState::SuspendedRescanning {
            host.observe();
            self.state = CoordinatorState::Observing { debounce: None };
        }
    }

    pub fn detach<H: Host>(&mut self, host: &mut H) {
        if let CoordinatorState::Observing { debounce } = self.state {
            if let Some(pending) = debounce {
                host.clear_timeout(pending);
            }
            host.disconnect();
        }
        self.state = CoordinatorState::Detached;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHost {
        next: u32,
        cleared: Vec<TimerId>,
        observing: bool,
        connects: usize,
    }

    impl Host for CountingHost {
        fn set_timeout(&mut self, _delay_ms: u32) -> TimerId {
            self.next += 1;
            TimerId(self.next)
        }
        fn clear_timeout(&mut self, id: TimerId) {
            self.cleared.push(id);
        }
        fn request_frame(&mut self) {}
        fn observe(&mut self) {
            self.observing = true;
            self.connects += 1;
        }
        fn disconnect(&mut self) {
            self.observing = false;
        }
    }

    fn observing() -> (CountingHost, MutationCoordinator) {
        let mut host = CountingHost::default();
        let mut coordinator = MutationCoordinator::new(200);
        coordinator.suspend(&mut host);
        coordinator.resume(&mut host);
        (host, coordinator)
    }

    // -------------------------------------------------------------------------
    // Requirement 1: Mutations restart the debounce timer
    // -------------------------------------------------------------------------
    #[test]
    fn test_mutations_restart_debounce() {
        let (mut host, mut coordinator) = observing();

        assert!(coordinator.on_mutations(&mut host));
        assert!(coordinator.on_mutations(&mut host));
        assert_eq!(host.cleared, vec![TimerId(1)]);
        assert_eq!(
            coordinator.state(),
            CoordinatorState::Observing { debounce: Some(TimerId(2)) }
        );

        assert!(!coordinator.on_timer(&mut host, TimerId(1)), "stale timer");
        assert!(coordinator.on_timer(&mut host, TimerId(2)));
        assert_eq!(coordinator.state(), CoordinatorState::SuspendedRescanning);
        assert!(!host.observing);
    }

    // -------------------------------------------------------------------------
    // Requirement 2: Suspended coordinator ignores mutations until resumed
    // -------------------------------------------------------------------------
    #[test]
    fn test_suspended_ignores_mutations() {
        let (mut host, mut coordinator) = observing();
        coordinator.suspend(&mut host);

        assert!(!coordinator.on_mutations(&mut host));
        assert_eq!(host.next, 0);

        coordinator.resume(&mut host);
        assert!(coordinator.is_observing());
        assert_eq!(host.connects, 2);
    }

    #[test]
    fn test_detach_clears_pending_timer() {
        let (mut host, mut coordinator) = observing();
        coordinator.on_mutations(&mut host);
        coordinator.detach(&mut host);

        assert_eq!(host.cleared, vec![TimerId(1)]);
        assert_eq!(coordinator.state(), CoordinatorState::Detached);
        assert!(!coordinator.on_mutations(&mut host));

        coordinator.resume(&mut host);
        assert!(!host.observing, "resume only applies after suspend");
    }
}
