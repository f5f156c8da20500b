//! Debounce rapid-fire navigation into a single action.
//!
//! A burst of K triggers inside the delay window produces exactly one
//! execution, using the action from the *last* trigger. The debouncer holds
//! no timer thread: the interactive loop polls it each turn, so the eventual
//! execution runs on the thread that owns scheduler and display state.

use std::time::{Duration, Instant};

/// Default navigation debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Last-write-wins delayed action.
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given delay window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `action` to fire after the delay. A pending action is
    /// replaced and its timer restarted.
    pub fn trigger(&mut self, action: T) {
        self.pending = Some((action, Instant::now() + self.delay));
    }

    /// Take the pending action if its delay has elapsed.
    ///
    /// Called once per interactive-loop turn.
    pub fn poll_due(&mut self) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if Instant::now() >= *deadline => {
                self.pending.take().map(|(action, _)| action)
            }
            _ => None,
        }
    }

    /// Drop any pending action without firing it. Returns whether one was
    /// pending. Used at teardown so nothing fires after shutdown.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// When the pending action becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// True while an action is waiting for its window to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Test: Burst coalescing
    /// Validates: Ten triggers in one window fire exactly once, with the last action
    #[test]
    fn test_coalesces_to_last_action() {
        let mut debouncer: Debouncer<usize> = Debouncer::new(Duration::from_millis(10));
        for n in 1..=10 {
            debouncer.trigger(n);
        }
        assert!(debouncer.poll_due().is_none()); // window not elapsed yet

        thread::sleep(Duration::from_millis(20));
        assert_eq!(debouncer.poll_due(), Some(10));
        assert_eq!(debouncer.poll_due(), None); // fired exactly once
    }

    /// Test: Window restarts on re-trigger
    #[test]
    fn test_retrigger_restarts_window() {
        let mut debouncer: Debouncer<&str> = Debouncer::new(Duration::from_millis(40));
        debouncer.trigger("first");
        thread::sleep(Duration::from_millis(25));
        debouncer.trigger("second");
        thread::sleep(Duration::from_millis(25));
        // 50ms since "first" but only 25ms since "second"
        assert!(debouncer.poll_due().is_none());

        thread::sleep(Duration::from_millis(25));
        assert_eq!(debouncer.poll_due(), Some("second"));
    }

    /// Test: Cancel suppresses a pending action
    /// Validates: Nothing fires after teardown-style cancellation
    #[test]
    fn test_cancel_pending() {
        let mut debouncer: Debouncer<u32> = Debouncer::new(Duration::ZERO);
        debouncer.trigger(7);
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());
        assert!(debouncer.poll_due().is_none());
        assert!(!debouncer.cancel());
    }

    /// Test: Zero delay fires on the next poll
    #[test]
    fn test_zero_delay() {
        let mut debouncer: Debouncer<u32> = Debouncer::new(Duration::ZERO);
        debouncer.trigger(1);
        assert_eq!(debouncer.poll_due(), Some(1));
    }
}
