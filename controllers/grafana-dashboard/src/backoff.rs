//! # Fibonacci Backoff
//!
//! Retry delays for failed reconciliations. Delays grow along the Fibonacci
//! sequence in whole minutes, capped at a maximum:
//! 1m, 1m, 2m, 3m, 5m, 8m, 10m, 10m, ...

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

const BASE_MINUTES: u64 = 1;
const MAX_MINUTES: u64 = 10;

/// Stateful Fibonacci backoff, one per failing resource.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    base_minutes: u64,
    max_minutes: u64,
    /// (previous, current) pair of the sequence
    window: (u64, u64),
}

impl FibonacciBackoff {
    /// Sequence starting at `base_minutes`, never exceeding `max_minutes`.
    #[must_use]
    pub fn new(base_minutes: u64, max_minutes: u64) -> Self {
        Self {
            base_minutes,
            max_minutes,
            window: (0, base_minutes),
        }
    }

    /// Return the current delay and advance the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let (prev, current) = self.window;
        let upcoming = prev.saturating_add(current).min(self.max_minutes);
        self.window = (current, upcoming);
        Duration::from_secs(current.min(self.max_minutes) * 60)
    }

    /// Start over from the base delay (after a successful reconcile).
    pub fn reset(&mut self) {
        self.window = (0, self.base_minutes);
    }
}

#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(BASE_MINUTES, MAX_MINUTES),
            error_count: 0,
        }
    }
}

/// Backoff bookkeeping per resource, keyed by `namespace/name`.
#[derive(Debug, Default)]
pub struct ResourceBackoffs {
    states: Mutex<HashMap<String, BackoffState>>,
}

impl ResourceBackoffs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a failed reconcile and return (retry delay, consecutive failures).
    pub fn record_failure(&self, key: &str) -> (Duration, u32) {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states.entry(key.to_string()).or_insert_with(BackoffState::new);
                state.error_count += 1;
                (state.backoff.next_delay(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using default backoff", e);
                (Duration::from_secs(BASE_MINUTES * 60), 0)
            }
        }
    }

    /// Reset after a successful reconcile.
    pub fn record_success(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(key) {
                state.error_count = 0;
                state.backoff.reset();
            }
        }
    }

    /// Drop all state for a deleted resource.
    pub fn forget(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }

    /// Consecutive failures recorded for a resource
    pub fn error_count(&self, key: &str) -> u32 {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(key).map(|s| s.error_count))
            .unwrap_or(0)
    }
}
