//! Single-item shared holder with wait-for-value semantics

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Mutex-guarded slot holding zero or one value.
///
/// Writers overwrite unconditionally (last-write-wins) and never wait for a
/// consumer. Readers either take the value out or wait for one with a hard
/// deadline; there is no infinite wait.
pub struct SharedSlot<T> {
    value: Mutex<Option<T>>,
    signal: Condvar,
}

impl<T> SharedSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            signal: Condvar::new(),
        }
    }

    /// Replace any held value and wake one waiter.
    pub fn put(&self, value: T) {
        let mut slot = self.value.lock().unwrap();
        *slot = Some(value);
        self.signal.notify_one();
    }

    /// Remove and return the held value, waiting up to `deadline` for one to
    /// arrive. Returns `None` only after the deadline elapses on an empty
    /// slot; the wait releases the lock atomically, so a value deposited
    /// between the emptiness check and the wait is never missed.
    pub fn take_wait(&self, deadline: Duration) -> Option<T> {
        let slot = self.value.lock().unwrap();
        let (mut slot, _) = self
            .signal
            .wait_timeout_while(slot, deadline, |value| value.is_none())
            .unwrap();
        slot.take()
    }

    /// Remove and return the held value without waiting.
    pub fn take(&self) -> Option<T> {
        self.value.lock().unwrap().take()
    }

    pub fn is_empty(&self) -> bool {
        self.value.lock().unwrap().is_none()
    }
}

impl<T: Clone> SharedSlot<T> {
    /// Clone the held value, leaving it in place. Used by the periodic
    /// republisher, which re-announces rather than consumes.
    pub fn peek(&self) -> Option<T> {
        self.value.lock().unwrap().clone()
    }
}

impl<T> Default for SharedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
