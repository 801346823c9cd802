//! Edge-triggered admission latch driven by a debounce counter

use std::sync::Mutex;

#[derive(Debug, Default)]
struct DebounceState {
    last_counter: Option<i64>,
    latch: bool,
}

/// Tracks the control channel's debounce counter and holds a single pending
/// admission. Edges that arrive before the data thread consumes one coalesce;
/// duplicate deliveries of the same counter value do not re-arm the latch.
pub struct EdgeGate {
    state: Mutex<DebounceState>,
}

impl EdgeGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DebounceState::default()),
        }
    }

    /// Control-channel side, any thread. Arms the latch only when `counter`
    /// differs from the last observed value.
    pub fn observe(&self, counter: i64) {
        let mut state = self.state.lock().unwrap();
        if state.last_counter != Some(counter) {
            state.last_counter = Some(counter);
            state.latch = true;
        }
    }

    /// Data-thread side, called once per unit offered. Returns whether an
    /// edge is pending and clears it; two calls never both report `true` for
    /// a single observed edge.
    pub fn consume(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        std::mem::take(&mut state.latch)
    }
}

impl Default for EdgeGate {
    fn default() -> Self {
        Self::new()
    }
}
