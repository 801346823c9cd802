//! Bounded FIFO for in-flight frames between callback and pull threads

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crossbeam::utils::CachePadded;

/// Mutex-guarded FIFO with a hard depth bound and drop-oldest eviction.
///
/// An uncontrolled producer cannot grow memory without limit: once the queue
/// is full, the oldest pending item is evicted and counted as dropped.
pub struct BoundedFrameQueue<T> {
    items: Mutex<VecDeque<T>>,
    signal: Condvar,
    max_depth: usize,

    /// Statistics
    stats: CachePadded<Stats>,
}

#[derive(Default)]
struct Stats {
    pushed: AtomicUsize,
    popped: AtomicUsize,
    dropped: AtomicUsize,
}

impl<T> BoundedFrameQueue<T> {
    pub fn new(max_depth: usize) -> Self {
        assert!(max_depth > 0, "queue depth must be at least 1");
        Self {
            items: Mutex::new(VecDeque::with_capacity(max_depth)),
            signal: Condvar::new(),
            max_depth,
            stats: CachePadded::new(Stats::default()),
        }
    }

    /// Producer: append to the tail and wake one waiter. Evicts the oldest
    /// item first when the queue is at its depth bound.
    pub fn push(&self, value: T) {
        let mut items = self.items.lock().unwrap();
        if items.len() == self.max_depth {
            items.pop_front();
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("hermes_queue_dropped_frames").increment(1);
        }
        items.push_back(value);
        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.signal.notify_one();
    }

    /// Consumer: remove from the head, waiting up to `deadline` for an item.
    pub fn pop_wait(&self, deadline: Duration) -> Option<T> {
        let items = self.items.lock().unwrap();
        let (mut items, _) = self
            .signal
            .wait_timeout_while(items, deadline, |items| items.is_empty())
            .unwrap();
        let value = items.pop_front();
        if value.is_some() {
            self.stats.popped.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    /// (pushed, popped, dropped)
    pub fn stats(&self) -> (usize, usize, usize) {
        (
            self.stats.pushed.load(Ordering::Relaxed),
            self.stats.popped.load(Ordering::Relaxed),
            self.stats.dropped.load(Ordering::Relaxed),
        )
    }
}
