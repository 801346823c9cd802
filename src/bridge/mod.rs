//! Concurrency bridge between the transport's dispatch thread and the
//! pipeline's deadline-bound pull/push threads.

pub mod gate;
pub mod queue;
pub mod republish;
pub mod slot;

pub use gate::EdgeGate;
pub use queue::BoundedFrameQueue;
pub use republish::PeriodicRepublisher;
pub use slot::SharedSlot;

use std::time::Duration;

/// Handoff point between an asynchronous producer and a synchronous consumer.
///
/// `deposit` runs on the transport's dispatch thread and must not block beyond
/// lock acquisition; `take_wait` blocks the pipeline thread up to `deadline`.
pub trait FrameStore<T>: Send + Sync {
    fn deposit(&self, value: T);
    fn take_wait(&self, deadline: Duration) -> Option<T>;
}

impl<T: Send> FrameStore<T> for SharedSlot<T> {
    fn deposit(&self, value: T) {
        self.put(value);
    }

    fn take_wait(&self, deadline: Duration) -> Option<T> {
        SharedSlot::take_wait(self, deadline)
    }
}

impl<T: Send> FrameStore<T> for BoundedFrameQueue<T> {
    fn deposit(&self, value: T) {
        self.push(value);
    }

    fn take_wait(&self, deadline: Duration) -> Option<T> {
        self.pop_wait(deadline)
    }
}
