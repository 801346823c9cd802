//! Fixed-period republisher decoupling publish rate from producer rate

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::bridge::SharedSlot;
use crate::error::BridgeError;

/// Re-announces the most recent record on a fixed period.
///
/// The producer updates the slot at its own pace; a fast producer's
/// intermediate values coalesce (only the latest survives to the next tick),
/// a slow producer's last value is repeated unchanged. Publication is strictly
/// time-driven; updating the slot never triggers one.
pub struct PeriodicRepublisher {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

struct Shutdown {
    running: Mutex<bool>,
    signal: Condvar,
}

impl PeriodicRepublisher {
    /// Spawn the background publish thread. `publish` receives a clone of the
    /// latest record once per period; a failed attempt is logged and the loop
    /// keeps ticking. Nothing is emitted before the first record is set.
    pub fn spawn<R, F>(slot: Arc<SharedSlot<R>>, period: Duration, mut publish: F) -> Self
    where
        R: Clone + Send + Sync + 'static,
        F: FnMut(R) -> Result<(), BridgeError> + Send + 'static,
    {
        let shutdown = Arc::new(Shutdown {
            running: Mutex::new(true),
            signal: Condvar::new(),
        });
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::spawn(move || {
            loop {
                {
                    // Timed wait doubling as the shutdown check: a stop()
                    // signal wakes it early, and the flag is re-checked after
                    // every wake so teardown never depends on a signal alone.
                    let running = thread_shutdown.running.lock().unwrap();
                    let (running, _) = thread_shutdown
                        .signal
                        .wait_timeout_while(running, period, |running| *running)
                        .unwrap();
                    if !*running {
                        break;
                    }
                }

                if let Some(record) = slot.peek() {
                    metrics::counter!("hermes_republish_ticks").increment(1);
                    if let Err(e) = publish(record) {
                        warn!("republish failed: {e}");
                    }
                }
            }
            debug!("republish thread exiting");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signal shutdown and join the publish thread. Safe to call even if the
    /// slot was never written.
    pub fn stop(&mut self) {
        *self.shutdown.running.lock().unwrap() = false;
        self.shutdown.signal.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PeriodicRepublisher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn collecting_republisher(
        slot: &Arc<SharedSlot<u32>>,
        period: Duration,
    ) -> (PeriodicRepublisher, Arc<Mutex<Vec<u32>>>) {
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&published);
        let republisher = PeriodicRepublisher::spawn(Arc::clone(slot), period, move |record| {
            sink.lock().unwrap().push(record);
            Ok(())
        });
        (republisher, published)
    }

    #[test]
    fn coalesces_updates_within_one_period() {
        let slot = Arc::new(SharedSlot::new());
        let (mut republisher, published) =
            collecting_republisher(&slot, Duration::from_millis(50));

        slot.put(1);
        slot.put(2);
        thread::sleep(Duration::from_millis(80));
        republisher.stop();

        let published = published.lock().unwrap();
        assert!(!published.is_empty());
        assert!(published.iter().all(|&v| v == 2), "only the latest update survives");
    }

    #[test]
    fn repeats_last_value_when_producer_is_silent() {
        let slot = Arc::new(SharedSlot::new());
        let (mut republisher, published) =
            collecting_republisher(&slot, Duration::from_millis(20));

        slot.put(9);
        thread::sleep(Duration::from_millis(120));
        republisher.stop();

        let published = published.lock().unwrap();
        assert!(published.len() >= 2, "same record republished across ticks");
        assert!(published.iter().all(|&v| v == 9));
    }

    #[test]
    fn emits_nothing_before_first_update() {
        let slot: Arc<SharedSlot<u32>> = Arc::new(SharedSlot::new());
        let (mut republisher, published) =
            collecting_republisher(&slot, Duration::from_millis(10));

        thread::sleep(Duration::from_millis(60));
        republisher.stop();

        assert!(published.lock().unwrap().is_empty());
    }

    #[test]
    fn stop_returns_promptly_without_any_update() {
        let slot: Arc<SharedSlot<u32>> = Arc::new(SharedSlot::new());
        let (mut republisher, _) = collecting_republisher(&slot, Duration::from_secs(60));

        let start = Instant::now();
        republisher.stop();
        assert!(start.elapsed() < Duration::from_secs(5), "teardown must not wait out the period");
    }

    #[test]
    fn failed_publish_does_not_kill_the_loop() {
        let slot = Arc::new(SharedSlot::new());
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&attempts);
        let mut republisher =
            PeriodicRepublisher::spawn(Arc::clone(&slot), Duration::from_millis(15), move |_| {
                *counter.lock().unwrap() += 1;
                Err(BridgeError::TransportUnavailable)
            });

        slot.put(1);
        thread::sleep(Duration::from_millis(100));
        republisher.stop();

        assert!(*attempts.lock().unwrap() >= 2, "loop keeps ticking after a failure");
    }
}
