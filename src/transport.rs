//! Transport boundary: the trait the bridge publishes and subscribes through,
//! a swappable handle for it, and an in-process loopback implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use tracing::debug;

use crate::error::BridgeError;

/// Subscription callback; runs on the transport's dispatch thread and must
/// not block beyond lock acquisition.
pub type Handler = Box<dyn Fn(&[u8]) + Send + Sync>;

/// Message transport as seen by the bridge: fire-and-forget publish to a
/// named channel, plus channel subscription.
pub trait Transport: Send + Sync {
    fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BridgeError>;
    fn subscribe(&self, channel: &str, handler: Handler);
}

/// Swappable reference to the current transport.
///
/// The transport is owned outside the bridge and may be torn down and
/// recreated between calls (URL changes do exactly that in practice), so the
/// bridge never assumes the handle is stable. An empty handle degrades
/// publishes to `TransportUnavailable` and leaves consumers to their timeout
/// semantics.
#[derive(Default)]
pub struct TransportHandle {
    inner: ArcSwapOption<Box<dyn Transport>>,
}

impl TransportHandle {
    pub fn new() -> Self {
        Self {
            inner: ArcSwapOption::empty(),
        }
    }

    /// Install a new transport, dropping any previous one.
    pub fn replace(&self, transport: Box<dyn Transport>) {
        self.inner.store(Some(Arc::new(transport)));
    }

    pub fn clear(&self) {
        self.inner.store(None);
    }

    pub fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BridgeError> {
        match self.inner.load_full() {
            Some(transport) => transport.publish(channel, payload),
            None => Err(BridgeError::TransportUnavailable),
        }
    }

    pub fn subscribe(&self, channel: &str, handler: Handler) -> Result<(), BridgeError> {
        match self.inner.load_full() {
            Some(transport) => {
                transport.subscribe(channel, handler);
                Ok(())
            }
            None => Err(BridgeError::TransportUnavailable),
        }
    }
}

type Subscribers = Arc<Mutex<HashMap<String, Vec<Handler>>>>;

/// In-process transport with its own dispatch thread.
///
/// Delivery crosses a real thread boundary with the same call shape as a
/// networked transport: publish enqueues, a dedicated thread invokes the
/// subscribed handlers. Used by the demo binary and the integration tests.
pub struct LoopbackTransport {
    tx: flume::Sender<(String, Bytes)>,
    subscribers: Subscribers,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded::<(String, Bytes)>();
        let subscribers: Subscribers = Arc::default();
        let dispatch_subs = Arc::clone(&subscribers);

        // Exits when the last sender is dropped
        thread::spawn(move || {
            for (channel, payload) in rx.iter() {
                let subs = dispatch_subs.lock().unwrap();
                if let Some(handlers) = subs.get(&channel) {
                    for handler in handlers {
                        handler(&payload);
                    }
                }
            }
            debug!("loopback dispatch thread exiting");
        });

        Self { tx, subscribers }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackTransport {
    fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BridgeError> {
        self.tx
            .send((channel.to_owned(), Bytes::copy_from_slice(payload)))
            .map_err(|_| BridgeError::TransportUnavailable)
    }

    fn subscribe(&self, channel: &str, handler: Handler) {
        self.subscribers
            .lock()
            .unwrap()
            .entry(channel.to_owned())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::bridge::SharedSlot;

    #[test]
    fn empty_handle_reports_unavailable() {
        let handle = TransportHandle::new();
        assert!(matches!(
            handle.publish("CHANNEL", b"payload"),
            Err(BridgeError::TransportUnavailable)
        ));
    }

    #[test]
    fn replacing_the_transport_revives_the_handle() {
        let handle = TransportHandle::new();
        assert!(handle.publish("CHANNEL", b"x").is_err());

        handle.replace(Box::new(LoopbackTransport::new()));
        assert!(handle.publish("CHANNEL", b"x").is_ok());

        handle.clear();
        assert!(handle.publish("CHANNEL", b"x").is_err());
    }

    #[test]
    fn loopback_delivers_to_subscribers_cross_thread() {
        let transport = LoopbackTransport::new();
        let received: Arc<SharedSlot<Vec<u8>>> = Arc::new(SharedSlot::new());
        let deposit = Arc::clone(&received);

        transport.subscribe(
            "DATA",
            Box::new(move |payload| deposit.put(payload.to_vec())),
        );
        transport.publish("DATA", b"hello").unwrap();

        assert_eq!(
            received.take_wait(Duration::from_secs(5)),
            Some(b"hello".to_vec())
        );
    }

    #[test]
    fn unsubscribed_channel_is_ignored() {
        let transport = LoopbackTransport::new();
        // No subscribers; publish must not error or block
        transport.publish("NOWHERE", b"x").unwrap();
    }
}
