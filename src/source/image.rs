//! Transport-fed frame source

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::bridge::FrameStore;
use crate::error::BridgeError;
use crate::frame::{Frame, FrameMetadata, PixelFormat};
use crate::source::adapter::{FillResult, PullAdapter};
use crate::transport::TransportHandle;
use crate::wire::ImageMessage;

/// Subscribes to a data channel and serves synchronous pull requests from
/// the frames the transport's dispatch thread deposits.
///
/// The handler side decodes each wire image into a `Frame` and hands it to
/// the store; undecodable payloads are dropped with a warning rather than
/// poisoning the stream. The pull side is a `PullAdapter` over the same
/// store.
pub struct ImageSource {
    adapter: PullAdapter,
}

impl ImageSource {
    pub fn new(
        transport: &TransportHandle,
        channel: &str,
        store: Arc<dyn FrameStore<Frame>>,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let deposit_store = Arc::clone(&store);
        let sequence = AtomicU64::new(0);

        transport.subscribe(
            channel,
            Box::new(move |payload| {
                let msg = match ImageMessage::decode(payload) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("dropping undecodable image message: {e}");
                        return;
                    }
                };
                debug!(
                    width = msg.width,
                    height = msg.height,
                    size = msg.data.len(),
                    "image received"
                );
                let frame = frame_from_message(msg, sequence.fetch_add(1, Ordering::Relaxed) + 1);
                metrics::counter!("hermes_frames_received").increment(1);
                deposit_store.deposit(frame);
            }),
        )?;

        Ok(Self {
            adapter: PullAdapter::new(store, timeout),
        })
    }

    /// Wait up to the configured timeout for the next frame.
    pub fn fill(&mut self) -> Result<FillResult, BridgeError> {
        self.adapter.fill()
    }

    pub fn adapter_mut(&mut self) -> &mut PullAdapter {
        &mut self.adapter
    }
}

fn frame_from_message(msg: ImageMessage, sequence: u64) -> Frame {
    Frame {
        data: Bytes::from(msg.data),
        meta: Arc::new(FrameMetadata {
            sequence,
            width: msg.width,
            height: msg.height,
            strides: msg.strides,
            format: PixelFormat::from_tag(msg.pixelformat),
            device_timestamp: (msg.utime > 0).then(|| Duration::from_micros(msg.utime as u64)),
        }),
        timestamp: Instant::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::SharedSlot;
    use crate::transport::{LoopbackTransport, TransportHandle};

    #[test]
    fn subscribe_fails_without_transport() {
        let handle = TransportHandle::new();
        let store: Arc<SharedSlot<Frame>> = Arc::new(SharedSlot::new());
        assert!(matches!(
            ImageSource::new(&handle, "DATA", store, Duration::from_millis(10)),
            Err(BridgeError::TransportUnavailable)
        ));
    }

    #[test]
    fn malformed_payload_is_dropped_not_delivered() {
        let handle = TransportHandle::new();
        handle.replace(Box::new(LoopbackTransport::new()));

        let store: Arc<SharedSlot<Frame>> = Arc::new(SharedSlot::new());
        let mut source = ImageSource::new(
            &handle,
            "DATA",
            store.clone(),
            Duration::from_millis(150),
        )
        .unwrap();

        handle.publish("DATA", &[0xff, 0x00, 0x13]).unwrap();
        assert!(matches!(
            source.fill(),
            Err(BridgeError::NoDataBeforeFormatKnown)
        ));
    }
}
