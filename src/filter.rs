//! Edge-triggered admission filter driven by transport snap commands

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::EdgeGate;
use crate::error::BridgeError;
use crate::frame::Frame;
use crate::transport::TransportHandle;
use crate::wire::SnapMessage;

/// Suppresses every frame except those answering a snap command.
///
/// The control channel delivers debounce-stamped snap messages; one counter
/// change admits exactly one frame, however many duplicate or coalesced
/// deliveries arrive in between.
pub struct SnapGate {
    gate: Arc<EdgeGate>,
}

impl SnapGate {
    pub fn new(transport: &TransportHandle, channel: &str) -> Result<Self, BridgeError> {
        let gate = Arc::new(EdgeGate::new());
        let observer = Arc::clone(&gate);

        transport.subscribe(
            channel,
            Box::new(move |payload| match SnapMessage::decode(payload) {
                Ok(msg) => {
                    debug!(debounce = msg.debounce, "snap command");
                    observer.observe(msg.debounce);
                }
                Err(e) => warn!("dropping undecodable snap message: {e}"),
            }),
        )?;

        Ok(Self { gate })
    }

    /// Once per offered frame: pass it through when a snap edge is pending,
    /// suppress it otherwise.
    pub fn transform(&self, frame: Frame) -> Option<Frame> {
        if self.gate.consume() {
            Some(frame)
        } else {
            metrics::counter!("hermes_frames_suppressed").increment(1);
            None
        }
    }

    pub fn gate(&self) -> &EdgeGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::time::{Duration, Instant};

    use bytes::Bytes;

    use crate::frame::{FrameMetadata, PixelFormat};
    use crate::transport::LoopbackTransport;
    use crate::wire;

    fn test_frame() -> Frame {
        Frame {
            data: Bytes::from_static(&[0u8; 4]),
            meta: StdArc::new(FrameMetadata {
                sequence: 1,
                width: 2,
                height: 2,
                strides: vec![6],
                format: PixelFormat::Rgb,
                device_timestamp: None,
            }),
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn frames_are_suppressed_without_a_snap() {
        let handle = TransportHandle::new();
        handle.replace(Box::new(LoopbackTransport::new()));
        let gate = SnapGate::new(&handle, "SNAP").unwrap();

        assert!(gate.transform(test_frame()).is_none());
        assert!(gate.transform(test_frame()).is_none());
    }

    #[test]
    fn one_snap_admits_exactly_one_frame() {
        let handle = TransportHandle::new();
        handle.replace(Box::new(LoopbackTransport::new()));
        let gate = SnapGate::new(&handle, "SNAP").unwrap();

        let snap = SnapMessage {
            utime: wire::utime(),
            debounce: 1,
        };
        handle.publish("SNAP", &snap.encode().unwrap()).unwrap();

        // Delivery is asynchronous; wait for the edge to land
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(frame) = gate.transform(test_frame()) {
                drop(frame);
                break;
            }
            assert!(Instant::now() < deadline, "snap edge never arrived");
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(gate.transform(test_frame()).is_none());
    }
}
