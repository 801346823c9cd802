//! Publishes pipeline frames to a transport data channel

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::BridgeError;
use crate::frame::{Frame, FrameCaps};
use crate::transport::TransportHandle;
use crate::wire::{self, ImageMessage};

/// Per-frame publisher. The first frame fixes the session format; every
/// frame is serialized and published as-is.
pub struct ImageSink {
    transport: Arc<TransportHandle>,
    channel: String,
    caps: Option<FrameCaps>,
}

impl ImageSink {
    pub fn new(transport: Arc<TransportHandle>, channel: impl Into<String>) -> Self {
        Self {
            transport,
            channel: channel.into(),
            caps: None,
        }
    }

    pub fn caps(&self) -> Option<&FrameCaps> {
        self.caps.as_ref()
    }

    /// Publish one frame. A missing transport drops the frame with a warning
    /// instead of failing the pipeline; it may come back on the next call.
    pub fn render(&mut self, frame: &Frame) -> Result<(), BridgeError> {
        if self.caps.is_none() {
            let caps = FrameCaps::from_meta(&frame.meta)?;
            info!(
                width = caps.width,
                height = caps.height,
                format = ?caps.format,
                channel = %self.channel,
                "sink format fixed"
            );
            self.caps = Some(caps);
        }

        let msg = ImageMessage {
            utime: wire::utime(),
            width: frame.meta.width,
            height: frame.meta.height,
            pixelformat: frame.meta.format.tag(),
            strides: frame.meta.strides.clone(),
            data: frame.data.to_vec(),
        };
        let payload = msg.encode()?;

        match self.transport.publish(&self.channel, &payload) {
            Ok(()) => {
                metrics::counter!("hermes_frames_published").increment(1);
                Ok(())
            }
            Err(BridgeError::TransportUnavailable) => {
                warn!(channel = %self.channel, "transport unavailable, frame dropped");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
