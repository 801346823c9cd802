//! Snapshot record sink with periodic re-announcement

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::bridge::{PeriodicRepublisher, SharedSlot};
use crate::error::BridgeError;
use crate::frame::Frame;
use crate::transport::TransportHandle;
use crate::wire::{self, SnapshotMessage};

/// Publishes a metadata record for every frame it sees and keeps re-announcing
/// the most recent one on a fixed period, so late subscribers learn about the
/// last frame without waiting for a new one.
pub struct SnapshotSink {
    transport: Arc<TransportHandle>,
    channel: String,
    latest: Arc<SharedSlot<SnapshotMessage>>,
    republisher: PeriodicRepublisher,
}

impl SnapshotSink {
    pub fn new(transport: Arc<TransportHandle>, channel: impl Into<String>, period: Duration) -> Self {
        let channel = channel.into();
        let latest = Arc::new(SharedSlot::new());

        let pub_transport = Arc::clone(&transport);
        let pub_channel = channel.clone();
        let republisher = PeriodicRepublisher::spawn(
            Arc::clone(&latest),
            period,
            move |mut record: SnapshotMessage| {
                // Each announcement carries a fresh publish time
                record.utime = wire::utime();
                let payload = record.encode()?;
                pub_transport.publish(&pub_channel, &payload)
            },
        );

        Self {
            transport,
            channel,
            latest,
            republisher,
        }
    }

    /// Publish a record for this frame immediately and make it the record the
    /// background thread re-announces.
    pub fn render(&self, frame: &Frame) -> Result<(), BridgeError> {
        let record = SnapshotMessage {
            utime: wire::utime(),
            pic_utime: frame
                .meta
                .device_timestamp
                .map(|d| d.as_micros() as i64)
                .unwrap_or(0),
            width: frame.meta.width,
            height: frame.meta.height,
            pixelformat: frame.meta.format.tag(),
            strides: frame.meta.strides.clone(),
            data_size: frame.data.len() as u64,
        };

        let payload = record.encode()?;
        if let Err(e) = self.transport.publish(&self.channel, &payload) {
            warn!(channel = %self.channel, "snapshot publish failed: {e}");
        }
        self.latest.put(record);
        Ok(())
    }

    /// Stop the republish thread. Also happens on drop.
    pub fn stop(&mut self) {
        self.republisher.stop();
    }
}
