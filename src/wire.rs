//! Wire records exchanged over the transport.
//!
//! The transport carries opaque payloads; these records define what the bridge
//! puts in them. Image payloads travel with their full pixel data, snapshot
//! records are metadata-only announcements.

use std::time::{SystemTime, UNIX_EPOCH};

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

use crate::error::BridgeError;

/// One frame pushed out of (or pulled into) a pipeline
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct ImageMessage {
    /// Send time, microseconds since the epoch
    pub utime: i64,
    pub width: u32,
    pub height: u32,
    /// Raw pixel format tag; mapping happens on the receiving side
    pub pixelformat: u32,
    pub strides: Vec<u32>,
    pub data: Vec<u8>,
}

/// Snap command from the control channel
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct SnapMessage {
    pub utime: i64,
    /// Changes once per logical snap request; duplicate deliveries repeat it
    pub debounce: i64,
}

/// Metadata record announcing the most recent frame a snapshot sink saw
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct SnapshotMessage {
    /// Publish time, refreshed on every (re)announcement
    pub utime: i64,
    /// Capture time of the underlying frame
    pub pic_utime: i64,
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub strides: Vec<u32>,
    pub data_size: u64,
}

macro_rules! wire_codec {
    ($ty:ty) => {
        impl $ty {
            pub fn encode(&self) -> Result<Vec<u8>, BridgeError> {
                rkyv::to_bytes::<_, 1024>(self)
                    .map(|buf| buf.to_vec())
                    .map_err(|e| BridgeError::Encode(format!("{e:?}")))
            }

            pub fn decode(payload: &[u8]) -> Result<Self, BridgeError> {
                // Re-align: the transport hands out arbitrary byte slices
                let mut aligned = rkyv::AlignedVec::with_capacity(payload.len());
                aligned.extend_from_slice(payload);
                rkyv::from_bytes::<Self>(&aligned)
                    .map_err(|e| BridgeError::Decode(format!("{e:?}")))
            }
        }
    };
}

wire_codec!(ImageMessage);
wire_codec!(SnapMessage);
wire_codec!(SnapshotMessage);

/// Microseconds since the epoch
pub fn utime() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_message_round_trip() {
        let msg = ImageMessage {
            utime: utime(),
            width: 640,
            height: 480,
            pixelformat: crate::frame::PixelFormat::Rgb.tag(),
            strides: vec![640 * 3],
            data: vec![0xab; 64],
        };
        let payload = msg.encode().unwrap();
        assert_eq!(ImageMessage::decode(&payload).unwrap(), msg);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(SnapMessage::decode(&[0x01, 0x02, 0x03]).is_err());
    }
}
