use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::BridgeError;

/// Frame data with zero-copy semantics
#[derive(Debug, Clone)]
pub struct Frame {
    /// Immutable frame data - can be shared across threads without copying
    pub data: Bytes,

    /// Frame metadata
    pub meta: Arc<FrameMetadata>,

    /// Receive timestamp for latency tracking
    pub timestamp: Instant,
}

/// Frame metadata
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    /// One stride per image plane
    pub strides: Vec<u32>,
    pub format: PixelFormat,
    pub device_timestamp: Option<Duration>, // Sender timestamp if available
}

/// Pixel formats carried over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Uyvy,
    Yuy2,
    Iyu1,
    Iyu2,
    I420,
    Nv12,
    Gray8,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Gray16Be,
    Gray16Le,
    Rgb16,
    Mjpeg,
    /// Wire tag with no known mapping; rejected at format establishment
    Unknown(u32),
}

const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*tag)
}

impl PixelFormat {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            t if t == fourcc(b"UYVY") => Self::Uyvy,
            t if t == fourcc(b"YUYV") => Self::Yuy2,
            t if t == fourcc(b"IYU1") => Self::Iyu1,
            t if t == fourcc(b"IYU2") => Self::Iyu2,
            t if t == fourcc(b"I420") => Self::I420,
            t if t == fourcc(b"NV12") => Self::Nv12,
            t if t == fourcc(b"GREY") => Self::Gray8,
            t if t == fourcc(b"RGB3") => Self::Rgb,
            t if t == fourcc(b"BGR3") => Self::Bgr,
            t if t == fourcc(b"RGBA") => Self::Rgba,
            t if t == fourcc(b"BGRA") => Self::Bgra,
            t if t == fourcc(b"GB16") => Self::Gray16Be,
            t if t == fourcc(b"GL16") => Self::Gray16Le,
            t if t == fourcc(b"RG16") => Self::Rgb16,
            t if t == fourcc(b"MJPG") => Self::Mjpeg,
            t => Self::Unknown(t),
        }
    }

    pub fn tag(&self) -> u32 {
        match self {
            Self::Uyvy => fourcc(b"UYVY"),
            Self::Yuy2 => fourcc(b"YUYV"),
            Self::Iyu1 => fourcc(b"IYU1"),
            Self::Iyu2 => fourcc(b"IYU2"),
            Self::I420 => fourcc(b"I420"),
            Self::Nv12 => fourcc(b"NV12"),
            Self::Gray8 => fourcc(b"GREY"),
            Self::Rgb => fourcc(b"RGB3"),
            Self::Bgr => fourcc(b"BGR3"),
            Self::Rgba => fourcc(b"RGBA"),
            Self::Bgra => fourcc(b"BGRA"),
            Self::Gray16Be => fourcc(b"GB16"),
            Self::Gray16Le => fourcc(b"GL16"),
            Self::Rgb16 => fourcc(b"RG16"),
            Self::Mjpeg => fourcc(b"MJPG"),
            Self::Unknown(t) => *t,
        }
    }
}

/// Stream format fixed from the first frame of a pull session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCaps {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub strides: Vec<u32>,
}

impl FrameCaps {
    /// Derive caps from frame metadata. An unmapped wire tag is a hard error;
    /// the session does not guess a fallback format.
    pub fn from_meta(meta: &FrameMetadata) -> Result<Self, BridgeError> {
        if let PixelFormat::Unknown(tag) = meta.format {
            return Err(BridgeError::UnsupportedFormat(tag));
        }
        Ok(Self {
            width: meta.width,
            height: meta.height,
            format: meta.format,
            strides: meta.strides.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_mapping_is_symmetric() {
        for format in [
            PixelFormat::I420,
            PixelFormat::Rgb,
            PixelFormat::Bgra,
            PixelFormat::Mjpeg,
        ] {
            assert_eq!(PixelFormat::from_tag(format.tag()), format);
        }
    }

    #[test]
    fn unmapped_tag_survives_as_unknown() {
        let tag = fourcc(b"ZZZZ");
        assert_eq!(PixelFormat::from_tag(tag), PixelFormat::Unknown(tag));
    }

    #[test]
    fn caps_reject_unknown_format() {
        let meta = FrameMetadata {
            sequence: 1,
            width: 640,
            height: 480,
            strides: vec![640 * 3],
            format: PixelFormat::Unknown(42),
            device_timestamp: None,
        };
        assert!(matches!(
            FrameCaps::from_meta(&meta),
            Err(BridgeError::UnsupportedFormat(42))
        ));
    }
}
