use thiserror::Error;

/// Errors surfaced across the bridge boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Timeout elapsed before any frame ever arrived; no format could be
    /// derived, so the pull session cannot proceed.
    #[error("no frame received before the timeout; stream format never established")]
    NoDataBeforeFormatKnown,

    #[error("pixel format tag {0:#010x} has no known mapping")]
    UnsupportedFormat(u32),

    #[error("transport unavailable")]
    TransportUnavailable,

    #[error("failed to encode wire message: {0}")]
    Encode(String),

    #[error("failed to decode wire message: {0}")]
    Decode(String),

    #[error("publish failed: {0}")]
    Publish(String),
}
