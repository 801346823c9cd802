//! Pull-over-push adapter: synchronous fill over an asynchronously fed store

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::bridge::FrameStore;
use crate::error::BridgeError;
use crate::frame::{Frame, FrameCaps};

/// Outcome of a single fill request
#[derive(Debug)]
pub enum FillResult {
    /// One frame, ownership transferred to the caller
    Data(Frame),
    /// Timed out after the format was established; clean end of stream
    EndOfStream,
}

type CapsCallback = Box<dyn FnMut(&FrameCaps) + Send>;

/// Drives deadline-bound fill requests against a frame store.
///
/// The first delivered frame fixes the session format and fires the
/// format-established callback; the asymmetry on timeout is deliberate. A
/// consumer that has never seen a frame cannot guess a format, so silence is
/// an error; once a format is locked, silence is ordinary upstream quiescence
/// and ends the stream cleanly.
pub struct PullAdapter {
    store: Arc<dyn FrameStore<Frame>>,
    timeout: Duration,
    caps: Option<FrameCaps>,
    on_caps: Option<CapsCallback>,
}

impl PullAdapter {
    pub fn new(store: Arc<dyn FrameStore<Frame>>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            caps: None,
            on_caps: None,
        }
    }

    /// Register the format-established callback. Fires at most once per
    /// session, before the first `Data` result is returned.
    pub fn on_caps_established(&mut self, callback: impl FnMut(&FrameCaps) + Send + 'static) {
        self.on_caps = Some(Box::new(callback));
    }

    pub fn caps(&self) -> Option<&FrameCaps> {
        self.caps.as_ref()
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Wait up to the configured timeout for one frame.
    pub fn fill(&mut self) -> Result<FillResult, BridgeError> {
        let Some(frame) = self.store.take_wait(self.timeout) else {
            return match self.caps {
                None => Err(BridgeError::NoDataBeforeFormatKnown),
                Some(_) => Ok(FillResult::EndOfStream),
            };
        };

        if self.caps.is_none() {
            let caps = FrameCaps::from_meta(&frame.meta)?;
            info!(
                width = caps.width,
                height = caps.height,
                format = ?caps.format,
                "stream format established"
            );
            if let Some(callback) = self.on_caps.as_mut() {
                callback(&caps);
            }
            self.caps = Some(caps);
        }

        metrics::counter!("hermes_frames_filled").increment(1);
        Ok(FillResult::Data(frame))
    }

    /// Forget the established format; the next fill re-derives it and fires
    /// the callback again.
    pub fn reset(&mut self) {
        self.caps = None;
    }
}
