// ── Reactive frame stream ──
//
// Subscription type for consuming display frames from the monitor.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::DisplayFrame;

/// A subscription to the monitor's display frames.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via `changed()` or by converting to a `Stream`. Frames
/// are deduplicated at the source: a subscriber only wakes when the
/// decision actually differs from the last one it could observe.
pub struct FrameStream {
    current: DisplayFrame,
    receiver: watch::Receiver<DisplayFrame>,
}

impl FrameStream {
    pub(crate) fn new(receiver: watch::Receiver<DisplayFrame>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The frame captured at creation time (or by the last `changed()`).
    pub fn current(&self) -> &DisplayFrame {
        &self.current
    }

    /// The latest frame (may have changed since creation).
    pub fn latest(&self) -> DisplayFrame {
        self.receiver.borrow().clone()
    }

    /// Wait for the next frame, returning it.
    /// Returns `None` once the monitor has shut down.
    pub async fn changed(&mut self) -> Option<DisplayFrame> {
        self.receiver.changed().await.ok()?;
        let frame = self.receiver.borrow_and_update().clone();
        self.current = frame.clone();
        Some(frame)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> FrameWatchStream {
        FrameWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current frame immediately, then a new frame each time the
/// monitor's decision changes.
pub struct FrameWatchStream {
    inner: WatchStream<DisplayFrame>,
}

impl Stream for FrameWatchStream {
    type Item = DisplayFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
