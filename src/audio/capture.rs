//! Capture engine: idempotent start/stop, level statistics, frame delivery
//!
//! Wraps a [`FrameSource`] and, for every frame it produces, updates the
//! shared [`LevelMeter`] and hands the frame synchronously to the registered
//! consumer — all inside the capture callback's execution context.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::levels::{CaptureStats, LevelMeter};
use super::source::{FrameHandler, FrameSource};
use super::CaptureError;

/// One fixed-size batch of samples, borrowed for a single delivery.
///
/// The underlying buffer is reused by the engine; consumers must copy
/// anything they want to keep past the callback.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub samples: &'a [f32],
    /// Sample rate in effect when the frame was captured
    pub sample_rate: u32,
}

/// Receives frames from the engine on the capture thread.
///
/// Implementations must be cheap and non-blocking; the capture source is
/// waiting on them.
pub trait FrameConsumer: Send + Sync {
    fn on_frame(&self, frame: AudioFrame<'_>);
}

/// Capture pipeline around a [`FrameSource`]
pub struct CaptureEngine<S> {
    source: S,
    consumer: Arc<dyn FrameConsumer>,
    levels: Arc<LevelMeter>,
    capturing: bool,
}

impl<S: FrameSource> CaptureEngine<S> {
    /// Create an engine with its frame consumer. Statistics start at zero
    /// and are never reset afterwards.
    pub fn new(source: S, consumer: Arc<dyn FrameConsumer>) -> Self {
        Self {
            source,
            consumer,
            levels: Arc::new(LevelMeter::new()),
            capturing: false,
        }
    }

    /// Effective sample rate of the underlying source.
    ///
    /// Read this before opening a protocol session so the declared rate
    /// matches the audio actually sent.
    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Current amplitude statistics. Safe to poll from a UI thread while
    /// capture runs.
    pub fn stats(&self) -> CaptureStats {
        self.levels.snapshot()
    }

    /// Begin capturing.
    ///
    /// With no usable input channels this fails with
    /// [`CaptureError::NoInputDevice`] and has no side effects. Calling
    /// `start()` again while capturing is a warning-level no-op; the frame
    /// callback is never installed twice. A failure to start the underlying
    /// source is logged and swallowed — callers observe it as frames never
    /// arriving.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.source.channels() == 0 {
            log::error!("No usable audio input channels");
            return Err(CaptureError::NoInputDevice);
        }

        if self.capturing {
            log::warn!("Capture engine started twice");
            return Ok(());
        }

        let levels = Arc::clone(&self.levels);
        let consumer = Arc::clone(&self.consumer);
        let sample_rate = self.source.sample_rate();

        let handler: FrameHandler = Box::new(move |samples| {
            levels.update(samples);
            consumer.on_frame(AudioFrame {
                samples,
                sample_rate,
            });
        });

        self.capturing = true;

        if let Err(e) = self.source.start(handler) {
            log::error!("Audio source failed to start: {}", e);
        }

        Ok(())
    }

    /// Stop capturing. Calling `stop()` while not capturing is a
    /// warning-level no-op, never an error.
    pub fn stop(&mut self) {
        if !self.capturing {
            log::warn!("Capture engine stop() called while not capturing");
            return;
        }

        self.source.stop();
        self.capturing = false;
    }
}

/// Sender half of the capture-to-session frame channel
pub type FrameSender = mpsc::Sender<Vec<f32>>;

/// Receiver half of the capture-to-session frame channel
pub type FrameReceiver = mpsc::Receiver<Vec<f32>>;

/// Create the bounded channel that carries frames off the capture thread
pub fn create_frame_channel() -> (FrameSender, FrameReceiver) {
    mpsc::channel(100)
}

/// Consumer that forwards each frame into a [`FrameSender`].
///
/// `try_send` keeps the capture thread from ever blocking; a frame is
/// dropped, with a log line, when the receiver falls behind.
pub struct ChannelConsumer {
    tx: FrameSender,
}

impl ChannelConsumer {
    pub fn new(tx: FrameSender) -> Self {
        Self { tx }
    }
}

impl FrameConsumer for ChannelConsumer {
    fn on_frame(&self, frame: AudioFrame<'_>) {
        if self.tx.try_send(frame.samples.to_vec()).is_err() {
            log::warn!(
                "Frame receiver lagging, dropping {} samples",
                frame.samples.len()
            );
        }
    }
}
