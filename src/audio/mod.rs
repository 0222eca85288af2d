//! Microphone capture pipeline
//!
//! Continuous low-latency capture from a [`FrameSource`] with idempotent
//! start/stop, live signal-level statistics, and synchronous frame delivery
//! to a registered consumer. Uses CPAL for the hardware input.

mod capture;
mod levels;
mod source;

pub use capture::{
    create_frame_channel, AudioFrame, CaptureEngine, ChannelConsumer, FrameConsumer,
    FrameReceiver, FrameSender,
};
pub use levels::{CaptureStats, LevelMeter};
pub use source::{FrameHandler, FrameSource, MicSource, FRAME_SIZE};

/// Errors that can occur while setting up audio capture
#[derive(Debug, Clone)]
pub enum CaptureError {
    NoInputDevice,
    NoSupportedConfig,
    StreamCreationFailed(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::NoInputDevice => write!(f, "No audio input device found"),
            CaptureError::NoSupportedConfig => write!(f, "No supported audio configuration"),
            CaptureError::StreamCreationFailed(e) => {
                write!(f, "Failed to create audio stream: {}", e)
            }
        }
    }
}

impl std::error::Error for CaptureError {}
