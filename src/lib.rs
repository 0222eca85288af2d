//! Streaming voice autosuggest client
//!
//! Captures live microphone audio and streams it to a speech-to-address
//! recognition service over a persistent WebSocket, turning the service's
//! asynchronous responses into ranked three-word-address suggestions.
//!
//! # Architecture
//!
//! ```text
//! MicSource ──▶ CaptureEngine ──channel──▶ FrameStreamer ──▶ VoiceSession
//!               (stats, 2048-sample frames)                       │
//!                                                                 ▼
//!                                     SessionEvent::{Suggestions, Error, Closed}
//! ```
//!
//! The capture callback and the socket's read path run concurrently and
//! never block each other: frames cross to the async side through a bounded
//! channel, and inbound messages are dispatched as [`SessionEvent`]s.

pub mod audio;
pub mod config;
pub mod voice;

pub use audio::{CaptureEngine, CaptureError, CaptureStats, MicSource};
pub use config::ClientConfig;
pub use voice::{SessionEvent, SessionParams, Suggestion, VoiceError, VoiceSession};
