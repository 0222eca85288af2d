//! Pump connecting the capture thread to a voice session
//!
//! The capture callback pushes frames into a bounded channel without
//! blocking; this pump drains the channel on the async side and forwards
//! each frame over the session as a binary message.
//!
//! ```text
//! Capture Thread (sync)             Tokio Runtime (async)
//! ┌──────────────────┐              ┌────────────────────────┐
//! │ ChannelConsumer  │──channel──▶  │ FrameStreamer::run()   │
//! │ try_send(frame)  │              │   ├─ encode_samples    │
//! └──────────────────┘              │   └─ VoiceSession.send │
//!                                   └────────────────────────┘
//! ```

use crate::audio::FrameReceiver;

use super::protocol::encode_samples;
use super::session::VoiceSession;
use super::VoiceError;

/// Streams captured frames to an open [`VoiceSession`]
pub struct FrameStreamer {
    session: VoiceSession,
    rx: FrameReceiver,
    frames_sent: u64,
}

impl FrameStreamer {
    /// Create a streamer over an already-open session and the receiver end
    /// of the frame channel
    pub fn new(session: VoiceSession, rx: FrameReceiver) -> Self {
        Self {
            session,
            rx,
            frames_sent: 0,
        }
    }

    /// Forward frames until the channel closes, then send end-of-stream.
    ///
    /// Returns the session (still open — suggestions may arrive after the
    /// last frame, so the caller decides when to close) and the number of
    /// frames sent. A send failure aborts the run and propagates.
    pub async fn run(mut self) -> Result<(VoiceSession, u64), VoiceError> {
        log::info!("Frame streamer started");

        while let Some(samples) = self.rx.recv().await {
            self.session.send(encode_samples(&samples)).await?;
            self.frames_sent += 1;

            // Periodic logging (every 50 frames)
            if self.frames_sent % 50 == 0 {
                log::debug!("Sent {} frames", self.frames_sent);
            }
        }

        // Channel closed - capture stopped
        self.session.end_samples().await?;

        log::info!("Streaming complete, {} frames sent", self.frames_sent);

        Ok((self.session, self.frames_sent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::create_frame_channel;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn test_closed_session_fails_fast() {
        let (tx, rx) = create_frame_channel();
        let session = VoiceSession::new(ClientConfig::new("test-key"));
        let streamer = FrameStreamer::new(session, rx);

        tx.send(vec![0.0; 4]).await.unwrap();
        drop(tx);

        // The session was never opened, so the first send reports it.
        let result = streamer.run().await;
        assert!(matches!(result, Err(VoiceError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_empty_channel_still_ends_stream() {
        let (tx, rx) = create_frame_channel();
        let session = VoiceSession::new(ClientConfig::new("test-key"));
        let streamer = FrameStreamer::new(session, rx);

        drop(tx);

        // No frames at all: the pump goes straight to end-of-stream, which
        // a closed session rejects.
        let result = streamer.run().await;
        assert!(matches!(result, Err(VoiceError::ChannelClosed)));
    }
}
