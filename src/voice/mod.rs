//! Voice autosuggest protocol session
//!
//! WebSocket-based streaming to the speech-to-address recognition service:
//! connection lifecycle, handshake, outbound audio framing with sequence
//! tracking, and inbound dispatch of suggestions, errors, and closure.

mod protocol;
mod session;
mod streamer;

pub use protocol::{
    decode_suggestions, encode_samples, AudioFormat, ClientMessage, Coordinate, SessionParams,
    Suggestion, SuggestionsEnvelope, DEFAULT_ENCODING,
};
pub use session::{SessionEvent, SessionState, VoiceSession};
pub use streamer::FrameStreamer;

/// Errors that can occur during a voice autosuggest session
#[derive(Debug, Clone)]
pub enum VoiceError {
    /// Voice API key not configured
    MissingApiKey,
    /// `open()` called while a session is already open
    SessionAlreadyOpen,
    /// Send attempted while the session is closed
    ChannelClosed,
    /// The WebSocket connection could not be established
    SocketCreationFailed(String),
    /// The server sent a message kind this protocol never uses
    UnexpectedMessageKind(String),
    /// A frame could not be written to the socket
    SendFailed(String),
}

impl std::fmt::Display for VoiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceError::MissingApiKey => {
                write!(
                    f,
                    "Voice API key not configured. Set W3W_API_KEY environment variable."
                )
            }
            VoiceError::SessionAlreadyOpen => {
                write!(f, "Session is already open")
            }
            VoiceError::ChannelClosed => {
                write!(f, "Couldn't send because the session is closed")
            }
            VoiceError::SocketCreationFailed(e) => {
                write!(f, "Couldn't create websocket: {}", e)
            }
            VoiceError::UnexpectedMessageKind(m) => {
                write!(f, "Unexpected message was returned by server: {}", m)
            }
            VoiceError::SendFailed(e) => {
                write!(f, "Failed to send audio: {}", e)
            }
        }
    }
}

impl std::error::Error for VoiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_error_display() {
        let err = VoiceError::MissingApiKey;
        assert!(err.to_string().contains("W3W_API_KEY"));

        let err = VoiceError::SocketCreationFailed("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = VoiceError::UnexpectedMessageKind("binary payload".to_string());
        assert!(err.to_string().contains("binary payload"));
    }
}
