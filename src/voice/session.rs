//! Session state machine for the voice autosuggest service
//!
//! Owns the WebSocket connection, splits it into independently running read
//! and write halves, and dispatches inbound messages as [`SessionEvent`]s on
//! a bounded channel. The write path (handshake, audio frames, end-of-stream)
//! runs on the caller; the read path runs on a spawned task.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

use super::protocol::{decode_suggestions, ClientMessage, SessionParams, Suggestion};
use super::VoiceError;
use crate::config::ClientConfig;

/// Capacity of the inbound event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
}

/// Inbound events dispatched by the session's reader task
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A ranked suggestion list arrived. May be empty.
    Suggestions(Vec<Suggestion>),

    /// An asynchronous failure was observed on the connection
    Error(VoiceError),

    /// The connection closed. The server's reason is passed through
    /// verbatim so callers can inspect it (an invalid-credential closure is
    /// recognisable from the reason text; that policy lives one layer up).
    Closed { reason: String },
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Handle to the voice autosuggest service.
///
/// State machine: `Closed --open()--> Open --close()--> Closed`. At most one
/// connection is active at a time; the socket handle is replaced on every
/// `open()` and dropped on every `close()`.
pub struct VoiceSession {
    config: ClientConfig,
    state: SessionState,
    write: Option<WsSink>,
    sequence: u64,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: Option<mpsc::Receiver<SessionEvent>>,
    reader_task: Option<tokio::task::JoinHandle<()>>,
}

impl VoiceSession {
    /// Create a session in the `Closed` state
    pub fn new(config: ClientConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            config,
            state: SessionState::Closed,
            write: None,
            sequence: 0,
            events_tx,
            events_rx: Some(events_rx),
            reader_task: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of audio frames transmitted in the current session
    pub fn sequence_number(&self) -> u64 {
        self.sequence
    }

    /// Take ownership of the event receiver.
    ///
    /// Events from every `open()` of this session arrive here. Returns
    /// `None` if already taken.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SessionEvent>> {
        self.events_rx.take()
    }

    /// Open the connection and send the handshake.
    ///
    /// Autosuggest parameters travel in the URL query string; audio
    /// parameters travel in the handshake message, which is transmitted
    /// before any frame. No acknowledgement is awaited — the server treats
    /// connection order as implicit sequencing.
    ///
    /// Fails with [`VoiceError::SessionAlreadyOpen`] while a session is
    /// open (the existing connection is untouched) and with
    /// [`VoiceError::SocketCreationFailed`] when the connection cannot be
    /// established (state stays `Closed`).
    pub async fn open(&mut self, params: &SessionParams) -> Result<(), VoiceError> {
        if self.state == SessionState::Open {
            return Err(VoiceError::SessionAlreadyOpen);
        }

        let url = format!(
            "{}?key={}{}",
            self.config.endpoint,
            self.config.api_key,
            params.query_string()
        );

        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| VoiceError::SocketCreationFailed(e.to_string()))?;

        log::info!("Connected to {}", self.config.endpoint);

        let (write, read) = stream.split();
        self.write = Some(write);
        self.sequence = 0;
        self.state = SessionState::Open;

        let events_tx = self.events_tx.clone();
        self.reader_task = Some(tokio::spawn(run_reader(read, events_tx)));

        let handshake = ClientMessage::start_recognition(&params.encoding, params.sample_rate);
        self.send_control(&handshake).await
    }

    /// Send one frame of raw audio bytes as a binary message.
    ///
    /// While `Closed` this reports [`VoiceError::ChannelClosed`] and
    /// transmits nothing; the sequence counter is untouched. On success the
    /// counter advances by one.
    pub async fn send(&mut self, frame: Vec<u8>) -> Result<(), VoiceError> {
        if self.state != SessionState::Open {
            return Err(VoiceError::ChannelClosed);
        }

        let write = self.write.as_mut().ok_or(VoiceError::ChannelClosed)?;
        write
            .send(Message::Binary(frame))
            .await
            .map_err(|e| VoiceError::SendFailed(e.to_string()))?;

        self.sequence += 1;
        Ok(())
    }

    /// Tell the server that no further audio will arrive.
    ///
    /// Carries the current sequence counter as `last_seq_no`. Does not
    /// change session state — the caller still decides when to `close()`,
    /// since suggestions may arrive after this point.
    pub async fn end_samples(&mut self) -> Result<(), VoiceError> {
        if self.state != SessionState::Open {
            return Err(VoiceError::ChannelClosed);
        }

        self.send_control(&ClientMessage::end_of_stream(self.sequence))
            .await
    }

    /// Tear down the connection.
    ///
    /// Safe to call repeatedly and from any context; always leaves the
    /// session `Closed`. Events still queued from the torn-down connection
    /// remain readable and are harmless.
    pub async fn close(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }

        if let Some(mut write) = self.write.take() {
            if let Err(e) = write.close().await {
                log::warn!("Error closing websocket: {}", e);
            }
        }

        self.state = SessionState::Closed;
    }

    async fn send_control(&mut self, msg: &ClientMessage) -> Result<(), VoiceError> {
        let json =
            serde_json::to_string(msg).map_err(|e| VoiceError::SendFailed(e.to_string()))?;

        let write = self.write.as_mut().ok_or(VoiceError::ChannelClosed)?;
        write
            .send(Message::Text(json))
            .await
            .map_err(|e| VoiceError::SendFailed(e.to_string()))
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        // The reader must not outlive the session it reports for.
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

/// Read half of the connection: every inbound message is matched
/// exhaustively and dispatched as a [`SessionEvent`]. Runs until the stream
/// ends or the event receiver is dropped.
async fn run_reader(mut read: WsStream, events: mpsc::Sender<SessionEvent>) {
    loop {
        let event = match read.next().await {
            Some(Ok(Message::Text(text))) => match decode_suggestions(&text) {
                Some(suggestions) => SessionEvent::Suggestions(suggestions),
                None => {
                    // Undecodable payloads are dropped without an event.
                    log::debug!("Ignoring undecodable text payload ({} bytes)", text.len());
                    continue;
                }
            },
            Some(Ok(Message::Binary(data))) => {
                SessionEvent::Error(VoiceError::UnexpectedMessageKind(format!(
                    "binary payload of {} bytes",
                    data.len()
                )))
            }
            Some(Ok(Message::Close(frame))) => {
                let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                log::info!("Server closed connection: {:?}", reason);
                let _ = events.send(SessionEvent::Closed { reason }).await;
                break;
            }
            // Keepalives are answered by the transport and carry no payload.
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Frame(_))) => SessionEvent::Error(
                VoiceError::UnexpectedMessageKind("raw frame".to_string()),
            ),
            Some(Err(e)) => {
                log::warn!("WebSocket error: {}", e);
                let _ = events
                    .send(SessionEvent::Closed {
                        reason: e.to_string(),
                    })
                    .await;
                break;
            }
            None => {
                let _ = events
                    .send(SessionEvent::Closed {
                        reason: String::new(),
                    })
                    .await;
                break;
            }
        };

        if events.send(event).await.is_err() {
            log::debug!("Event receiver dropped, reader exiting");
            break;
        }
    }

    log::debug!("Reader task exiting");
}
