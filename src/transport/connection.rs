//! WebSocket connection and dispatch loop.
//!
//! This module owns the socket to the HUD, the registration handshake and
//! routing of inbound frames.
//!
//! # Dispatch Loop
//!
//! The connection spawns a tokio task that is the socket's only reader and
//! only writer. It handles:
//!
//! - Outgoing frames queued by [`Connection::send`]
//! - `registration-ack`, which completes the handshake
//! - `human-input-response`, routed to the [`PendingTable`]
//! - Everything else, handed to the [`MessageObserver`]
//!
//! Malformed frames are logged and skipped. A close frame, a stream error
//! or end of stream stops the loop and marks the connection closed. Pending
//! requests are left to their own timeouts.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Map, Value, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::discovery::Endpoint;
use crate::error::{Error, Result, saturating_millis};
use crate::identifiers::AgentId;
use crate::protocol::{InboundMessage, OutboundMessage, RegistrationAck};
use crate::session::SessionState;
use crate::session::state::StateCell;

use super::pending::PendingTable;

// ============================================================================
// Constants
// ============================================================================

/// Default bound on opening the WebSocket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Callback for inbound frames the session does not handle itself.
pub type MessageObserver = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Observer slot, owned by the session so it survives reconnects.
pub type ObserverSlot = Arc<Mutex<Option<MessageObserver>>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the dispatch loop.
enum ConnectionCommand {
    /// Write one text frame and report the outcome.
    Send {
        text: String,
        result_tx: oneshot::Sender<Result<()>>,
    },
    /// Close the socket and stop the loop.
    Shutdown,
}

// ============================================================================
// Shared
// ============================================================================

/// State shared between connection handles and the dispatch loop.
struct Shared {
    state: StateCell,
    agent_id: Mutex<Option<AgentId>>,
    handshake: Mutex<Option<oneshot::Sender<AgentId>>>,
    pending: Arc<PendingTable>,
    observer: ObserverSlot,
}

impl Shared {
    fn mark_closed(&self) {
        self.state.set(SessionState::Closed);
        self.agent_id.lock().take();
        // Dropping the waiter wakes a pending handshake with ConnectionClosed.
        self.handshake.lock().take();
    }
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the HUD.
///
/// Cheap to clone; all clones drive the same dispatch loop. The loop stops
/// when [`Connection::close`] is called, the HUD hangs up, or the last
/// handle is dropped.
#[derive(Clone)]
pub struct Connection {
    endpoint: Endpoint,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    shared: Arc<Shared>,
}

impl Connection {
    /// Opens a WebSocket to `endpoint` and spawns the dispatch loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectFailed`] if the upgrade fails or does not
    /// finish within `connect_timeout`.
    pub async fn open(
        endpoint: Endpoint,
        connect_timeout: Duration,
        pending: Arc<PendingTable>,
        observer: ObserverSlot,
    ) -> Result<Self> {
        let url = endpoint.ws_url();
        debug!(url = %url, "Opening WebSocket");

        let ws_stream = match timeout(connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => return Err(Error::connect_failed(endpoint.port(), e.to_string())),
            Err(_) => {
                return Err(Error::connect_failed(
                    endpoint.port(),
                    format!("timed out after {}ms", connect_timeout.as_millis()),
                ));
            }
        };

        info!(port = endpoint.port(), "WebSocket connection established");
        Ok(Self::from_stream(endpoint, ws_stream, pending, observer))
    }

    fn from_stream(
        endpoint: Endpoint,
        ws_stream: WsStream,
        pending: Arc<PendingTable>,
        observer: ObserverSlot,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: StateCell::new(SessionState::Connecting),
            agent_id: Mutex::new(None),
            handshake: Mutex::new(None),
            pending,
            observer,
        });

        tokio::spawn(Self::run_dispatch_loop(
            ws_stream,
            command_rx,
            Arc::clone(&shared),
        ));

        Self {
            endpoint,
            command_tx,
            shared,
        }
    }

    /// Registers the agent and waits for the HUD's acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`Error::HandshakeTimeout`] if no `registration-ack` within `wait`
    /// - [`Error::ConnectionClosed`] if the HUD hangs up first
    /// - [`Error::SendFailed`] if the registration frame cannot be written
    pub async fn register(
        &self,
        name: &str,
        metadata: Map<String, Value>,
        wait: Duration,
    ) -> Result<AgentId> {
        let (tx, rx) = oneshot::channel();
        *self.shared.handshake.lock() = Some(tx);

        if !self.shared.state.transition(SessionState::Handshaking) {
            self.shared.handshake.lock().take();
            return Err(Error::ConnectionClosed);
        }

        let frame = OutboundMessage::RegisterAgent {
            name: name.to_owned(),
            metadata,
        };
        self.send(&frame).await.map_err(|e| match e {
            Error::NotConnected => Error::ConnectionClosed,
            other => other,
        })?;
        debug!(name, "Sent registration");

        match timeout(wait, rx).await {
            Ok(Ok(agent_id)) => Ok(agent_id),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.shared.handshake.lock().take();
                Err(Error::handshake_timeout(saturating_millis(wait)))
            }
        }
    }

    /// Serializes and writes one frame.
    ///
    /// Only `register-agent` may be sent before the handshake completes.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is closed
    /// - [`Error::NotReady`] if the handshake has not completed
    /// - [`Error::SendFailed`] if the socket write fails
    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        match self.shared.state.get() {
            SessionState::Ready => {}
            SessionState::Closed => return Err(Error::NotConnected),
            _ if message.is_registration() => {}
            _ => return Err(Error::not_ready(message.message_type())),
        }

        let text = to_string(message)?;
        let (result_tx, result_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send { text, result_tx })
            .map_err(|_| Error::NotConnected)?;

        result_rx.await.map_err(|_| Error::NotConnected)??;
        trace!(message_type = message.message_type(), "Frame sent");
        Ok(())
    }

    /// Closes the connection. Idempotent.
    pub fn close(&self) {
        if !self.shared.state.get().is_closed() {
            debug!(port = self.endpoint.port(), "Closing connection");
        }
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
        self.shared.mark_closed();
    }

    /// Returns the connection's state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    /// Returns `true` once the handshake has completed on an open socket.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Returns the agent ID assigned by the HUD, if registered.
    #[inline]
    #[must_use]
    pub fn agent_id(&self) -> Option<AgentId> {
        self.shared.agent_id.lock().clone()
    }

    /// Returns the endpoint this connection was opened to.
    #[inline]
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Dispatch loop that owns the socket.
    async fn run_dispatch_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        shared: Arc<Shared>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Frames from the HUD
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &shared);
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by HUD");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from connection handles
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { text, result_tx }) => {
                            let result = Self::write_frame(&mut ws_write, text).await;
                            let _ = result_tx.send(result);
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("All connection handles dropped");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        shared.mark_closed();
        debug!(pending = shared.pending.len(), "Dispatch loop terminated");
    }

    async fn write_frame(ws_write: &mut SplitSink<WsStream, Message>, text: String) -> Result<()> {
        ws_write
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to write frame");
                Error::send_failed(e.to_string())
            })
    }

    /// Routes one inbound text frame.
    fn handle_incoming_message(text: &str, shared: &Shared) {
        let message = match InboundMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Skipping malformed frame");
                return;
            }
        };

        match message {
            InboundMessage::RegistrationAck(ack) => Self::handle_registration_ack(ack, shared),

            InboundMessage::HumanInputResponse(response) => {
                let request_id = response.request_id.clone();
                if shared.pending.deliver(response) {
                    trace!(request_id = %request_id, "Response delivered");
                } else {
                    debug!(request_id = %request_id, "Response for unknown request");
                }
            }

            other => {
                let observer = shared.observer.lock().clone();
                match observer {
                    Some(observer) => observer(&other),
                    None => debug!(message_type = other.message_type(), "Unhandled frame"),
                }
            }
        }
    }

    fn handle_registration_ack(ack: RegistrationAck, shared: &Shared) {
        if !ack.success {
            warn!(agent_id = %ack.agent_id, "HUD rejected registration");
            return;
        }

        let Some(waiter) = shared.handshake.lock().take() else {
            debug!(agent_id = %ack.agent_id, "Unsolicited registration-ack ignored");
            return;
        };

        *shared.agent_id.lock() = Some(ack.agent_id.clone());
        if !shared.state.transition(SessionState::Ready) {
            shared.agent_id.lock().take();
            return;
        }

        info!(agent_id = %ack.agent_id, "Registered with HUD");
        let _ = waiter.send(ack.agent_id);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .field("agent_id", &self.agent_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
