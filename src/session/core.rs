//! Session lifecycle: discovery, connection and registration.
//!
//! A [`Session`] owns at most one [`Connection`] at a time. Starting runs a
//! fresh discovery cycle; disconnecting or losing the socket leaves the
//! session closed until the next start.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::discovery::{Discoverer, Endpoint};
use crate::error::{Error, Result, saturating_millis};
use crate::identifiers::AgentId;
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::transport::{Connection, MessageObserver, ObserverSlot, PendingSummary, PendingTable};

use super::builder::{SessionBuilder, SessionConfig};
use super::identity::AgentIdentity;
use super::state::{SessionState, StateCell};

// ============================================================================
// SessionInner
// ============================================================================

struct SessionInner {
    identity: AgentIdentity,
    config: SessionConfig,
    /// Start-up phase. While `Handshaking` or `Ready`, the live state is
    /// the connection's.
    phase: StateCell,
    connection: RwLock<Option<Connection>>,
    pending: Arc<PendingTable>,
    observer: ObserverSlot,
    /// Serializes concurrent `start` calls.
    start_lock: AsyncMutex<()>,
    /// Bumped by `disconnect`; a start that sees it change gives up.
    generation: AtomicU64,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            connection.close();
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Client session with the Agent HUD.
///
/// Cheap to clone; clones share one connection and one pending table.
///
/// # Example
///
/// ```no_run
/// use agent_hud::Session;
///
/// # async fn example() -> agent_hud::Result<()> {
/// let session = Session::builder().name("Build Bot").build()?;
/// session.start().await?;
///
/// if session.request_approval("Deploy to staging", None, None).await? {
///     // ...
/// }
///
/// session.disconnect();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Creates a builder for configuring a session.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn new(identity: AgentIdentity, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                identity,
                config,
                phase: StateCell::new(SessionState::Unstarted),
                connection: RwLock::new(None),
                pending: Arc::new(PendingTable::new()),
                observer: Arc::new(Mutex::new(None)),
                start_lock: AsyncMutex::new(()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Discovers the HUD, connects and registers.
    ///
    /// No-op if already ready. Concurrent calls are serialized; the second
    /// caller sees the first one's result. On failure the session is left
    /// closed and may be started again.
    ///
    /// # Errors
    ///
    /// - [`Error::DiscoveryTimeout`] if no listener is found in the range
    /// - [`Error::ConnectFailed`] if the WebSocket upgrade fails
    /// - [`Error::HandshakeTimeout`] if the HUD does not acknowledge
    /// - [`Error::ConnectionClosed`] if the HUD hangs up mid-handshake, or
    ///   [`Session::disconnect`] is called before the start completes
    pub async fn start(&self) -> Result<()> {
        let _guard = self.inner.start_lock.lock().await;

        if self.state().is_ready() {
            debug!("Session already ready");
            return Ok(());
        }

        if let Some(stale) = self.inner.connection.write().take() {
            stale.close();
        }

        let generation = self.inner.generation.load(Ordering::Acquire);
        match self.establish(generation).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let mut slot = self.inner.connection.write();
                if self.is_current(generation)
                    && let Some(half_open) = slot.take()
                {
                    half_open.close();
                }
                self.inner.phase.set(SessionState::Closed);
                drop(slot);
                warn!(error = %e, "Session start failed");
                Err(e)
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::Acquire) == generation
    }

    async fn establish(&self, generation: u64) -> Result<()> {
        let config = &self.inner.config;
        let range = config.discovery.port_range;

        self.inner.phase.set(SessionState::Discovering);
        let endpoint = Discoverer::new(config.discovery.clone())
            .discover()
            .await
            .ok_or_else(|| {
                Error::discovery_timeout(
                    range.start(),
                    range.end(),
                    saturating_millis(config.discovery.discovery_timeout),
                )
            })?;

        if !self.is_current(generation) {
            debug!("Start abandoned after discovery");
            return Err(Error::ConnectionClosed);
        }
        self.inner.phase.set(SessionState::Connecting);
        let connection = Connection::open(
            endpoint,
            config.connect_timeout,
            Arc::clone(&self.inner.pending),
            Arc::clone(&self.inner.observer),
        )
        .await?;

        {
            let mut slot = self.inner.connection.write();
            if !self.is_current(generation) {
                connection.close();
                debug!(port = endpoint.port(), "Start abandoned after connecting");
                return Err(Error::ConnectionClosed);
            }
            *slot = Some(connection.clone());
            self.inner.phase.set(SessionState::Handshaking);
        }

        let agent_id = connection
            .register(
                self.inner.identity.name(),
                self.inner.identity.metadata().clone(),
                config.handshake_timeout,
            )
            .await?;

        {
            let _slot = self.inner.connection.write();
            if !self.is_current(generation) {
                connection.close();
                return Err(Error::ConnectionClosed);
            }
            self.inner.phase.set(SessionState::Ready);
        }
        info!(
            agent_id = %agent_id,
            port = endpoint.port(),
            name = self.inner.identity.name(),
            "Connected to Agent HUD"
        );
        Ok(())
    }

    /// Closes the connection and marks the session closed. Idempotent.
    ///
    /// Outstanding requests are not failed; they run out their timeouts.
    pub fn disconnect(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);

        let mut slot = self.inner.connection.write();
        if let Some(connection) = slot.take() {
            connection.close();
            info!(name = self.inner.identity.name(), "Disconnected from Agent HUD");
        }
        self.inner.phase.set(SessionState::Closed);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.inner.phase.get() {
            SessionState::Handshaking | SessionState::Ready => self
                .inner
                .connection
                .read()
                .as_ref()
                .map_or(SessionState::Closed, Connection::state),
            phase => phase,
        }
    }

    /// Returns `true` if the session is ready.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_ready()
    }

    /// Returns the agent ID assigned by the HUD while ready.
    #[must_use]
    pub fn agent_id(&self) -> Option<AgentId> {
        self.inner
            .connection
            .read()
            .as_ref()
            .and_then(Connection::agent_id)
    }

    /// Returns the endpoint of the current connection.
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.inner.connection.read().as_ref().map(Connection::endpoint)
    }

    /// Returns the agent identity.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &AgentIdentity {
        &self.inner.identity
    }

    /// Returns the agent display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.identity.name()
    }

    /// Returns the validated configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Returns the number of requests awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Lists requests awaiting a response, oldest first.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<PendingSummary> {
        self.inner.pending.snapshot()
    }

    pub(crate) fn pending_table(&self) -> &Arc<PendingTable> {
        &self.inner.pending
    }

    // ========================================================================
    // Observer
    // ========================================================================

    /// Sets the callback for inbound frames the session does not handle.
    ///
    /// Runs on the dispatch task; keep it short. Survives reconnects.
    pub fn set_observer<F>(&self, observer: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let observer: MessageObserver = Arc::new(observer);
        *self.inner.observer.lock() = Some(observer);
    }

    /// Clears the observer.
    pub fn clear_observer(&self) {
        self.inner.observer.lock().take();
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Sends a frame on the current connection.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if there is no open connection
    /// - [`Error::NotReady`] if the handshake has not completed
    /// - [`Error::SendFailed`] if the socket write fails
    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let connection = self.current_connection().ok_or(Error::NotConnected)?;
        connection.send(message).await
    }

    /// Returns the connection if the session is ready.
    pub(crate) fn ready_connection(&self) -> Result<Connection> {
        match self.current_connection() {
            Some(connection) if connection.is_ready() => Ok(connection),
            _ => Err(Error::NotConnected),
        }
    }

    fn current_connection(&self) -> Option<Connection> {
        self.inner.connection.read().clone()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.inner.identity.name())
            .field("state", &self.state())
            .field("agent_id", &self.agent_id())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
