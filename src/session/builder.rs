//! Builder pattern for session configuration.
//!
//! Provides a fluent API for configuring and creating [`Session`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use agent_hud::Session;
//!
//! # async fn example() -> agent_hud::Result<()> {
//! let session = Session::builder()
//!     .name("Build Bot")
//!     .metadata("version", "1.4.0")
//!     .port_range(8080, 8199)
//!     .handshake_timeout(Duration::from_secs(3))
//!     .build()?;
//!
//! session.start().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::{Map, Value};

use crate::discovery::options::{
    DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_PORT_END, DEFAULT_PORT_START, DEFAULT_PROBE_TIMEOUT,
};
use crate::discovery::{DiscoveryOptions, PortRange};
use crate::error::{Error, Result};
use crate::transport::DEFAULT_CONNECT_TIMEOUT;

use super::core::Session;
use super::identity::AgentIdentity;

// ============================================================================
// Constants
// ============================================================================

/// Display name used when none is given.
pub const DEFAULT_AGENT_NAME: &str = "Rust Agent";

/// Default bound on waiting for `registration-ack`.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default operator timeout for correlated requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Extra local wait past a request's operator timeout.
///
/// Lets a HUD-side timeout response arrive before the local wait expires.
pub const DEFAULT_RESPONSE_GRACE: Duration = Duration::from_secs(5);

// ============================================================================
// SessionConfig
// ============================================================================

/// Validated session timing and discovery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Port range and probe bounds.
    pub discovery: DiscoveryOptions,
    /// Bound on the WebSocket upgrade.
    pub connect_timeout: Duration,
    /// Bound on waiting for `registration-ack`.
    pub handshake_timeout: Duration,
    /// Operator timeout used when a request does not set one.
    pub request_timeout: Duration,
    /// Extra local wait past each request's operator timeout.
    pub response_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryOptions::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            response_grace: DEFAULT_RESPONSE_GRACE,
        }
    }
}

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`] instance.
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    /// Agent display name.
    name: String,
    /// Registration metadata.
    metadata: Map<String, Value>,
    /// First and last port to scan, unvalidated.
    ports: (u16, u16),
    probe_timeout: Duration,
    discovery_timeout: Duration,
    connect_timeout: Duration,
    handshake_timeout: Duration,
    request_timeout: Duration,
    response_grace: Duration,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            name: DEFAULT_AGENT_NAME.to_owned(),
            metadata: Map::new(),
            ports: (DEFAULT_PORT_START, DEFAULT_PORT_END),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            response_grace: DEFAULT_RESPONSE_GRACE,
        }
    }
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a new builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the agent display name.
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds one metadata entry.
    #[inline]
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole metadata map.
    #[inline]
    #[must_use]
    pub fn metadata_map(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the inclusive port range to scan.
    #[inline]
    #[must_use]
    pub fn port_range(mut self, start: u16, end: u16) -> Self {
        self.ports = (start, end);
        self
    }

    /// Sets the per-port probe timeout.
    #[inline]
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the overall discovery timeout.
    #[inline]
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Sets the WebSocket upgrade timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets how long to wait for `registration-ack`.
    #[inline]
    #[must_use]
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the operator timeout used when a request does not set one.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the extra local wait past each request's operator timeout.
    #[inline]
    #[must_use]
    pub fn response_grace(mut self, grace: Duration) -> Self {
        self.response_grace = grace;
        self
    }

    /// Builds the session with validation.
    ///
    /// The session is returned unstarted; call [`Session::start`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the name is blank
    /// - [`Error::Config`] if the port range is inverted
    /// - [`Error::Config`] if a timeout is zero
    pub fn build(self) -> Result<Session> {
        let name = self.validate_name()?;
        let port_range = PortRange::new(self.ports.0, self.ports.1)?;
        self.validate_timeouts()?;

        let config = SessionConfig {
            discovery: DiscoveryOptions::new()
                .with_port_range(port_range)
                .with_probe_timeout(self.probe_timeout)
                .with_discovery_timeout(self.discovery_timeout),
            connect_timeout: self.connect_timeout,
            handshake_timeout: self.handshake_timeout,
            request_timeout: self.request_timeout,
            response_grace: self.response_grace,
        };

        Ok(Session::new(AgentIdentity::new(name, self.metadata), config))
    }

    /// Builds the session and starts it.
    ///
    /// # Errors
    ///
    /// Any error from [`build`](Self::build) or [`Session::start`].
    pub async fn connect(self) -> Result<Session> {
        let session = self.build()?;
        session.start().await?;
        Ok(session)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    fn validate_name(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::config(
                "Agent name must not be empty. Use .name() to set it.\n\
                 Example: Session::builder().name(\"Build Bot\")",
            ));
        }
        Ok(name.to_owned())
    }

    fn validate_timeouts(&self) -> Result<()> {
        let checks = [
            ("probe_timeout", self.probe_timeout),
            ("discovery_timeout", self.discovery_timeout),
            ("connect_timeout", self.connect_timeout),
            ("handshake_timeout", self.handshake_timeout),
        ];

        for (field, value) in checks {
            if value.is_zero() {
                return Err(Error::config(format!("{field} must be greater than zero")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
