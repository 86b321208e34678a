//! Error types for the Agent HUD client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use agent_hud::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     if session.request_approval("Delete temp files", None, None).await? {
//!         // ...
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Start-up | [`Error::DiscoveryTimeout`], [`Error::ConnectFailed`], [`Error::HandshakeTimeout`] |
//! | Session | [`Error::NotConnected`], [`Error::NotReady`], [`Error::ConnectionClosed`] |
//! | Transfer | [`Error::SendFailed`], [`Error::Decode`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Image`], [`Error::Url`] |
//!
//! A correlated request running out of time is not an error; it resolves to
//! [`InputOutcome::TimedOut`](crate::session::InputOutcome::TimedOut).

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Start-up Errors
    // ========================================================================
    /// No HUD listener found in the scanned port range.
    ///
    /// Returned when the range is exhausted or the discovery timeout elapses.
    #[error("HUD not found on ports {start}-{end} within {timeout_ms}ms")]
    DiscoveryTimeout {
        /// First port of the scanned range.
        start: u16,
        /// Last port of the scanned range.
        end: u16,
        /// Overall discovery budget in milliseconds.
        timeout_ms: u64,
    },

    /// WebSocket connection could not be established.
    #[error("Connection to port {port} failed: {message}")]
    ConnectFailed {
        /// Port the connection was attempted on.
        port: u16,
        /// Description of the failure.
        message: String,
    },

    /// The HUD did not acknowledge registration in time.
    #[error("Handshake timeout after {timeout_ms}ms")]
    HandshakeTimeout {
        /// Milliseconds waited for `registration-ack`.
        timeout_ms: u64,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// WebSocket connection closed unexpectedly.
    ///
    /// Returned when the HUD hangs up before the handshake completes.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation attempted while the session is not ready.
    ///
    /// Recoverable: start the session again and retry.
    #[error("Not connected to Agent HUD")]
    NotConnected,

    /// Message sent before the handshake completed.
    ///
    /// Only `register-agent` may be sent on an unregistered connection.
    #[error("Connection not ready: refusing to send '{message_type}' before registration")]
    NotReady {
        /// Wire `type` of the rejected message.
        message_type: &'static str,
    },

    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// Writing a frame to an established socket failed.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Description of the write failure.
        message: String,
    },

    /// Inbound frame could not be decoded.
    ///
    /// The dispatch loop logs and skips these; they never reach callers.
    #[error("Malformed frame: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image format detection error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a discovery timeout error.
    #[inline]
    pub fn discovery_timeout(start: u16, end: u16, timeout_ms: u64) -> Self {
        Self::DiscoveryTimeout {
            start,
            end,
            timeout_ms,
        }
    }

    /// Creates a connect failed error.
    #[inline]
    pub fn connect_failed(port: u16, message: impl Into<String>) -> Self {
        Self::ConnectFailed {
            port,
            message: message.into(),
        }
    }

    /// Creates a handshake timeout error.
    #[inline]
    pub fn handshake_timeout(timeout_ms: u64) -> Self {
        Self::HandshakeTimeout { timeout_ms }
    }

    /// Creates a not ready error.
    #[inline]
    pub fn not_ready(message_type: &'static str) -> Self {
        Self::NotReady { message_type }
    }

    /// Creates a send failed error.
    #[inline]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
#[inline]
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryTimeout { .. } | Self::HandshakeTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::SendFailed { .. }
        )
    }

    /// Returns `true` if this error aborted a session start.
    #[inline]
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryTimeout { .. }
                | Self::ConnectFailed { .. }
                | Self::HandshakeTimeout { .. }
                | Self::ConnectionClosed
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed after a fresh `start`.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryTimeout { .. }
                | Self::ConnectFailed { .. }
                | Self::HandshakeTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::NotReady { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
