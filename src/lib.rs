//! Agent HUD - client runtime for a local human-in-the-loop dashboard.
//!
//! This library lets an automated agent find a locally running Agent HUD,
//! register with it, stream content to it, and ask its operator for input.
//!
//! # Architecture
//!
//! The agent is a WebSocket client of the HUD:
//!
//! - **Discovery**: TCP probes over a loopback port range, lowest port wins
//! - **Connection**: one socket, one spawned dispatch loop (single reader and writer)
//! - **Session**: registration handshake, then correlated requests and emissions
//!
//! Key design principles:
//!
//! - Zero configuration: no URL or port is ever supplied by the caller
//! - Each correlated request waits on its own one-shot, bounded by a timeout
//! - A request timing out is an outcome, not an error
//! - Nothing but `register-agent` is sent before the HUD acknowledges it
//!
//! # Quick Start
//!
//! ```no_run
//! use agent_hud::{Result, Session};
//! use agent_hud::protocol::Markdown;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .name("Build Bot")
//!         .metadata("version", "1.4.0")
//!         .build()?;
//!
//!     session.start().await?;
//!     session.emit_markdown(Markdown::new("## Build started")).await?;
//!
//!     if session.request_approval("Deploy to staging", None, None).await? {
//!         println!("Approved");
//!     }
//!
//!     session.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`discovery`] | Port probing and range scanning |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types |
//! | [`registry`] | Process-wide default session |
//! | [`session`] | Session lifecycle, requests and emissions |
//! | [`transport`] | WebSocket connection and pending-request table |

// ============================================================================
// Modules
// ============================================================================

/// Zero-configuration discovery of the HUD's port.
pub mod discovery;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// Wire message types.
///
/// Outbound frames, inbound frames and content payloads.
pub mod protocol;

/// Process-wide default session.
pub mod registry;

/// Session lifecycle, correlated requests and emissions.
///
/// Use [`Session::builder()`] to create a configured session.
pub mod session;

/// WebSocket transport layer.
///
/// Connection, dispatch loop and correlation table.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Discovery types
pub use discovery::{Discoverer, DiscoveryOptions, Endpoint, PortRange};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{AgentId, MessageId, RequestId};

// Protocol types
pub use protocol::{
    Code, HumanInputResponse, Image, InputKind, LogEntry, LogLevel, Markdown, Notification,
    NotificationKind, Priority, Progress,
};

// Session types
pub use session::{
    AgentIdentity, HumanInputRequest, InputOutcome, Session, SessionBuilder, SessionConfig,
    SessionState,
};
