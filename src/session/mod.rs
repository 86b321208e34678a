//! Client session with the Agent HUD.
//!
//! # Lifecycle
//!
//! ```text
//! Session::builder().build()  ──►  unstarted
//! session.start()             ──►  discovering ─► connecting ─► handshaking ─► ready
//! session.disconnect()        ──►  closed
//! HUD closes the socket       ──►  closed
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent configuration and validation |
//! | `core` | Start, disconnect, accessors |
//! | `input` | Correlated human-input requests |
//! | `content` | One-way content and event emissions |
//! | `state` | Lifecycle state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent session configuration.
pub mod builder;

/// One-way emissions.
mod content;

/// Session lifecycle.
pub mod core;

/// Agent identity.
pub mod identity;

/// Correlated human-input requests.
pub mod input;

/// Lifecycle state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{SessionBuilder, SessionConfig};
pub use self::core::Session;
pub use identity::AgentIdentity;
pub use input::{HumanInputRequest, InputOutcome};
pub use state::SessionState;
