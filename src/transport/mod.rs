//! WebSocket transport layer.
//!
//! This module handles communication between the agent (Rust) and the
//! HUD via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session (Rust) │                              │  Agent HUD      │
//! │                 │         WebSocket            │                 │
//! │  Connection     │─────────────────────────────►│  WebSocket      │
//! │  PendingTable   │      127.0.0.1:PORT          │  Server         │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Upgrade to WebSocket, spawn dispatch loop
//! 2. `Connection::register` - Send `register-agent`, await `registration-ack`
//! 3. `Connection::send` - Emit frames; responses route to `PendingTable`
//! 4. `Connection::close` - Close the socket
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and dispatch loop |
//! | `pending` | Correlation table for in-flight requests |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and dispatch loop.
pub mod connection;

/// Correlation table for in-flight requests.
pub mod pending;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_CONNECT_TIMEOUT, MessageObserver, ObserverSlot};
pub use pending::{PendingGuard, PendingSummary, PendingTable};
