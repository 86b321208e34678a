//! Zero-configuration discovery of the HUD's listening port.
//!
//! The HUD binds somewhere in a narrow, documented port range on the
//! loopback interface. Discovery probes that range in ascending order with
//! plain TCP connects and stops at the first listener.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`probe()`] | One bounded TCP connect, folded into `bool` |
//! | [`Discoverer`] | Sequential scan of a [`PortRange`] |
//! | [`DiscoveryOptions`] | Range and timeouts |
//! | [`Endpoint`] | The discovered loopback address |
//!
//! # Example
//!
//! ```no_run
//! use agent_hud::discovery::{Discoverer, DiscoveryOptions};
//!
//! # async fn example() {
//! let discoverer = Discoverer::new(DiscoveryOptions::new());
//! if let Some(endpoint) = discoverer.discover().await {
//!     println!("HUD at {}", endpoint.ws_url());
//! }
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

// ============================================================================
// Submodules
// ============================================================================

/// Sequential port-range scanner.
pub mod discoverer;

/// Discovery range and timeouts.
pub mod options;

/// Single-port TCP probe.
pub mod probe;

// ============================================================================
// Re-exports
// ============================================================================

pub use discoverer::Discoverer;
pub use options::{DiscoveryOptions, PortRange};
pub use probe::probe;

// ============================================================================
// Constants
// ============================================================================

/// The HUD is only ever reached over loopback.
pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// Endpoint
// ============================================================================

/// Loopback address of a discovered HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint on the loopback interface.
    #[inline]
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self { port }
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the socket address.
    #[inline]
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(LOOPBACK, self.port)
    }

    /// Returns the WebSocket URL.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

// ============================================================================
// Tests
// ============================================================================
