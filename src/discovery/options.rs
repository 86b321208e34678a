//! Discovery range and timeouts.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use agent_hud::discovery::{DiscoveryOptions, PortRange};
//!
//! let options = DiscoveryOptions::new()
//!     .with_port_range(PortRange::new(9000, 9010)?)
//!     .with_discovery_timeout(Duration::from_secs(3));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// First port the HUD may bind.
pub const DEFAULT_PORT_START: u16 = 8080;

/// Last port the HUD may bind.
pub const DEFAULT_PORT_END: u16 = 8199;

/// Per-port connect bound.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Overall scan bound.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// PortRange
// ============================================================================

/// Inclusive, non-empty range of candidate ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Creates an inclusive range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `start > end`.
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(Error::config(format!(
                "Invalid port range {start}-{end}: start must not exceed end"
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a range holding one port.
    #[inline]
    #[must_use]
    pub const fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Returns the first port.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Returns the last port.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u16 {
        self.end
    }

    /// Returns the number of ports in the range.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Always `false`: ranges hold at least one port.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `port` lies in the range.
    #[inline]
    #[must_use]
    pub const fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    /// Iterates the ports in ascending order.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: DEFAULT_PORT_START,
            end: DEFAULT_PORT_END,
        }
    }
}

// ============================================================================
// DiscoveryOptions
// ============================================================================

/// Discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Ports to scan, ascending.
    pub port_range: PortRange,

    /// Bound on each TCP connect attempt.
    pub probe_timeout: Duration,

    /// Bound on the whole scan.
    pub discovery_timeout: Duration,
}

impl DiscoveryOptions {
    /// Creates options with the default range and timeouts.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            port_range: PortRange {
                start: DEFAULT_PORT_START,
                end: DEFAULT_PORT_END,
            },
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    /// Sets the port range.
    #[inline]
    #[must_use]
    pub fn with_port_range(mut self, port_range: PortRange) -> Self {
        self.port_range = port_range;
        self
    }

    /// Sets the per-port probe timeout.
    #[inline]
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the overall discovery timeout.
    #[inline]
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
