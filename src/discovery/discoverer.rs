//! Sequential port-range scanner.
//!
//! Ports are probed one at a time in ascending order, so the lowest
//! listening port always wins. The whole scan is bounded by
//! [`DiscoveryOptions::discovery_timeout`]; once it expires the in-flight
//! probe is abandoned and no endpoint is reported.

// ============================================================================
// Imports
// ============================================================================

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::options::DiscoveryOptions;
use super::probe::probe;
use super::Endpoint;

// ============================================================================
// Discoverer
// ============================================================================

/// Finds the HUD's port on loopback.
#[derive(Debug, Clone, Default)]
pub struct Discoverer {
    options: DiscoveryOptions,
}

impl Discoverer {
    /// Creates a discoverer.
    #[inline]
    #[must_use]
    pub const fn new(options: DiscoveryOptions) -> Self {
        Self { options }
    }

    /// Returns the options in use.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Scans the range and returns the first listening port.
    ///
    /// Returns `None` if the range is exhausted or the overall timeout
    /// expires first.
    pub async fn discover(&self) -> Option<Endpoint> {
        let range = self.options.port_range;
        debug!(
            start = range.start(),
            end = range.end(),
            timeout_ms = self.options.discovery_timeout.as_millis(),
            "Scanning for HUD"
        );

        match timeout(self.options.discovery_timeout, self.scan()).await {
            Ok(Some(endpoint)) => {
                info!(port = endpoint.port(), "Found HUD");
                Some(endpoint)
            }
            Ok(None) => {
                warn!(
                    start = range.start(),
                    end = range.end(),
                    "No HUD listening in port range"
                );
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.options.discovery_timeout.as_millis(),
                    "HUD discovery timed out"
                );
                None
            }
        }
    }

    async fn scan(&self) -> Option<Endpoint> {
        for port in self.options.port_range.iter() {
            if probe(port, self.options.probe_timeout).await {
                return Some(Endpoint::new(port));
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener as StdListener;
    use std::time::Duration;

    use serial_test::serial;
    use tokio::net::TcpListener;

    use crate::discovery::PortRange;

    /// Finds `len` consecutive loopback ports that are currently free.
    fn free_window(len: u16) -> u16 {
        for _ in 0..64 {
            let seed = StdListener::bind("127.0.0.1:0").expect("bind");
            let base = seed.local_addr().expect("addr").port();
            drop(seed);

            let Some(last) = base.checked_add(len - 1) else {
                continue;
            };
            let all_free = (base..=last).all(|p| StdListener::bind(("127.0.0.1", p)).is_ok());
            if all_free {
                return base;
            }
        }
        panic!("no free port window");
    }

    fn options(range: PortRange) -> DiscoveryOptions {
        DiscoveryOptions::new()
            .with_port_range(range)
            .with_probe_timeout(Duration::from_millis(200))
            .with_discovery_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    #[serial]
    async fn test_discovers_single_listener() {
        let base = free_window(3);
        let listener = TcpListener::bind(("127.0.0.1", base + 2))
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let range = PortRange::new(base, base + 2).expect("range");
        let endpoint = Discoverer::new(options(range)).discover().await;

        assert_eq!(endpoint, Some(Endpoint::new(port)));
    }

    #[tokio::test]
    #[serial]
    async fn test_lowest_listener_wins() {
        let base = free_window(3);
        let _high = TcpListener::bind(("127.0.0.1", base + 2))
            .await
            .expect("bind");
        let _low = TcpListener::bind(("127.0.0.1", base + 1))
            .await
            .expect("bind");

        let range = PortRange::new(base, base + 2).expect("range");
        let endpoint = Discoverer::new(options(range)).discover().await;

        assert_eq!(endpoint.map(|e| e.port()), Some(base + 1));
    }

    #[tokio::test]
    #[serial]
    async fn test_listener_outside_range_is_ignored() {
        let base = free_window(3);
        let _outside = TcpListener::bind(("127.0.0.1", base))
            .await
            .expect("bind");

        let range = PortRange::new(base + 1, base + 2).expect("range");
        let endpoint = Discoverer::new(options(range)).discover().await;

        assert_eq!(endpoint, None);
    }

    #[tokio::test]
    #[serial]
    async fn test_deadline_cuts_off_scan() {
        // Every probe takes at least one reactor turn, so two thousand of
        // them cannot finish inside two milliseconds.
        let base = free_window(2000);
        let last = base + 1999;
        let _listener = TcpListener::bind(("127.0.0.1", last))
            .await
            .expect("bind");

        let range = PortRange::new(base, last).expect("range");
        let options = options(range).with_discovery_timeout(Duration::from_millis(2));

        let started = std::time::Instant::now();
        let endpoint = Discoverer::new(options).discover().await;

        assert_eq!(endpoint, None);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_range_returns_none() {
        let base = free_window(2);
        let range = PortRange::new(base, base + 1).expect("range");

        assert!(Discoverer::new(options(range)).discover().await.is_none());
    }
}
