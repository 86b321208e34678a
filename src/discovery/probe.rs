//! Single-port TCP probe.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use super::LOOPBACK;

// ============================================================================
// Probe
// ============================================================================

/// Reports whether something accepts TCP connections on `127.0.0.1:port`.
///
/// The connection is closed immediately. Refusal, timeout and any other
/// error all read as "no listener".
pub async fn probe(port: u16, probe_timeout: Duration) -> bool {
    match timeout(probe_timeout, TcpStream::connect((LOOPBACK, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            trace!(port, "Listener found");
            true
        }
        Ok(Err(e)) => {
            trace!(port, error = %e, "No listener");
            false
        }
        Err(_) => {
            trace!(port, "Probe timed out");
            false
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
