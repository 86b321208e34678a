//! Process-wide default session.
//!
//! For scripts that want one connection without threading a [`Session`]
//! through every call. Install with [`init`] or [`connect`], release with
//! [`teardown`].
//!
//! ```no_run
//! use agent_hud::registry;
//! use agent_hud::protocol::LogLevel;
//!
//! # async fn example() -> agent_hud::Result<()> {
//! registry::connect("Build Bot").await?;
//! registry::emit_log("Build started", LogLevel::Info).await?;
//!
//! if registry::request_approval("Publish artifacts").await? {
//!     // ...
//! }
//!
//! registry::teardown();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use parking_lot::{RwLock, const_rwlock};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::MessageId;
use crate::protocol::{LogEntry, LogLevel, Markdown};
use crate::session::Session;

// ============================================================================
// Storage
// ============================================================================

static DEFAULT_SESSION: RwLock<Option<Session>> = const_rwlock(None);

// ============================================================================
// Lifecycle
// ============================================================================

/// Installs `session` as the default, returning the one it replaces.
///
/// The replaced session is not disconnected.
pub fn init(session: Session) -> Option<Session> {
    debug!(name = session.name(), "Installing default session");
    DEFAULT_SESSION.write().replace(session)
}

/// Builds a session named `name`, starts it and installs it as the default.
///
/// # Errors
///
/// Any error from building or starting the session; the default is left
/// unchanged in that case.
pub async fn connect(name: impl Into<String>) -> Result<Session> {
    let session = Session::builder().name(name).build()?;
    session.start().await?;
    init(session.clone());
    Ok(session)
}

/// Returns the default session, if installed.
#[must_use]
pub fn get() -> Option<Session> {
    DEFAULT_SESSION.read().clone()
}

/// Disconnects and removes the default session.
pub fn teardown() {
    let session = DEFAULT_SESSION.write().take();
    if let Some(session) = session {
        session.disconnect();
    }
}

fn ready_default() -> Result<Session> {
    match get() {
        Some(session) if session.is_connected() => Ok(session),
        _ => {
            warn!("Not connected to Agent HUD");
            Err(Error::NotConnected)
        }
    }
}

// ============================================================================
// Convenience
// ============================================================================

/// Emits markdown through the default session.
///
/// # Errors
///
/// [`Error::NotConnected`] without a ready default session.
pub async fn emit_markdown(content: impl Into<String>) -> Result<MessageId> {
    ready_default()?
        .emit_markdown(Markdown::new(content))
        .await
}

/// Emits a log line through the default session.
///
/// # Errors
///
/// [`Error::NotConnected`] without a ready default session.
pub async fn emit_log(message: impl Into<String>, level: LogLevel) -> Result<MessageId> {
    ready_default()?
        .emit_log(LogEntry::new(message).with_level(level))
        .await
}

/// Requests approval through the default session.
///
/// # Errors
///
/// [`Error::NotConnected`] without a ready default session.
pub async fn request_approval(action: &str) -> Result<bool> {
    ready_default()?.request_approval(action, None, None).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serial_test::serial;

    #[tokio::test]
    #[serial(registry)]
    async fn test_convenience_without_session() {
        teardown();

        assert!(get().is_none());
        assert!(matches!(emit_markdown("# hi").await, Err(Error::NotConnected)));
        assert!(matches!(
            emit_log("hello", LogLevel::Info).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(request_approval("x").await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    #[serial(registry)]
    async fn test_unstarted_default_is_not_ready() {
        teardown();
        let session = Session::builder().name("idle").build().expect("build");
        assert!(init(session).is_none());

        assert_eq!(get().map(|s| s.name().to_owned()), Some("idle".to_owned()));
        assert!(matches!(emit_markdown("x").await, Err(Error::NotConnected)));

        teardown();
        assert!(get().is_none());
    }

    #[test]
    #[serial(registry)]
    fn test_init_returns_previous() {
        teardown();
        let first = Session::builder().name("first").build().expect("build");
        let second = Session::builder().name("second").build().expect("build");

        assert!(init(first).is_none());
        let replaced = init(second).expect("previous");
        assert_eq!(replaced.name(), "first");

        teardown();
    }
}
