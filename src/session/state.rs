//! Session lifecycle state machine.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::trace;

// ============================================================================
// SessionState
// ============================================================================

/// Session lifecycle state.
///
/// ```text
/// Unstarted ──► Discovering ──► Connecting ──► Handshaking ──► Ready
///                    │              │               │            │
///                    └──────────────┴───────────────┴────────────┴──► Closed
///
/// Closed ──► Discovering   (restart)
/// ```
///
/// Only [`SessionState::Ready`] permits sending anything other than the
/// registration frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Created, never started.
    #[default]
    Unstarted,
    /// Scanning the port range.
    Discovering,
    /// Opening the WebSocket.
    Connecting,
    /// Waiting for `registration-ack`.
    Handshaking,
    /// Registered; all operations permitted.
    Ready,
    /// Terminal until the next start.
    Closed,
}

impl SessionState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Unstarted => 0,
            Self::Discovering => 1,
            Self::Connecting => 2,
            Self::Handshaking => 3,
            Self::Ready => 4,
            Self::Closed => 5,
        }
    }

    /// Converts from the `u8` used in atomic storage.
    #[must_use]
    pub(crate) const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Unstarted,
            1 => Self::Discovering,
            2 => Self::Connecting,
            3 => Self::Handshaking,
            4 => Self::Ready,
            _ => Self::Closed,
        }
    }

    /// Returns `true` if all operations are permitted.
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if the session has terminated.
    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` while a start is in progress.
    #[inline]
    #[must_use]
    pub const fn is_starting(&self) -> bool {
        matches!(
            self,
            Self::Discovering | Self::Connecting | Self::Handshaking
        )
    }

    /// Returns `true` if a transition to `target` is valid.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        use SessionState::{Closed, Connecting, Discovering, Handshaking, Ready, Unstarted};

        match (*self, target) {
            // Start-up progression
            (Unstarted | Closed, Discovering) => true,
            (Discovering, Connecting) => true,
            (Connecting, Handshaking) => true,
            (Handshaking, Ready) => true,

            // Failure, disconnect or peer close
            (Unstarted | Discovering | Connecting | Handshaking | Ready | Closed, Closed) => true,

            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstarted => write!(f, "unstarted"),
            Self::Discovering => write!(f, "discovering"),
            Self::Connecting => write!(f, "connecting"),
            Self::Handshaking => write!(f, "handshaking"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

// ============================================================================
// StateCell
// ============================================================================

/// Lock-free holder for a [`SessionState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    #[inline]
    pub(crate) fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Unconditionally stores `state`.
    pub(crate) fn set(&self, state: SessionState) {
        let previous = SessionState::from_u8(self.0.swap(state.as_u8(), Ordering::AcqRel));
        if previous != state {
            trace!(from = %previous, to = %state, "State changed");
        }
    }

    /// Stores `target` only if the current state may move there.
    ///
    /// Returns `false` and leaves the state untouched otherwise.
    pub(crate) fn transition(&self, target: SessionState) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let from = SessionState::from_u8(current);
            if !from.can_transition_to(target) {
                return false;
            }
            match self.0.compare_exchange_weak(
                current,
                target.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    trace!(from = %from, to = %target, "State changed");
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(SessionState::Unstarted)
    }
}

// ============================================================================
// Tests
// ============================================================================
