//! Correlation table for in-flight human-input requests.
//!
//! Each waiting caller owns its entry through a [`PendingGuard`]: the entry
//! is inserted before the request frame is written and removed when the
//! guard drops, whether the caller got an answer, timed out, or had its
//! future cancelled. The dispatch loop never removes entries; it only takes
//! the one-shot responder out of a matching entry, so a response is
//! delivered at most once and a late or unknown response is dropped.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::identifiers::RequestId;
use crate::protocol::{HumanInputResponse, InputRequestFrame};

// ============================================================================
// Types
// ============================================================================

/// One in-flight request.
#[derive(Debug)]
struct PendingRecord {
    request: InputRequestFrame,
    created_at: Instant,
    responder: Option<oneshot::Sender<HumanInputResponse>>,
}

/// Snapshot of an in-flight request.
#[derive(Debug, Clone)]
pub struct PendingSummary {
    /// Correlation ID.
    pub request_id: RequestId,
    /// Prompt shown to the operator.
    pub message: String,
    /// Time since the request was registered.
    pub age: Duration,
}

// ============================================================================
// PendingTable
// ============================================================================

/// Map of request IDs to waiting callers.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: Mutex<FxHashMap<RequestId, PendingRecord>>,
}

impl PendingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request and returns its guard and response receiver.
    ///
    /// Must be called before the request frame is written so a fast
    /// response cannot arrive ahead of its entry.
    pub fn register(
        self: &Arc<Self>,
        request: InputRequestFrame,
    ) -> (PendingGuard, oneshot::Receiver<HumanInputResponse>) {
        let (tx, rx) = oneshot::channel();
        let request_id = request.request_id.clone();

        let record = PendingRecord {
            request,
            created_at: Instant::now(),
            responder: Some(tx),
        };

        let replaced = self.entries.lock().insert(request_id.clone(), record);
        if replaced.is_some() {
            warn!(request_id = %request_id, "Replaced pending request with duplicate ID");
        }
        trace!(request_id = %request_id, "Pending request registered");

        let guard = PendingGuard {
            table: Arc::clone(self),
            request_id,
        };
        (guard, rx)
    }

    /// Hands a response to the caller waiting on its request ID.
    ///
    /// Returns `false` if no caller is waiting: the ID is unknown, its
    /// caller already gave up, or a response was already delivered.
    pub fn deliver(&self, response: HumanInputResponse) -> bool {
        let responder = {
            let mut entries = self.entries.lock();
            match entries.get_mut(&response.request_id) {
                Some(record) => record.responder.take(),
                None => return false,
            }
        };

        let Some(responder) = responder else {
            debug!(request_id = %response.request_id, "Duplicate response ignored");
            return false;
        };

        let request_id = response.request_id.clone();
        if responder.send(response).is_err() {
            debug!(request_id = %request_id, "Caller dropped before response arrived");
            return false;
        }
        true
    }

    /// Removes an entry. Removing an absent ID is a no-op.
    pub fn remove(&self, request_id: &RequestId) -> bool {
        self.entries.lock().remove(request_id).is_some()
    }

    /// Returns `true` if `request_id` is in flight.
    #[inline]
    #[must_use]
    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.entries.lock().contains_key(request_id)
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is in flight.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Lists in-flight requests, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PendingSummary> {
        let now = Instant::now();
        let mut summaries: Vec<PendingSummary> = self
            .entries
            .lock()
            .iter()
            .map(|(id, record)| PendingSummary {
                request_id: id.clone(),
                message: record.request.message.clone(),
                age: now.saturating_duration_since(record.created_at),
            })
            .collect();
        summaries.sort_by(|a, b| b.age.cmp(&a.age));
        summaries
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Removes its table entry on drop.
#[derive(Debug)]
pub struct PendingGuard {
    table: Arc<PendingTable>,
    request_id: RequestId,
}

impl PendingGuard {
    /// Returns the guarded request ID.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.table.remove(&self.request_id) {
            trace!(request_id = %self.request_id, "Pending request released");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
