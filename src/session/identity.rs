//! Agent identity sent during registration.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

// ============================================================================
// AgentIdentity
// ============================================================================

/// Display name and metadata the HUD shows for this agent.
///
/// Fixed for the life of a session and sent once per connection.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    name: String,
    metadata: Map<String, Value>,
}

impl AgentIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metadata map.
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
