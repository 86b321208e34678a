//! Frames received from the HUD.
//!
//! Decoding is two-step: the frame is parsed as a JSON object, then routed
//! by its `type` discriminant. Types the agent does not act on are kept as
//! [`InboundMessage::Other`] so observers can still inspect them.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{AgentId, RequestId};

use super::{HUMAN_INPUT_RESPONSE, REGISTRATION_ACK};

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded frame from the HUD.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Handshake acknowledgment.
    RegistrationAck(RegistrationAck),

    /// Answer to a correlated request.
    HumanInputResponse(HumanInputResponse),

    /// Any other frame (e.g. broadcasts meant for GUI clients).
    Other {
        /// The frame's `type`.
        message_type: String,
        /// The whole frame.
        body: Value,
    },
}

impl InboundMessage {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the frame is not a JSON object with a
    /// string `type`, or a known type lacks its required fields.
    pub fn decode(text: &str) -> Result<Self> {
        let body: Value =
            serde_json::from_str(text).map_err(|e| Error::decode(format!("invalid JSON: {e}")))?;

        let message_type = body
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::decode("missing 'type' discriminant"))?
            .to_owned();

        match message_type.as_str() {
            REGISTRATION_ACK => serde_json::from_value(body)
                .map(Self::RegistrationAck)
                .map_err(|e| Error::decode(format!("{REGISTRATION_ACK}: {e}"))),

            HUMAN_INPUT_RESPONSE => serde_json::from_value(body)
                .map(Self::HumanInputResponse)
                .map_err(|e| Error::decode(format!("{HUMAN_INPUT_RESPONSE}: {e}"))),

            _ => Ok(Self::Other { message_type, body }),
        }
    }

    /// Returns the frame's wire `type`.
    #[must_use]
    pub fn message_type(&self) -> &str {
        match self {
            Self::RegistrationAck(_) => REGISTRATION_ACK,
            Self::HumanInputResponse(_) => HUMAN_INPUT_RESPONSE,
            Self::Other { message_type, .. } => message_type.as_str(),
        }
    }
}

// ============================================================================
// RegistrationAck
// ============================================================================

/// Body of a `registration-ack` frame.
///
/// # Format
///
/// ```json
/// {
///   "type": "registration-ack",
///   "success": true,
///   "agentId": "abc123",
///   "serverTime": "2026-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationAck {
    /// Identifier assigned to this agent.
    #[serde(rename = "agentId")]
    pub agent_id: AgentId,

    /// Whether the HUD accepted the registration.
    #[serde(default = "accepted")]
    pub success: bool,

    /// HUD clock at registration time.
    #[serde(rename = "serverTime", default)]
    pub server_time: Option<String>,
}

fn accepted() -> bool {
    true
}

// ============================================================================
// HumanInputResponse
// ============================================================================

/// Body of a `human-input-response` frame.
///
/// # Format
///
/// ```json
/// {
///   "type": "human-input-response",
///   "requestId": "req_1700000000_9f2c...",
///   "response": "Approve",
///   "additionalContext": null,
///   "timestamp": "2026-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanInputResponse {
    /// Matches the request's `requestId`.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// Operator's answer.
    #[serde(default)]
    pub response: Option<String>,

    /// Set when the HUD itself gave up waiting for the operator.
    #[serde(default)]
    pub timeout: Option<bool>,

    /// Free-form context the operator attached.
    #[serde(rename = "additionalContext", default)]
    pub additional_context: Option<Value>,

    /// HUD clock at response time.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HumanInputResponse {
    /// Returns `true` if the HUD flagged this response as a timeout.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.timeout.unwrap_or_default()
    }

    /// Returns the answer text, or empty string if absent.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
