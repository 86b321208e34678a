//! Frames sent from the agent to the HUD.
//!
//! [`OutboundMessage`] is internally tagged by `type`, so each variant
//! serializes to a single flat JSON object:
//!
//! ```json
//! { "type": "register-agent", "name": "Build Bot", "metadata": {} }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::{MessageId, RequestId};

use super::content::{AgentPayload, Code, ContentData, Image, Markdown};

// ============================================================================
// OutboundMessage
// ============================================================================

/// All frames the agent sends to the HUD.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Handshake identity registration.
    #[serde(rename = "register-agent")]
    RegisterAgent {
        /// Agent display name.
        name: String,
        /// Open-ended agent metadata.
        metadata: Map<String, Value>,
    },

    /// Correlated request for human input.
    #[serde(rename = "human-input-request")]
    HumanInputRequest(InputRequestFrame),

    /// Markdown content for rich display.
    #[serde(rename = "markdown-content")]
    MarkdownContent {
        /// Content fields.
        data: ContentData<Markdown>,
    },

    /// Source code with syntax highlighting.
    #[serde(rename = "code-content")]
    CodeContent {
        /// Content fields.
        data: ContentData<Code>,
    },

    /// Image by URL or data URL.
    #[serde(rename = "image-content")]
    ImageContent {
        /// Content fields.
        data: ContentData<Image>,
    },

    /// Structured event: log line, notification or progress.
    #[serde(rename = "agent-message")]
    AgentMessage {
        /// Emission ID.
        id: MessageId,
        /// Event payload, tagged by its own `type`.
        payload: AgentPayload,
        /// RFC 3339 creation time.
        timestamp: String,
    },
}

impl OutboundMessage {
    /// Returns the wire `type` of this message.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::RegisterAgent { .. } => super::REGISTER_AGENT,
            Self::HumanInputRequest(_) => super::HUMAN_INPUT_REQUEST,
            Self::MarkdownContent { .. } => super::MARKDOWN_CONTENT,
            Self::CodeContent { .. } => super::CODE_CONTENT,
            Self::ImageContent { .. } => super::IMAGE_CONTENT,
            Self::AgentMessage { .. } => super::AGENT_MESSAGE,
        }
    }

    /// Returns `true` for the handshake identity frame.
    ///
    /// This is the only frame allowed before the HUD acknowledges registration.
    #[inline]
    #[must_use]
    pub const fn is_registration(&self) -> bool {
        matches!(self, Self::RegisterAgent { .. })
    }
}

// ============================================================================
// InputRequestFrame
// ============================================================================

/// Body of a `human-input-request` frame.
///
/// # Format
///
/// ```json
/// {
///   "type": "human-input-request",
///   "requestId": "req_1700000000_9f2c...",
///   "message": "Approval needed: deploy",
///   "inputType": "approval",
///   "options": ["Approve", "Reject"],
///   "context": {},
///   "timeout": 300
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct InputRequestFrame {
    /// Correlation ID echoed back in the response.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// Prompt shown to the operator.
    pub message: String,

    /// Kind of input requested.
    #[serde(rename = "inputType")]
    pub input_type: InputKind,

    /// Choices offered to the operator (may be empty).
    pub options: Vec<String>,

    /// Extra context shown with the prompt (an object, `{}` when absent).
    pub context: Value,

    /// Operator-side timeout in whole seconds.
    pub timeout: u64,
}

impl InputRequestFrame {
    /// Builds a frame, normalizing a missing context to `{}`.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        message: impl Into<String>,
        input_type: InputKind,
        options: Vec<String>,
        context: Option<Value>,
        timeout: Duration,
    ) -> Self {
        Self {
            request_id,
            message: message.into(),
            input_type,
            options,
            context: context.unwrap_or_else(|| Value::Object(Map::new())),
            timeout: timeout.as_secs(),
        }
    }
}

// ============================================================================
// InputKind
// ============================================================================

/// Kind of human input a request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Free-form text.
    #[default]
    Text,
    /// Approve or reject an action.
    Approval,
    /// Pick one of the offered options.
    Choice,
    /// Confirm or cancel a critical action.
    Confirmation,
}

// ============================================================================
// Tests
// ============================================================================
