//! HUD wire protocol message types.
//!
//! This module defines the JSON frames exchanged between the agent (Rust)
//! and the Agent HUD desktop application over WebSocket.
//!
//! # Protocol Overview
//!
//! Every frame is a JSON object with a `type` discriminant:
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `register-agent` | Agent → HUD | Handshake identity |
//! | `registration-ack` | HUD → Agent | Completes handshake, carries `agentId` |
//! | `human-input-request` | Agent → HUD | Correlated request |
//! | `human-input-response` | HUD → Agent | Correlated response |
//! | `markdown-content` / `code-content` / `image-content` | Agent → HUD | Rich content |
//! | `agent-message` | Agent → HUD | Log, notification, progress events |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `content` | Rich content and event payloads |
//! | `inbound` | Frames received from the HUD |
//! | `outbound` | Frames sent to the HUD |

// ============================================================================
// Submodules
// ============================================================================

/// Rich content and agent event payloads.
pub mod content;

/// Frames received from the HUD.
pub mod inbound;

/// Frames sent to the HUD.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use content::{
    AgentPayload, Code, ContentData, Image, LogEntry, LogLevel, Markdown, Notification,
    NotificationKind, Priority, Progress,
};
pub use inbound::{HumanInputResponse, InboundMessage, RegistrationAck};
pub use outbound::{InputKind, InputRequestFrame, OutboundMessage};

// ============================================================================
// Message Types
// ============================================================================

/// Wire `type` of the handshake identity frame.
pub const REGISTER_AGENT: &str = "register-agent";

/// Wire `type` of the handshake acknowledgment.
pub const REGISTRATION_ACK: &str = "registration-ack";

/// Wire `type` of a correlated request.
pub const HUMAN_INPUT_REQUEST: &str = "human-input-request";

/// Wire `type` of a correlated response.
pub const HUMAN_INPUT_RESPONSE: &str = "human-input-response";

/// Wire `type` of markdown content.
pub const MARKDOWN_CONTENT: &str = "markdown-content";

/// Wire `type` of code content.
pub const CODE_CONTENT: &str = "code-content";

/// Wire `type` of image content.
pub const IMAGE_CONTENT: &str = "image-content";

/// Wire `type` of structured agent events.
pub const AGENT_MESSAGE: &str = "agent-message";
