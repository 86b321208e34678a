//! One-way emissions: rich content and structured events.
//!
//! Emissions require a ready session. Each returns a fresh [`MessageId`];
//! failures are logged and returned so callers may ignore them.

// ============================================================================
// Imports
// ============================================================================

use tracing::{trace, warn};

use crate::error::Result;
use crate::identifiers::MessageId;
use crate::protocol::content::now_rfc3339;
use crate::protocol::{
    AgentPayload, Code, ContentData, Image, LogEntry, Markdown, Notification, OutboundMessage,
    Progress,
};

use super::core::Session;

// ============================================================================
// Session: Emissions
// ============================================================================

impl Session {
    /// Displays markdown in the HUD.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`](crate::Error::NotConnected) or
    /// [`Error::SendFailed`](crate::Error::SendFailed).
    pub async fn emit_markdown(&self, markdown: Markdown) -> Result<MessageId> {
        let data = self.wrap(markdown);
        self.emit(OutboundMessage::MarkdownContent { data }).await
    }

    /// Displays syntax-highlighted code.
    ///
    /// Titles left unset become `"{Language} Code"`.
    ///
    /// # Errors
    ///
    /// Same as [`emit_markdown`](Self::emit_markdown).
    pub async fn emit_code(&self, code: Code) -> Result<MessageId> {
        let data = self.wrap(code.with_default_title());
        self.emit(OutboundMessage::CodeContent { data }).await
    }

    /// Displays an image by URL or data URL.
    ///
    /// # Errors
    ///
    /// Same as [`emit_markdown`](Self::emit_markdown).
    pub async fn emit_image(&self, image: Image) -> Result<MessageId> {
        let data = self.wrap(image);
        self.emit(OutboundMessage::ImageContent { data }).await
    }

    /// Appends a line to the HUD's agent log.
    ///
    /// The source defaults to the agent name.
    ///
    /// # Errors
    ///
    /// Same as [`emit_markdown`](Self::emit_markdown).
    pub async fn emit_log(&self, mut entry: LogEntry) -> Result<MessageId> {
        if entry.source.is_none() {
            entry.source = Some(self.name().to_owned());
        }
        self.emit_event(AgentPayload::Log(entry)).await
    }

    /// Shows a toast notification.
    ///
    /// # Errors
    ///
    /// Same as [`emit_markdown`](Self::emit_markdown).
    pub async fn emit_notification(&self, notification: Notification) -> Result<MessageId> {
        self.emit_event(AgentPayload::Notification(notification))
            .await
    }

    /// Updates the HUD's progress indicator.
    ///
    /// # Errors
    ///
    /// Same as [`emit_markdown`](Self::emit_markdown).
    pub async fn show_progress(&self, progress: Progress) -> Result<MessageId> {
        self.emit_event(AgentPayload::Progress(progress)).await
    }

    fn wrap<T>(&self, content: T) -> ContentData<T> {
        ContentData::new(content, self.agent_id(), self.name())
    }

    async fn emit_event(&self, payload: AgentPayload) -> Result<MessageId> {
        let id = MessageId::generate();
        let message = OutboundMessage::AgentMessage {
            id,
            payload,
            timestamp: now_rfc3339(),
        };
        self.deliver(&message).await?;
        Ok(id)
    }

    async fn emit(&self, message: OutboundMessage) -> Result<MessageId> {
        self.deliver(&message).await?;
        Ok(MessageId::generate())
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<()> {
        let message_type = message.message_type();
        let connection = self.ready_connection().inspect_err(|e| {
            warn!(message_type, error = %e, "Emission dropped");
        })?;

        connection.send(message).await.inspect_err(|e| {
            warn!(message_type, error = %e, "Emission failed");
        })?;
        trace!(message_type, "Emitted");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
