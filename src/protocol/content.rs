//! Rich content and agent event payloads.
//!
//! Content types ([`Markdown`], [`Code`], [`Image`]) are wrapped in
//! [`ContentData`], which adds the emitting agent's identity and a
//! timestamp. Event types ([`LogEntry`], [`Notification`], [`Progress`])
//! travel inside an `agent-message` as [`AgentPayload`].
//!
//! # Example
//!
//! ```ignore
//! use agent_hud::protocol::{Code, Notification, NotificationKind};
//!
//! let code = Code::new("fn main() {}").with_language("rust");
//! let note = Notification::new("Build", "Finished").with_kind(NotificationKind::Success);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::identifiers::AgentId;

// ============================================================================
// ContentData
// ============================================================================

/// The `data` object of a content frame.
///
/// Flattens the content fields next to the emitting agent's identity.
#[derive(Debug, Clone, Serialize)]
pub struct ContentData<T> {
    /// Content-specific fields.
    #[serde(flatten)]
    pub content: T,

    /// Assigned agent ID (null before registration).
    pub agent_id: Option<AgentId>,

    /// Agent display name.
    pub agent_name: String,

    /// RFC 3339 emission time.
    pub timestamp: String,
}

impl<T> ContentData<T> {
    /// Wraps content with the emitting agent's identity, stamped now.
    #[must_use]
    pub fn new(content: T, agent_id: Option<AgentId>, agent_name: impl Into<String>) -> Self {
        Self {
            content,
            agent_id,
            agent_name: agent_name.into(),
            timestamp: now_rfc3339(),
        }
    }
}

/// Returns the current UTC time in RFC 3339 with millisecond precision.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Markdown
// ============================================================================

/// Markdown document for rich display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Markdown {
    /// Markdown source.
    pub content: String,
    /// Display title.
    pub title: String,
    /// Additional metadata.
    pub metadata: Option<Value>,
}

impl Markdown {
    /// Creates markdown content with the default title.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: "Markdown Content".to_string(),
            metadata: None,
        }
    }

    /// Sets the display title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attaches metadata.
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// Code
// ============================================================================

/// Source code shown with syntax highlighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Code {
    /// Source text.
    pub content: String,
    /// Highlighting language.
    pub language: String,
    /// Display title; `"{Language} Code"` when unset.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

impl Code {
    /// Creates a Python code block.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            language: "python".to_string(),
            title: None,
            description: None,
        }
    }

    /// Sets the highlighting language.
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the display title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fills in the language-derived title if none was set.
    #[must_use]
    pub fn with_default_title(mut self) -> Self {
        if self.title.is_none() {
            self.title = Some(format!("{} Code", title_case(&self.language)));
        }
        self
    }
}

/// Uppercases the first letter of each word and lowercases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}

// ============================================================================
// Image
// ============================================================================

/// Image referenced by URL or embedded as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    /// Image URL or base64 data URL.
    pub content: String,
    /// Display title.
    pub title: String,
    /// Caption text.
    pub caption: Option<String>,
    /// Additional metadata.
    pub metadata: Option<Value>,
}

impl Image {
    /// Creates an image from a URL (including `data:` URLs).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`](crate::Error::Url) if `url` does not parse.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self::with_content(url.into()))
    }

    /// Creates an image from encoded PNG or JPEG bytes as a data URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`](crate::Error::Image) if the format is not
    /// recognized.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        let data_url = format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(bytes)
        );
        Ok(Self::with_content(data_url))
    }

    /// Reads an image file and embeds it as a data URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read,
    /// or [`Error::Image`](crate::Error::Image) if the format is unknown.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn with_content(content: String) -> Self {
        Self {
            content,
            title: "Image".to_string(),
            caption: None,
            metadata: None,
        }
    }

    /// Sets the display title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the caption.
    #[inline]
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Attaches metadata.
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// AgentPayload
// ============================================================================

/// Payload of an `agent-message` frame, tagged by its own `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AgentPayload {
    /// Log line.
    #[serde(rename = "emit_log")]
    Log(LogEntry),

    /// Toast notification.
    #[serde(rename = "emit_notification")]
    Notification(Notification),

    /// Progress update.
    #[serde(rename = "show_progress")]
    Progress(Progress),
}

// ============================================================================
// LogEntry
// ============================================================================

/// Severity of a HUD log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug detail.
    Debug,
    /// Informational.
    #[default]
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
    /// Success.
    Success,
}

/// Log line shown in the HUD's activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Log text.
    pub message: String,
    /// Severity.
    pub level: LogLevel,
    /// Origin; the agent name when unset.
    pub source: Option<String>,
    /// Additional context.
    pub context: Option<String>,
}

impl LogEntry {
    /// Creates an info-level log line.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: LogLevel::Info,
            source: None,
            context: None,
        }
    }

    /// Sets the severity.
    #[inline]
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the origin.
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets additional context.
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

// ============================================================================
// Notification
// ============================================================================

/// Visual style of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Informational.
    #[default]
    Info,
    /// Success.
    Success,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

/// Notification priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low.
    Low,
    /// Medium.
    #[default]
    Medium,
    /// High.
    High,
}

/// Notification toast.
///
/// The style is sent as `notificationType`: `type` already discriminates
/// the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Visual style.
    #[serde(rename = "notificationType")]
    pub kind: NotificationKind,
    /// Priority.
    pub priority: Priority,
}

impl Notification {
    /// Creates an info notification with medium priority.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Info,
            priority: Priority::Medium,
        }
    }

    /// Sets the visual style.
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the priority.
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress bar update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    /// Completed units.
    pub current: u64,
    /// Total units.
    pub total: u64,
    /// Status text.
    pub message: Option<String>,
    /// Operation name.
    pub operation: Option<String>,
}

impl Progress {
    /// Creates a progress update.
    #[must_use]
    pub const fn new(current: u64, total: u64) -> Self {
        Self {
            current,
            total,
            message: None,
            operation: None,
        }
    }

    /// Sets the status text.
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the operation name.
    #[inline]
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
