//! Correlated human-input requests.
//!
//! Every request gets a fresh [`RequestId`], is registered in the pending
//! table before its frame is written, and waits on its own one-shot for
//! the operator timeout plus a grace period. The derived operations below
//! are thin wrappers that fix the prompt, kind and options and interpret
//! the answer.
//!
//! | Operation | Kind | Options | Result |
//! |-----------|------|---------|--------|
//! | [`Session::request_approval`] | approval | Approve / Reject | `bool` |
//! | [`Session::request_choice`] | choice | caller's | `Option<String>` |
//! | [`Session::request_context`] | text | none | `Option<String>` |
//! | [`Session::confirm_action`] | confirmation | Confirm / Cancel | `bool` |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::Result;
use crate::identifiers::RequestId;
use crate::protocol::{HumanInputResponse, InputKind, InputRequestFrame, OutboundMessage};

use super::core::Session;

// ============================================================================
// Constants
// ============================================================================

const APPROVAL_OPTIONS: [&str; 2] = ["Approve", "Reject"];
const APPROVAL_ACCEPTED: [&str; 4] = ["approve", "approved", "yes", "y"];

const CONFIRM_OPTIONS: [&str; 2] = ["Confirm", "Cancel"];
const CONFIRM_ACCEPTED: [&str; 4] = ["confirm", "confirmed", "yes", "ok"];

// ============================================================================
// HumanInputRequest
// ============================================================================

/// A prompt for the operator.
///
/// # Example
///
/// ```ignore
/// let request = HumanInputRequest::new("Which region?")
///     .with_kind(InputKind::Choice)
///     .with_options(["us-east", "eu-west"])
///     .with_timeout(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HumanInputRequest {
    /// Prompt text.
    pub message: String,
    /// Kind of input requested.
    pub kind: InputKind,
    /// Choices offered (may be empty).
    pub options: Vec<String>,
    /// Extra context shown with the prompt.
    pub context: Option<Value>,
    /// Operator timeout; the session default when `None`.
    pub timeout: Option<Duration>,
}

impl HumanInputRequest {
    /// Creates a free-text request.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: InputKind::Text,
            options: Vec::new(),
            context: None,
            timeout: None,
        }
    }

    /// Sets the input kind.
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the offered options.
    #[inline]
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the context object.
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the context if given.
    #[inline]
    #[must_use]
    pub fn with_optional_context(mut self, context: Option<Value>) -> Self {
        self.context = context;
        self
    }

    /// Sets the operator timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ============================================================================
// InputOutcome
// ============================================================================

/// Terminal outcome of a correlated request.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// The operator answered.
    Answered(HumanInputResponse),
    /// Nobody answered in time, locally or on the HUD side.
    TimedOut {
        /// The expired request.
        request_id: RequestId,
    },
}

impl InputOutcome {
    /// Returns `true` if the request timed out.
    #[inline]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::Answered(response) => &response.request_id,
            Self::TimedOut { request_id } => request_id,
        }
    }

    /// Returns the answer text, if answered with one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Answered(response) => response.response.as_deref(),
            Self::TimedOut { .. } => None,
        }
    }

    /// Consumes the outcome, returning the answer text.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Answered(response) => response.response,
            Self::TimedOut { .. } => None,
        }
    }

    /// Returns `true` if the answer matches one of `accepted`, ignoring case
    /// and surrounding whitespace.
    #[must_use]
    pub fn is_affirmative(&self, accepted: &[&str]) -> bool {
        self.text().is_some_and(|text| {
            let text = text.trim();
            accepted.iter().any(|word| text.eq_ignore_ascii_case(word))
        })
    }
}

// ============================================================================
// Session: Correlated Requests
// ============================================================================

impl Session {
    /// Asks the operator for input and waits for the answer.
    ///
    /// Waits at most the request's timeout plus the configured grace. A
    /// timeout is an outcome, not an error. Dropping the returned future
    /// withdraws the request from the pending table.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`](crate::Error::NotConnected) if the session is not ready
    /// - [`Error::SendFailed`](crate::Error::SendFailed) if the request frame cannot be written
    pub async fn request_human_input(&self, request: HumanInputRequest) -> Result<InputOutcome> {
        let connection = self.ready_connection()?;
        let operator_timeout = request.timeout.unwrap_or(self.config().request_timeout);
        let request_id = RequestId::generate();

        let frame = InputRequestFrame::new(
            request_id.clone(),
            request.message,
            request.kind,
            request.options,
            request.context,
            operator_timeout,
        );

        let (_guard, response_rx) = self.pending_table().register(frame.clone());
        connection
            .send(&OutboundMessage::HumanInputRequest(frame))
            .await?;
        info!(request_id = %request_id, kind = ?request.kind, "Sent human input request");

        let wait = operator_timeout.saturating_add(self.config().response_grace);
        let outcome = match timeout(wait, response_rx).await {
            Ok(Ok(response)) if response.is_timeout() => {
                info!(request_id = %request_id, "HUD reported request timeout");
                InputOutcome::TimedOut { request_id }
            }
            Ok(Ok(response)) => {
                info!(request_id = %request_id, "Received human input response");
                InputOutcome::Answered(response)
            }
            Ok(Err(_)) => {
                warn!(request_id = %request_id, "Request withdrawn before response");
                InputOutcome::TimedOut { request_id }
            }
            Err(_) => {
                warn!(
                    request_id = %request_id,
                    timeout_secs = operator_timeout.as_secs(),
                    "Human input request timed out"
                );
                InputOutcome::TimedOut { request_id }
            }
        };

        Ok(outcome)
    }

    // ========================================================================
    // Derived Operations
    // ========================================================================

    /// Asks the operator to approve an action.
    ///
    /// Returns `true` only for an affirmative answer; timeout reads as `false`.
    ///
    /// # Errors
    ///
    /// Same as [`request_human_input`](Self::request_human_input).
    pub async fn request_approval(
        &self,
        action: &str,
        context: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let request = HumanInputRequest::new(format!("Approval needed: {action}"))
            .with_kind(InputKind::Approval)
            .with_options(APPROVAL_OPTIONS)
            .with_optional_context(context);

        let outcome = self.request_human_input(with_timeout(request, timeout)).await?;
        Ok(outcome.is_affirmative(&APPROVAL_ACCEPTED))
    }

    /// Asks the operator to pick one of `choices`.
    ///
    /// Returns the answer text, or `None` on timeout.
    ///
    /// # Errors
    ///
    /// Same as [`request_human_input`](Self::request_human_input).
    pub async fn request_choice<I, S>(
        &self,
        question: &str,
        choices: I,
        context: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = HumanInputRequest::new(question)
            .with_kind(InputKind::Choice)
            .with_options(choices)
            .with_optional_context(context);

        let outcome = self.request_human_input(with_timeout(request, timeout)).await?;
        Ok(outcome.into_text())
    }

    /// Asks the operator for clarifying text.
    ///
    /// # Errors
    ///
    /// Same as [`request_human_input`](Self::request_human_input).
    pub async fn request_context(
        &self,
        query: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<String>> {
        let request = HumanInputRequest::new(format!("Need clarification: {query}"));

        let outcome = self.request_human_input(with_timeout(request, timeout)).await?;
        Ok(outcome.into_text())
    }

    /// Asks the operator to confirm a critical action.
    ///
    /// `details` is shown under `action_details`. Timeout reads as `false`.
    ///
    /// # Errors
    ///
    /// Same as [`request_human_input`](Self::request_human_input).
    pub async fn confirm_action(
        &self,
        description: &str,
        details: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let request = HumanInputRequest::new(format!("Confirm action: {description}"))
            .with_kind(InputKind::Confirmation)
            .with_options(CONFIRM_OPTIONS)
            .with_optional_context(details.map(|d| json!({ "action_details": d })));

        let outcome = self.request_human_input(with_timeout(request, timeout)).await?;
        Ok(outcome.is_affirmative(&CONFIRM_ACCEPTED))
    }
}

fn with_timeout(request: HumanInputRequest, timeout: Option<Duration>) -> HumanInputRequest {
    match timeout {
        Some(timeout) => request.with_timeout(timeout),
        None => request,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    fn answered(text: Option<&str>) -> InputOutcome {
        InputOutcome::Answered(HumanInputResponse {
            request_id: RequestId::new("r"),
            response: text.map(str::to_owned),
            timeout: None,
            additional_context: None,
            timestamp: None,
        })
    }

    #[test]
    fn test_approval_interpretation() {
        for text in ["Approve", "approved", "YES", "y", " yes "] {
            assert!(answered(Some(text)).is_affirmative(&APPROVAL_ACCEPTED), "{text}");
        }
        for text in ["Reject", "no", "approve it", ""] {
            assert!(!answered(Some(text)).is_affirmative(&APPROVAL_ACCEPTED), "{text}");
        }
        assert!(!answered(None).is_affirmative(&APPROVAL_ACCEPTED));
    }

    #[test]
    fn test_confirm_interpretation() {
        for text in ["Confirm", "confirmed", "Yes", "OK"] {
            assert!(answered(Some(text)).is_affirmative(&CONFIRM_ACCEPTED), "{text}");
        }
        assert!(!answered(Some("Cancel")).is_affirmative(&CONFIRM_ACCEPTED));
        assert!(!answered(Some("y")).is_affirmative(&CONFIRM_ACCEPTED));
    }

    #[test]
    fn test_timed_out_outcome() {
        let outcome = InputOutcome::TimedOut {
            request_id: RequestId::new("req_1_x"),
        };
        assert!(outcome.is_timeout());
        assert_eq!(outcome.request_id().as_str(), "req_1_x");
        assert_eq!(outcome.text(), None);
        assert!(!outcome.is_affirmative(&APPROVAL_ACCEPTED));
        assert_eq!(outcome.into_text(), None);
    }

    #[test]
    fn test_request_builder() {
        let request = HumanInputRequest::new("Which region?")
            .with_kind(InputKind::Choice)
            .with_options(["us-east", "eu-west"])
            .with_context(json!({"service": "api"}))
            .with_timeout(Duration::from_secs(60));

        assert_eq!(request.kind, InputKind::Choice);
        assert_eq!(request.options, vec!["us-east", "eu-west"]);
        assert_eq!(request.context, Some(json!({"service": "api"})));
        assert_eq!(request.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_default_request_is_text_without_timeout() {
        let request = HumanInputRequest::new("Anything else?");
        assert_eq!(request.kind, InputKind::Text);
        assert!(request.options.is_empty());
        assert_eq!(request.timeout, None);
    }

    #[tokio::test]
    async fn test_request_requires_ready_session() {
        let session = Session::builder().build().expect("build");

        let err = session
            .request_human_input(HumanInputRequest::new("hello?"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        assert!(matches!(
            session.request_approval("deploy", None, None).await,
            Err(Error::NotConnected)
        ));
        assert_eq!(session.pending_count(), 0);
    }
}
