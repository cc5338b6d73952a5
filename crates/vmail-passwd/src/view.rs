//! What the presentation layer receives after a request.

use serde::Serialize;

/// Terminal state of one change password request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChangePasswordOutcome {
    /// No new password was submitted; only the form is shown.
    Idle,
    /// The directory accepted the new credential.
    Success,
    /// The change was refused or failed.
    Failure {
        /// Fixed, user-safe explanation
        message: String,
    },
}

/// Outcome plus the identity resolved for display.
///
/// Values are raw; escaping them for markup is the renderer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePasswordView {
    /// Result of the request.
    #[serde(flatten)]
    pub outcome: ChangePasswordOutcome,
    /// Authenticated username, when one was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Mailbox domain, when one was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl ChangePasswordView {
    /// Returns true if the password was changed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == ChangePasswordOutcome::Success
    }

    /// Failure message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ChangePasswordOutcome::Failure { message } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Link back to the main site of the mailbox domain.
    #[must_use]
    pub fn home_url(&self) -> Option<String> {
        self.domain.as_ref().map(|domain| format!("http://{domain}/"))
    }
}

impl Default for ChangePasswordView {
    fn default() -> Self {
        Self {
            outcome: ChangePasswordOutcome::Idle,
            username: None,
            domain: None,
        }
    }
}
