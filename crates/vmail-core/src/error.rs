//! Error types for password change operations.
//!
//! Every failure the change flow can hit maps onto one variant of [`Error`]. Variants carry
//! enough detail for logs, while [`Error::user_message`] gives the fixed phrasing that is safe
//! to show to the end user.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::policy::PolicyViolation;

/// Message shown for any directory failure, whatever step failed.
pub const CHANGE_FAILED_MESSAGE: &str = "your password could not be changed";

/// Message shown when the service itself is misdeployed.
pub const UNAVAILABLE_MESSAGE: &str = "the password service is temporarily unavailable";

/// Step of the directory transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryStep {
    /// Opening the connection.
    Connect,
    /// Negotiating the protocol version.
    Configure,
    /// Authenticating as the user with the old password.
    Bind,
    /// Replacing the credential attribute.
    Modify,
    /// Releasing the connection.
    Close,
}

impl DirectoryStep {
    /// Returns the step name as used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Configure => "configure",
            Self::Bind => "bind",
            Self::Modify => "modify",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for DirectoryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for password change operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or the transport did not supply required context
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No authenticated principal is attached to the request
    #[error("Authentication required: {0}")]
    AuthenticationError(String),

    /// Submitted form fields are inconsistent
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The proposed password does not satisfy the policy
    #[error("Password policy violation: {0}")]
    PolicyError(PolicyViolation),

    /// A directory protocol step failed
    #[error("Directory {step} failed: {message}")]
    DirectoryError {
        /// Step that failed
        step: DirectoryStep,
        /// Underlying transport message
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for password change operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a directory error for the given step.
    #[must_use]
    pub fn directory(step: DirectoryStep, message: impl Into<String>) -> Self {
        Self::DirectoryError {
            step,
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::AuthenticationError(_) => "AUTHENTICATION_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::PolicyError(PolicyViolation::TooShort { .. }) => "POLICY_TOO_SHORT",
            Self::PolicyError(PolicyViolation::TooFewNonAlphabetic { .. }) => {
                "POLICY_TOO_FEW_NON_ALPHABETIC"
            }
            Self::DirectoryError { .. } => "DIRECTORY_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message that may be shown to the end user.
    ///
    /// Directory and configuration failures collapse to fixed strings so that transport
    /// details never reach the page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationError(message) | Self::ValidationError(message) => {
                message.clone()
            }
            Self::PolicyError(violation) => violation.to_string(),
            Self::DirectoryError { .. } => CHANGE_FAILED_MESSAGE.to_string(),
            Self::ConfigError(_) | Self::InternalError(_) => UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InternalError(_) | Self::ConfigError(_) | Self::DirectoryError { .. }
        )
    }
}

impl From<PolicyViolation> for Error {
    fn from(violation: PolicyViolation) -> Self {
        Self::PolicyError(violation)
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid directory URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(format!("malformed configuration: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(format!("invalid configuration: {err}"))
    }
}
