//! Extraction of the acting user and submitted credentials from a request.
//!
//! The username always comes from the transport's authenticated identity and the domain
//! from the host the request arrived on. Form fields only ever supply passwords.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::DomainPath;
use crate::{Error, Result};

/// Form field holding the new password.
pub const FIELD_PASSWORD: &str = "password";
/// Form field holding the new password confirmation.
pub const FIELD_PASSWORD_CONFIRM: &str = "password2";
/// Form field holding the current password.
pub const FIELD_OLD_PASSWORD: &str = "oldpassword";

/// Message used when no authenticated principal is present.
pub const NOT_LOGGED_IN_MESSAGE: &str = "you must be logged in to change the password";
/// Message used when the new password and its confirmation differ.
pub const PASSWORD_MISMATCH_MESSAGE: &str = "passwords do not match";

/// Surface a transport must expose for a password change request.
pub trait RequestSource {
    /// Identifier of the principal the transport authenticated, if any.
    fn authenticated_user(&self) -> Option<&str>;

    /// Host identifier the request was addressed to.
    fn host(&self) -> Option<&str>;

    /// Raw value of a submitted form field.
    fn form_field(&self, name: &str) -> Option<&str>;
}

/// In-memory request context filled in by the embedding transport.
#[derive(Debug, Default)]
pub struct RequestContext {
    remote_user: Option<String>,
    host: Option<String>,
    fields: HashMap<String, SecretString>,
}

impl RequestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the authenticated principal.
    #[must_use]
    pub fn with_remote_user(mut self, user: impl Into<String>) -> Self {
        self.remote_user = Some(user.into());
        self
    }

    /// Sets the host identifier.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Adds a submitted form field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .insert(name.into(), SecretString::from(value.into()));
        self
    }
}

impl RequestSource for RequestContext {
    fn authenticated_user(&self) -> Option<&str> {
        self.remote_user.as_deref()
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn form_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|value| value.expose_secret())
    }
}

/// Identity of the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    username: String,
    domain: DomainPath,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(username: impl Into<String>, domain: DomainPath) -> Self {
        Self {
            username: username.into(),
            domain,
        }
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Mailbox domain.
    #[must_use]
    pub const fn domain(&self) -> &DomainPath {
        &self.domain
    }
}

/// Everything needed to attempt a password change.
#[derive(Debug)]
pub struct PasswordChangeRequest {
    /// Acting user.
    pub principal: Principal,
    /// Current password, empty when not submitted.
    pub old_password: SecretString,
    /// Proposed password, empty when not submitted.
    pub new_password: SecretString,
}

impl PasswordChangeRequest {
    /// Returns true if a new password was submitted.
    ///
    /// A request without one only displays the form.
    #[must_use]
    pub fn is_change_attempt(&self) -> bool {
        !self.new_password.expose_secret().is_empty()
    }
}

/// Reads identity and credentials out of a [`RequestSource`].
pub struct IdentityContext<'a, R: RequestSource + ?Sized> {
    source: &'a R,
}

impl<'a, R: RequestSource + ?Sized> IdentityContext<'a, R> {
    /// Wraps a request source.
    #[must_use]
    pub const fn new(source: &'a R) -> Self {
        Self { source }
    }

    /// Returns the authenticated username.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationError`] if the transport supplied no principal.
    pub fn resolve_username(&self) -> Result<String> {
        self.source
            .authenticated_user()
            .filter(|user| !user.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| Error::AuthenticationError(NOT_LOGGED_IN_MESSAGE.to_string()))
    }

    /// Returns the domain of the request host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the transport supplied no host identifier.
    pub fn resolve_domain(&self) -> Result<DomainPath> {
        let host = self
            .source
            .host()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::ConfigError("host identifier is not set".to_string()))?;
        let domain = DomainPath::from_host(host);
        debug!(host, domain = %domain, "resolved mailbox domain");
        Ok(domain)
    }

    /// Returns the new password, or an empty secret if none was submitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the confirmation differs. A missing
    /// confirmation for a non-empty password counts as a mismatch.
    pub fn resolve_new_password(&self) -> Result<SecretString> {
        let Some(password) = self.source.form_field(FIELD_PASSWORD) else {
            return Ok(SecretString::from(String::new()));
        };

        let confirm = self.source.form_field(FIELD_PASSWORD_CONFIRM).unwrap_or_default();
        if password.as_bytes() != confirm.as_bytes() {
            return Err(Error::ValidationError(PASSWORD_MISMATCH_MESSAGE.to_string()));
        }

        Ok(SecretString::from(password.to_owned()))
    }

    /// Returns the old password, or an empty secret if none was submitted.
    #[must_use]
    pub fn resolve_old_password(&self) -> SecretString {
        SecretString::from(
            self.source
                .form_field(FIELD_OLD_PASSWORD)
                .unwrap_or_default()
                .to_owned(),
        )
    }

    /// Resolves username, domain, new password and old password in that order.
    ///
    /// # Errors
    ///
    /// Propagates the first failure; a missing principal stops before anything else is read.
    pub fn resolve(&self) -> Result<PasswordChangeRequest> {
        let username = self.resolve_username()?;
        let domain = self.resolve_domain()?;
        let new_password = self.resolve_new_password()?;
        let old_password = self.resolve_old_password();

        Ok(PasswordChangeRequest {
            principal: Principal::new(username, domain),
            old_password,
            new_password,
        })
    }
}
