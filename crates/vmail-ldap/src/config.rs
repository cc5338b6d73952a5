//! Configuration for the LDAP directory holding mailbox credentials.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;
use vmail_core::Error;

/// Default directory endpoint.
pub const DEFAULT_LDAP_URL: &str = "ldap://127.0.0.1";
/// Default attribute holding the hashed password.
pub const DEFAULT_CREDENTIAL_ATTRIBUTE: &str = "userPassword";
/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// Configuration for connecting to the directory.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LdapConfig {
    #[validate(url)]
    #[serde(default = "default_url")]
    url: String,
    #[validate(length(min = 1))]
    #[serde(default = "default_credential_attribute")]
    credential_attribute: String,
    #[serde(default = "default_tls_verify")]
    tls_verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tls_ca_cert: Option<PathBuf>,
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    connection_timeout_secs: u64,
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    operation_timeout_secs: u64,
}

fn default_url() -> String {
    DEFAULT_LDAP_URL.to_string()
}

fn default_credential_attribute() -> String {
    DEFAULT_CREDENTIAL_ATTRIBUTE.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

impl LdapConfig {
    /// Creates a configuration for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or not an `ldap`, `ldaps` or `ldapi` URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let config = Self {
            url: url.into(),
            credential_attribute: default_credential_attribute(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        };
        config.check()?;
        Ok(config)
    }

    /// Validates field ranges and the endpoint scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        let url = Url::parse(&self.url)?;
        match url.scheme() {
            "ldap" | "ldaps" | "ldapi" => Ok(()),
            other => Err(Error::ConfigError(format!(
                "unsupported directory URL scheme `{other}`"
            ))),
        }
    }

    /// Returns the directory endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the attribute that stores the password hash.
    #[must_use]
    pub fn credential_attribute(&self) -> &str {
        &self.credential_attribute
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Overrides the credential attribute.
    #[must_use]
    pub fn with_credential_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.credential_attribute = attribute.into();
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            credential_attribute: default_credential_attribute(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_directory() {
        let config = LdapConfig::default();
        assert_eq!(config.url(), "ldap://127.0.0.1");
        assert_eq!(config.credential_attribute(), "userPassword");
        assert!(config.tls_verify());
        assert!(config.tls_ca_cert().is_none());
        assert!(config.check().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = LdapConfig::new("ldaps://ldap.example.com:636")
            .unwrap()
            .with_credential_attribute("mailPassword")
            .with_tls_ca_cert(PathBuf::from("/etc/ssl/ldap-ca.pem"))
            .with_connection_timeout_secs(20)
            .with_operation_timeout_secs(30)
            .with_tls_verification(false);

        assert_eq!(config.credential_attribute(), "mailPassword");
        assert_eq!(config.connection_timeout(), Duration::from_secs(20));
        assert_eq!(config.operation_timeout(), Duration::from_secs(30));
        assert!(!config.tls_verify());
        assert_eq!(
            config.tls_ca_cert(),
            Some(&PathBuf::from("/etc/ssl/ldap-ca.pem"))
        );
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(LdapConfig::new("not a url").is_err());
        assert!(matches!(
            LdapConfig::new("https://ldap.example.com"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_timeouts() {
        let config = LdapConfig::default().with_operation_timeout_secs(0);
        assert!(config.check().is_err());

        let config = LdapConfig::default().with_connection_timeout_secs(301);
        assert!(config.check().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: LdapConfig =
            serde_json::from_str(r#"{"url":"ldaps://ldap.example.com"}"#).unwrap();
        assert_eq!(config.url(), "ldaps://ldap.example.com");
        assert_eq!(config.credential_attribute(), "userPassword");
        assert_eq!(
            config.operation_timeout(),
            Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS)
        );
    }
}
