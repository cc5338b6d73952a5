//! Process-wide configuration loaded once at start-up.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use validator::Validate;
use vmail_core::config::PasswdConfig;
use vmail_core::{Error, Result};
use vmail_ldap::LdapConfig;

/// Everything a password change service needs to start.
///
/// ```json
/// {
///   "passwd": { "root_domain": "example.com", "policy": { "minimum_length": 8 } },
///   "directory": { "url": "ldaps://ldap.example.com" }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// Root domain and password policy
    #[validate(nested)]
    #[serde(default)]
    pub passwd: PasswdConfig,

    /// Directory endpoint
    #[serde(default)]
    pub directory: LdapConfig,
}

impl Settings {
    /// Parses and validates settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.check()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| {
            Error::ConfigError(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.directory.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = Settings::from_json_str("{}").unwrap();
        assert_eq!(settings.passwd.root_domain, "example.com");
        assert_eq!(settings.passwd.policy.minimum_length, 6);
        assert_eq!(settings.directory.url(), "ldap://127.0.0.1");
    }

    #[test]
    fn overrides_are_applied() {
        let settings = Settings::from_json_str(
            r#"{
                "passwd": {"root_domain": "mail.test", "policy": {"minimum_non_alphabetic": 2}},
                "directory": {"url": "ldaps://ldap.mail.test", "credential_attribute": "mailPassword"}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.passwd.root_domain, "mail.test");
        assert_eq!(settings.passwd.policy.minimum_non_alphabetic, 2);
        assert_eq!(settings.directory.url(), "ldaps://ldap.mail.test");
        assert_eq!(settings.directory.credential_attribute(), "mailPassword");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for json in [
            r#"{"passwd": {"root_domain": "localhost"}}"#,
            r#"{"passwd": {"policy": {"minimum_length": 0}}}"#,
            r#"{"directory": {"url": "http://ldap.example.com"}}"#,
            r#"{"directory": {"operation_timeout_secs": 0}}"#,
            "not json",
        ] {
            assert!(
                matches!(Settings::from_json_str(json), Err(Error::ConfigError(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = Settings::from_file("/nonexistent/vmail-passwd.json").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
