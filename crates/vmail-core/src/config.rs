//! Configuration structures for the password change flow.
//!
//! The configuration is read once at process start and shared read-only between requests.

use crate::domain::DomainPath;
use crate::policy::{DEFAULT_MINIMUM_LENGTH, DEFAULT_MINIMUM_NON_ALPHABETIC};
use crate::Error;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Root domain configuration and password policy thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswdConfig {
    /// Domain whose `dc=` components terminate every mailbox DN (e.g. `example.com`)
    #[validate(custom(function = "validate_root_domain"))]
    #[serde(default = "default_root_domain")]
    pub root_domain: String,

    /// Password policy thresholds
    #[validate(nested)]
    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_root_domain() -> String {
    "example.com".to_string()
}

fn validate_root_domain(domain: &str) -> Result<(), ValidationError> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.trim().is_empty()) {
        return Err(ValidationError::new("root_domain"));
    }
    Ok(())
}

impl PasswdConfig {
    /// Create a configuration for the given root domain with the default policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the root domain has fewer than two labels or an empty label.
    pub fn new(root_domain: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            root_domain: root_domain.into(),
            policy: PolicyConfig::default(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set the password policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Labels of the root domain.
    #[must_use]
    pub fn root_domain_path(&self) -> DomainPath {
        DomainPath::from_domain(&self.root_domain)
    }
}

impl Default for PasswdConfig {
    fn default() -> Self {
        Self {
            root_domain: default_root_domain(),
            policy: PolicyConfig::default(),
        }
    }
}

/// Thresholds applied to new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PolicyConfig {
    /// Minimum length in characters
    #[validate(range(min = 1, max = 128))]
    #[serde(default = "default_minimum_length")]
    pub minimum_length: usize,

    /// Minimum number of characters that are not ASCII letters
    #[validate(range(max = 128))]
    #[serde(default = "default_minimum_non_alphabetic")]
    pub minimum_non_alphabetic: usize,
}

const fn default_minimum_length() -> usize {
    DEFAULT_MINIMUM_LENGTH
}

const fn default_minimum_non_alphabetic() -> usize {
    DEFAULT_MINIMUM_NON_ALPHABETIC
}

impl PolicyConfig {
    /// Create a policy configuration with defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            minimum_length: default_minimum_length(),
            minimum_non_alphabetic: default_minimum_non_alphabetic(),
        }
    }

    /// Set the minimum length.
    #[must_use]
    pub const fn with_minimum_length(mut self, length: usize) -> Self {
        self.minimum_length = length;
        self
    }

    /// Set the minimum number of non-alphabetic characters.
    #[must_use]
    pub const fn with_minimum_non_alphabetic(mut self, count: usize) -> Self {
        self.minimum_non_alphabetic = count;
        self
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new()
    }
}
