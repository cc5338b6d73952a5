//! Strength rules for proposed passwords.

use serde::Serialize;
use thiserror::Error;

use crate::config::PolicyConfig;

/// Default minimum password length, in characters.
pub const DEFAULT_MINIMUM_LENGTH: usize = 6;
/// Default minimum number of characters that are not ASCII letters.
pub const DEFAULT_MINIMUM_NON_ALPHABETIC: usize = 1;

/// Reason a proposed password was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// The password has fewer characters than required.
    #[error("password must have at least {minimum} characters")]
    TooShort {
        /// Required length
        minimum: usize,
    },
    /// The password has too few characters outside `A-Z` / `a-z`.
    #[error("password must contain at least {minimum} non-alphabetical characters")]
    TooFewNonAlphabetic {
        /// Required count
        minimum: usize,
    },
}

/// Validates new passwords against length and character-class thresholds.
///
/// Only the new password of a change is ever checked; the old one is whatever the directory
/// already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    minimum_length: usize,
    minimum_non_alphabetic: usize,
}

impl PasswordPolicy {
    /// Creates a policy with explicit thresholds.
    #[must_use]
    pub const fn new(minimum_length: usize, minimum_non_alphabetic: usize) -> Self {
        Self {
            minimum_length,
            minimum_non_alphabetic,
        }
    }

    /// Creates a policy from configuration.
    #[must_use]
    pub const fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.minimum_length, config.minimum_non_alphabetic)
    }

    /// Minimum length in characters.
    #[must_use]
    pub const fn minimum_length(&self) -> usize {
        self.minimum_length
    }

    /// Minimum number of non-alphabetic characters.
    #[must_use]
    pub const fn minimum_non_alphabetic(&self) -> usize {
        self.minimum_non_alphabetic
    }

    /// Checks the password, length first.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyViolation::TooShort`] or [`PolicyViolation::TooFewNonAlphabetic`].
    pub fn validate(&self, password: &str) -> Result<(), PolicyViolation> {
        if password.chars().count() < self.minimum_length {
            return Err(PolicyViolation::TooShort {
                minimum: self.minimum_length,
            });
        }

        let non_alphabetic = password
            .chars()
            .filter(|ch| !ch.is_ascii_alphabetic())
            .count();
        if non_alphabetic < self.minimum_non_alphabetic {
            return Err(PolicyViolation::TooFewNonAlphabetic {
                minimum: self.minimum_non_alphabetic,
            });
        }

        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_LENGTH, DEFAULT_MINIMUM_NON_ALPHABETIC)
    }
}
