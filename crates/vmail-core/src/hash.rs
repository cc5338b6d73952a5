//! Salted SHA-1 (`{SSHA}`) credential hashing.
//!
//! The stored value is `{SSHA}` followed by `base64(SHA1(password || salt) || salt)`, the
//! format OpenLDAP's `userPassword` understands.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use sha1::{Digest, Sha1};

/// Scheme tag prefixed to the stored hash.
pub const SSHA_SCHEME: &str = "{SSHA}";
/// Salt length in bytes.
pub const SALT_LEN: usize = 4;
/// SHA-1 digest length in bytes.
pub const DIGEST_LEN: usize = 20;

/// A password digest together with the salt it was computed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedHash {
    digest: [u8; DIGEST_LEN],
    salt: [u8; SALT_LEN],
}

impl SaltedHash {
    /// Digest bytes.
    #[must_use]
    pub const fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Salt bytes.
    #[must_use]
    pub const fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Base64 of `digest || salt`.
    #[must_use]
    pub fn encoded(&self) -> String {
        let mut bytes = Vec::with_capacity(DIGEST_LEN + SALT_LEN);
        bytes.extend_from_slice(&self.digest);
        bytes.extend_from_slice(&self.salt);
        STANDARD.encode(bytes)
    }

    /// Attribute value as written to the directory.
    #[must_use]
    pub fn to_stored(&self) -> String {
        format!("{SSHA_SCHEME}{}", self.encoded())
    }
}

/// Produces `{SSHA}` hashes with a fresh random salt per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHasher;

impl CredentialHasher {
    /// Creates a hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hashes the password with 4 bytes drawn from the thread-local CSPRNG.
    #[must_use]
    pub fn hash(&self, password: &str) -> SaltedHash {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill(&mut salt[..]);
        self.hash_with_salt(password, salt)
    }

    /// Hashes the password with the given salt.
    #[must_use]
    pub fn hash_with_salt(&self, password: &str, salt: [u8; SALT_LEN]) -> SaltedHash {
        let mut hasher = Sha1::new();
        hasher.update(password.as_bytes());
        hasher.update(salt);
        SaltedHash {
            digest: hasher.finalize().into(),
            salt,
        }
    }
}
