//! LDAP access for vmail password changes.
//!
//! This crate builds mailbox distinguished names and runs the bind-then-replace transaction
//! that swaps a user's stored `userPassword` for a new hash.

#![deny(missing_docs)]

mod config;
mod dn;
mod session;

pub use config::{
    LdapConfig, DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_CREDENTIAL_ATTRIBUTE, DEFAULT_LDAP_URL,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
pub use dn::{DistinguishedName, DistinguishedNameError, RelativeDistinguishedName};
pub use session::{
    CredentialDirectory, DirectorySession, LdapConnector, LdapSession, RealLdapConnector,
    TransportError, TransportResult, PROTOCOL_VERSION,
};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = vmail_core::Result<T>;
