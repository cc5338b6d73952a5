//! Directory transaction that replaces a user's stored credential.

use crate::{config::LdapConfig, dn::DistinguishedName, Result};
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Mod};
use native_tls::{Certificate, TlsConnector};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use vmail_core::error::{DirectoryStep, Error};

/// LDAP protocol version negotiated on every connection.
pub const PROTOCOL_VERSION: u8 = 3;

/// Failure reported by the LDAP transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server or client library reported an error.
    #[error("{0}")]
    Ldap(String),
    /// The requested protocol version cannot be used.
    #[error("protocol version {0} is not supported")]
    UnsupportedVersion(u8),
    /// TLS could not be set up.
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// One open connection to the directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapSession: Send {
    /// Negotiates the protocol version.
    async fn set_protocol_version(&mut self, version: u8) -> TransportResult<()>;
    /// Authenticates the connection.
    async fn simple_bind(&mut self, dn: &str, password: &str) -> TransportResult<()>;
    /// Replaces all values of `attribute` on `dn` with `value`.
    async fn modify_replace(&mut self, dn: &str, attribute: &str, value: &str)
        -> TransportResult<()>;
    /// Releases the connection.
    async fn unbind(&mut self) -> TransportResult<()>;
}

/// Opens directory connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Opens a new, unauthenticated connection.
    async fn connect(&self) -> TransportResult<Box<dyn LdapSession>>;
}

/// Capability to replace a user's credential given their current one.
#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    /// Binds as `dn` with `old_password` and stores `new_encoded_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryError`] naming the step that failed.
    async fn change_credential(
        &self,
        dn: &DistinguishedName,
        old_password: &SecretString,
        new_encoded_hash: &str,
    ) -> Result<()>;
}

/// Performs connect, configure, bind, modify and close against the directory.
///
/// Every call opens its own connection. Once connected, the connection is closed exactly once
/// whatever happens in between; if an earlier step failed, that error is reported and a close
/// failure is only logged.
///
/// A close failure after a successful modify is reported as the operation's error even though
/// the directory may already hold the new credential.
pub struct DirectorySession {
    config: Arc<LdapConfig>,
    connector: Box<dyn LdapConnector>,
}

impl DirectorySession {
    /// Creates a session factory that uses the real LDAP connector.
    #[must_use]
    pub fn new(config: LdapConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector::new(config.clone()));
        Self { config, connector }
    }

    /// Creates a session factory over a custom connector.
    #[must_use]
    pub fn with_connector(config: LdapConfig, connector: Box<dyn LdapConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Returns the directory configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    async fn replace_credential(
        &self,
        session: &mut dyn LdapSession,
        dn: &DistinguishedName,
        old_password: &SecretString,
        new_encoded_hash: &str,
    ) -> Result<()> {
        self.execute_with_timeout(
            DirectoryStep::Configure,
            session.set_protocol_version(PROTOCOL_VERSION),
        )
        .await?;

        debug!(dn = %dn, "binding as user");
        self.execute_with_timeout(
            DirectoryStep::Bind,
            session.simple_bind(dn.as_str(), old_password.expose_secret()),
        )
        .await?;

        debug!(dn = %dn, attribute = self.config.credential_attribute(), "replacing credential");
        self.execute_with_timeout(
            DirectoryStep::Modify,
            session.modify_replace(
                dn.as_str(),
                self.config.credential_attribute(),
                new_encoded_hash,
            ),
        )
        .await
    }

    async fn execute_with_timeout<F, T>(&self, step: DirectoryStep, fut: F) -> Result<T>
    where
        F: Future<Output = TransportResult<T>>,
    {
        let limit = match step {
            DirectoryStep::Connect => self.config.connection_timeout(),
            _ => self.config.operation_timeout(),
        };
        timeout(limit, fut)
            .await
            .map_err(|_| Error::directory(step, format!("timed out after {}s", limit.as_secs())))?
            .map_err(|err| Error::directory(step, err.to_string()))
    }
}

#[async_trait]
impl CredentialDirectory for DirectorySession {
    async fn change_credential(
        &self,
        dn: &DistinguishedName,
        old_password: &SecretString,
        new_encoded_hash: &str,
    ) -> Result<()> {
        debug!(url = self.config.url(), "connecting to directory");
        let mut session = self
            .execute_with_timeout(DirectoryStep::Connect, self.connector.connect())
            .await?;

        let outcome = self
            .replace_credential(&mut *session, dn, old_password, new_encoded_hash)
            .await;
        let closed = self
            .execute_with_timeout(DirectoryStep::Close, session.unbind())
            .await;
        drop(session);

        match (outcome, closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!("directory close failed after earlier error: {close_err}");
                Err(err)
            }
            (Ok(()), Err(close_err)) => {
                warn!(dn = %dn, "directory close failed after modify; new credential may be in effect");
                Err(close_err)
            }
        }
    }
}

/// Real LDAP connector backed by `ldap3`.
pub struct RealLdapConnector {
    config: Arc<LdapConfig>,
}

impl RealLdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<LdapConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> TransportResult<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, self.config.url())
            .await
            .map_err(map_ldap_error)?;
        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                warn!("LDAP connection error: {err}");
            }
        });
        Ok(Box::new(RealLdapSession { inner: ldap }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn set_protocol_version(&mut self, version: u8) -> TransportResult<()> {
        // ldap3 only speaks LDAPv3
        if version == PROTOCOL_VERSION {
            Ok(())
        } else {
            Err(TransportError::UnsupportedVersion(version))
        }
    }

    async fn simple_bind(&mut self, dn: &str, password: &str) -> TransportResult<()> {
        self.inner
            .simple_bind(dn, password)
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(())
    }

    async fn modify_replace(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> TransportResult<()> {
        let mods = vec![Mod::Replace(
            attribute.to_string(),
            HashSet::from([value.to_string()]),
        )];
        self.inner
            .modify(dn, mods)
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(())
    }

    async fn unbind(&mut self) -> TransportResult<()> {
        self.inner.unbind().await.map_err(map_ldap_error)
    }
}

fn build_ldap_settings(config: &LdapConfig) -> TransportResult<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    if !config.tls_verify() {
        warn!("TLS verification disabled for directory connections");
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| TransportError::Tls(format!("failed to construct connector: {err}")))?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        debug!("loading directory CA certificate from {}", cert_path.display());
        let pem = fs::read(cert_path).map_err(|err| {
            TransportError::Tls(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| TransportError::Tls(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| TransportError::Tls(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

fn map_ldap_error(err: ldap3::LdapError) -> TransportError {
    TransportError::Ldap(err.to_string())
}
