//! The "change my password" operation.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vmail_core::config::PasswdConfig;
use vmail_core::domain::DomainPath;
use vmail_core::hash::CredentialHasher;
use vmail_core::identity::{IdentityContext, Principal, RequestSource};
use vmail_core::policy::PasswordPolicy;
use vmail_core::{Error, Result};
use vmail_ldap::{CredentialDirectory, DirectorySession, DistinguishedName};

use crate::settings::Settings;
use crate::view::{ChangePasswordOutcome, ChangePasswordView};

/// Validates, hashes and stores a user's new password.
///
/// A request without a new password ends idle. Otherwise the password goes through the
/// policy, is hashed, and the directory transaction runs. Every error is turned into a
/// failure outcome carrying a user-safe message.
pub struct ChangePasswordUseCase {
    config: Arc<PasswdConfig>,
    root_domain: DomainPath,
    policy: PasswordPolicy,
    hasher: CredentialHasher,
    directory: Arc<dyn CredentialDirectory>,
}

impl ChangePasswordUseCase {
    /// Creates the use case over an arbitrary directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn new(config: PasswdConfig, directory: Arc<dyn CredentialDirectory>) -> Result<Self> {
        validator::Validate::validate(&config)?;

        Ok(Self {
            root_domain: config.root_domain_path(),
            policy: PasswordPolicy::from_config(&config.policy),
            hasher: CredentialHasher::new(),
            config: Arc::new(config),
            directory,
        })
    }

    /// Creates the use case talking to the LDAP directory described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the settings are invalid.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.check()?;
        let directory = Arc::new(DirectorySession::new(settings.directory));
        Self::new(settings.passwd, directory)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PasswdConfig {
        &self.config
    }

    /// Handles one request end to end.
    pub async fn execute<R>(&self, request: &R) -> ChangePasswordView
    where
        R: RequestSource + Sync + ?Sized,
    {
        let mut view = ChangePasswordView::default();
        let result = self.run(request, &mut view).await;
        view.outcome = match result {
            Ok(true) => ChangePasswordOutcome::Success,
            Ok(false) => ChangePasswordOutcome::Idle,
            Err(err) => {
                log_failure(&err, &view);
                ChangePasswordOutcome::Failure {
                    message: err.user_message(),
                }
            }
        };
        view
    }

    /// Checks, hashes and stores `new_password` for `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyError`] if the password is too weak, or
    /// [`Error::DirectoryError`] if the directory transaction fails.
    pub async fn change_password(
        &self,
        principal: &Principal,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<()> {
        self.policy.validate(new_password.expose_secret())?;

        let dn = DistinguishedName::for_mailbox(
            principal.username(),
            principal.domain(),
            &self.root_domain,
        )?;
        let hash = self.hasher.hash(new_password.expose_secret());

        self.directory
            .change_credential(&dn, old_password, &hash.to_stored())
            .await
    }

    async fn run<R>(&self, request: &R, view: &mut ChangePasswordView) -> Result<bool>
    where
        R: RequestSource + Sync + ?Sized,
    {
        let identity = IdentityContext::new(request);

        let username = identity.resolve_username()?;
        view.username = Some(username.clone());
        let domain = identity.resolve_domain()?;
        view.domain = Some(domain.to_string());

        let new_password = identity.resolve_new_password()?;
        let old_password = identity.resolve_old_password();
        if new_password.expose_secret().is_empty() {
            debug!(user = %username, "no new password submitted");
            return Ok(false);
        }

        let principal = Principal::new(username, domain);
        self.change_password(&principal, &old_password, &new_password)
            .await?;
        info!(
            user = principal.username(),
            domain = %principal.domain(),
            "password changed"
        );
        Ok(true)
    }
}

fn log_failure(err: &Error, view: &ChangePasswordView) {
    let user = view.username.as_deref().unwrap_or("-");
    let domain = view.domain.as_deref().unwrap_or("-");
    match err {
        Error::DirectoryError { step, message } => {
            warn!(user, domain, %step, "password change failed: {message}");
        }
        _ if err.should_log() => error!(user, domain, code = err.error_code(), "{err}"),
        _ => debug!(user, domain, code = err.error_code(), "password change refused: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use vmail_core::error::{DirectoryStep, CHANGE_FAILED_MESSAGE, UNAVAILABLE_MESSAGE};
    use vmail_core::hash::SSHA_SCHEME;
    use vmail_core::identity::{
        RequestContext, FIELD_OLD_PASSWORD, FIELD_PASSWORD, FIELD_PASSWORD_CONFIRM,
        NOT_LOGGED_IN_MESSAGE, PASSWORD_MISMATCH_MESSAGE,
    };

    mock! {
        Directory {}

        #[async_trait]
        impl CredentialDirectory for Directory {
            async fn change_credential(
                &self,
                dn: &DistinguishedName,
                old_password: &SecretString,
                new_encoded_hash: &str,
            ) -> Result<()>;
        }
    }

    fn use_case(directory: MockDirectory) -> ChangePasswordUseCase {
        ChangePasswordUseCase::new(
            PasswdConfig::new("vmail.org").unwrap(),
            Arc::new(directory),
        )
        .unwrap()
    }

    fn change_request(new: &str, confirm: &str) -> RequestContext {
        RequestContext::new()
            .with_remote_user("alice")
            .with_host("webmail.example.com")
            .with_field(FIELD_OLD_PASSWORD, "old-pass1")
            .with_field(FIELD_PASSWORD, new)
            .with_field(FIELD_PASSWORD_CONFIRM, confirm)
    }

    #[tokio::test]
    async fn successful_change() {
        let mut directory = MockDirectory::new();
        directory
            .expect_change_credential()
            .withf(|dn, old, hash| {
                dn.as_str() == "uid=alice,ou=people,dc=example,dc=com,ou=vmail,dc=vmail,dc=org"
                    && old.expose_secret() == "old-pass1"
                    && hash.starts_with(SSHA_SCHEME)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let view = use_case(directory)
            .execute(&change_request("Secret1", "Secret1"))
            .await;

        assert_eq!(view.outcome, ChangePasswordOutcome::Success);
        assert_eq!(view.username.as_deref(), Some("alice"));
        assert_eq!(view.domain.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn mismatched_confirmation_never_reaches_directory() {
        let mut directory = MockDirectory::new();
        directory.expect_change_credential().never();

        let view = use_case(directory)
            .execute(&change_request("Secret1", "Secret2"))
            .await;

        assert_eq!(view.error_message(), Some(PASSWORD_MISMATCH_MESSAGE));
        assert_eq!(view.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn no_password_field_is_idle() {
        let mut directory = MockDirectory::new();
        directory.expect_change_credential().never();

        let request = RequestContext::new()
            .with_remote_user("alice")
            .with_host("example.com");
        let view = use_case(directory).execute(&request).await;

        assert_eq!(view.outcome, ChangePasswordOutcome::Idle);
        assert_eq!(view.domain.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn empty_password_is_idle_without_policy_check() {
        let mut directory = MockDirectory::new();
        directory.expect_change_credential().never();

        let view = use_case(directory).execute(&change_request("", "")).await;
        assert_eq!(view.outcome, ChangePasswordOutcome::Idle);
    }

    #[tokio::test]
    async fn weak_password_is_rejected_before_directory() {
        let mut directory = MockDirectory::new();
        directory.expect_change_credential().never();
        let use_case = use_case(directory);

        let view = use_case.execute(&change_request("abc1", "abc1")).await;
        assert_eq!(
            view.error_message(),
            Some("password must have at least 6 characters")
        );

        let view = use_case.execute(&change_request("letters", "letters")).await;
        assert_eq!(
            view.error_message(),
            Some("password must contain at least 1 non-alphabetical characters")
        );
    }

    #[tokio::test]
    async fn unauthenticated_request_is_refused() {
        let mut directory = MockDirectory::new();
        directory.expect_change_credential().never();

        let request = RequestContext::new()
            .with_host("example.com")
            .with_field(FIELD_PASSWORD, "Secret1")
            .with_field(FIELD_PASSWORD_CONFIRM, "Secret1");
        let view = use_case(directory).execute(&request).await;

        assert_eq!(view.error_message(), Some(NOT_LOGGED_IN_MESSAGE));
        assert!(view.username.is_none());
        assert!(view.domain.is_none());
    }

    #[tokio::test]
    async fn missing_host_fails_without_leaking_details() {
        let mut directory = MockDirectory::new();
        directory.expect_change_credential().never();

        let request = RequestContext::new()
            .with_remote_user("alice")
            .with_field(FIELD_PASSWORD, "Secret1")
            .with_field(FIELD_PASSWORD_CONFIRM, "Secret1");
        let view = use_case(directory).execute(&request).await;

        assert_eq!(view.error_message(), Some(UNAVAILABLE_MESSAGE));
        assert_eq!(view.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn directory_failures_share_one_message() {
        for step in [DirectoryStep::Connect, DirectoryStep::Bind, DirectoryStep::Modify] {
            let mut directory = MockDirectory::new();
            directory
                .expect_change_credential()
                .times(1)
                .returning(move |_, _, _| Err(Error::directory(step, "ldap said no (49)")));

            let view = use_case(directory)
                .execute(&change_request("Secret1", "Secret1"))
                .await;
            assert_eq!(view.error_message(), Some(CHANGE_FAILED_MESSAGE));
        }
    }

    #[tokio::test]
    async fn change_password_surfaces_typed_errors() {
        let mut directory = MockDirectory::new();
        directory
            .expect_change_credential()
            .returning(|_, _, _| Err(Error::directory(DirectoryStep::Bind, "invalidCredentials")));
        let use_case = use_case(directory);
        let principal = Principal::new("alice", DomainPath::from_domain("example.com"));
        let old = SecretString::from("wrong".to_string());

        let err = use_case
            .change_password(&principal, &old, &SecretString::from("Secret1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DirectoryError {
                step: DirectoryStep::Bind,
                ..
            }
        ));

        let err = use_case
            .change_password(&principal, &old, &SecretString::from("short".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PolicyError(_)));
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = PasswdConfig {
            root_domain: "localhost".to_string(),
            ..PasswdConfig::default()
        };
        let result = ChangePasswordUseCase::new(config, Arc::new(MockDirectory::new()));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn from_settings_builds_ldap_backed_use_case() {
        let settings = Settings::from_json_str(r#"{"passwd": {"root_domain": "vmail.org"}}"#)
            .unwrap();
        let use_case = ChangePasswordUseCase::from_settings(settings).unwrap();
        assert_eq!(use_case.config().root_domain, "vmail.org");
    }
}
