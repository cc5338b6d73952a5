//! Self-service password change for vmail mailboxes.
//!
//! A transport (CGI, web framework, test harness) implements
//! [`RequestSource`](vmail_core::identity::RequestSource), hands each request to
//! [`ChangePasswordUseCase::execute`] and renders the returned [`ChangePasswordView`].
//!
//! ```no_run
//! # async fn handle() -> vmail_core::Result<()> {
//! use vmail_core::identity::RequestContext;
//! use vmail_passwd::{ChangePasswordUseCase, Settings};
//!
//! let use_case = ChangePasswordUseCase::from_settings(Settings::from_file("passwd.json")?)?;
//! let request = RequestContext::new()
//!     .with_remote_user("alice")
//!     .with_host("webmail.example.com")
//!     .with_field("oldpassword", "old-pass1")
//!     .with_field("password", "Secret1")
//!     .with_field("password2", "Secret1");
//! let view = use_case.execute(&request).await;
//! assert!(view.is_success());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod settings;
mod use_case;
mod view;

pub use settings::Settings;
pub use use_case::ChangePasswordUseCase;
pub use view::{ChangePasswordOutcome, ChangePasswordView};
