//! # vmail-core
//!
//! Core types for changing a vmail user's password.
//!
//! This crate holds everything that does not talk to the directory: request identity
//! extraction, domain resolution, password policy and `{SSHA}` credential hashing.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and user-facing messages
//! - [`config`] - Root domain and password policy configuration
//! - [`domain`] - Host to domain resolution and `dc=` rendering
//! - [`identity`] - Request context extraction of principal and credentials
//! - [`policy`] - New password strength rules
//! - [`hash`] - Salted SHA-1 credential hashing

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod domain;
pub mod error;
pub mod hash;
pub mod identity;
pub mod policy;

// Re-export commonly used types
pub use error::{DirectoryStep, Error, Result};
