//! Domain resolution from the request host.
//!
//! A mailbox's domain is the last two labels of the host the request arrived on, so
//! `webmail.example.com` and `example.com` both resolve to `example.com`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered labels of a domain, most specific first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainPath {
    labels: Vec<String>,
}

impl DomainPath {
    /// Splits a domain string into its labels.
    #[must_use]
    pub fn from_domain(domain: &str) -> Self {
        Self {
            labels: domain.split('.').map(str::to_owned).collect(),
        }
    }

    /// Derives the organizational domain of a host identifier.
    ///
    /// Keeps at most the last two labels. A port suffix and the root `.` of a fully
    /// qualified name are ignored.
    #[must_use]
    pub fn from_host(host: &str) -> Self {
        let host = strip_port(host.trim());
        let host = host.strip_suffix('.').unwrap_or(host);
        let labels: Vec<&str> = host.split('.').collect();
        let keep = labels.len().saturating_sub(2);
        Self {
            labels: labels[keep..].iter().map(|label| (*label).to_owned()).collect(),
        }
    }

    /// Borrows the labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Renders the labels as `dc=` components joined by `,`.
    #[must_use]
    pub fn to_dn_string(&self) -> String {
        self.labels
            .iter()
            .map(|label| format!("dc={label}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for DomainPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels.join("."))
    }
}

/// Returns the domain (last two labels) of a host identifier.
#[must_use]
pub fn domain_of(host: &str) -> String {
    DomainPath::from_host(host).to_string()
}

/// Converts `example.com` into `dc=example,dc=com`.
#[must_use]
pub fn domain_to_dn(domain: &str) -> String {
    DomainPath::from_domain(domain).to_dn_string()
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|ch| ch.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
