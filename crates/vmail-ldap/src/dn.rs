//! Distinguished names for vmail mailbox entries.

use std::fmt;
use thiserror::Error;

use vmail_core::domain::DomainPath;
use vmail_core::error::Error as CoreError;

/// Errors that can occur when building distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// A component was missing the value to the right of the `=`.
    #[error("distinguished name component missing value for attribute {0}")]
    MissingValue(String),
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::InternalError(err.to_string())
    }
}

/// Relative distinguished name (single attribute/value pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    attribute: String,
    value: String,
}

impl RelativeDistinguishedName {
    /// Create a new relative distinguished name from an unescaped value.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute portion of the RDN (e.g. `uid`).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Unescaped value portion of the RDN.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for RelativeDistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape(&self.value))
    }
}

/// Distinguished name kept as a list of RDNs and rendered with RFC 4514 escaping.
///
/// Values are stored unescaped, so text from the request can never introduce additional
/// components when the DN is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    raw: String,
    rdns: Vec<RelativeDistinguishedName>,
}

impl DistinguishedName {
    /// Builds `uid=<user>,ou=people,<domain dcs>,ou=vmail,<root dcs>`.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError::MissingValue`] if the username or any domain label is
    /// empty.
    pub fn for_mailbox(
        username: &str,
        domain: &DomainPath,
        root_domain: &DomainPath,
    ) -> std::result::Result<Self, DistinguishedNameError> {
        let mut rdns = vec![
            RelativeDistinguishedName::new("uid", username),
            RelativeDistinguishedName::new("ou", "people"),
        ];
        rdns.extend(domain_components(domain));
        rdns.push(RelativeDistinguishedName::new("ou", "vmail"));
        rdns.extend(domain_components(root_domain));

        if let Some(rdn) = rdns.iter().find(|rdn| rdn.value.is_empty()) {
            return Err(DistinguishedNameError::MissingValue(rdn.attribute.clone()));
        }

        let raw = rdns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Ok(Self { raw, rdns })
    }

    /// Borrows the rendered distinguished name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the RDNs in order, leaf first.
    #[must_use]
    pub fn rdns(&self) -> &[RelativeDistinguishedName] {
        &self.rdns
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn domain_components(domain: &DomainPath) -> impl Iterator<Item = RelativeDistinguishedName> + '_ {
    domain
        .labels()
        .iter()
        .map(|label| RelativeDistinguishedName::new("dc", label.as_str()))
}

fn escape(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in value.chars().enumerate() {
        if ch == '\0' {
            escaped.push_str("\\00");
            continue;
        }

        let needs_escape = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (idx == 0 && (ch == ' ' || ch == '#'))
            || (idx == last && ch == ' ');

        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox(username: &str, domain: &str) -> DistinguishedName {
        DistinguishedName::for_mailbox(
            username,
            &DomainPath::from_domain(domain),
            &DomainPath::from_domain("vmail.org"),
        )
        .unwrap()
    }

    #[test]
    fn mailbox_dn_layout() {
        let dn = mailbox("alice", "example.com");
        assert_eq!(
            dn.as_str(),
            "uid=alice,ou=people,dc=example,dc=com,ou=vmail,dc=vmail,dc=org"
        );
        assert_eq!(dn.to_string(), dn.as_str());
        assert_eq!(dn.rdns()[0].value(), "alice");
    }

    #[test]
    fn mailbox_dn_escapes_username() {
        let dn = mailbox("eve,ou=admins", "example.com");
        assert!(dn.as_str().starts_with("uid=eve\\,ou\\=admins,ou=people,"));
        assert_eq!(dn.rdns()[0].value(), "eve,ou=admins");
        assert_eq!(dn.rdns().len(), 7);
    }

    #[test]
    fn mailbox_dn_rejects_empty_values() {
        let err = DistinguishedName::for_mailbox(
            "",
            &DomainPath::from_domain("example.com"),
            &DomainPath::from_domain("example.com"),
        )
        .unwrap_err();
        assert_eq!(err, DistinguishedNameError::MissingValue("uid".to_string()));

        let err = DistinguishedName::for_mailbox(
            "alice",
            &DomainPath::from_domain("example..com"),
            &DomainPath::from_domain("example.com"),
        )
        .unwrap_err();
        assert_eq!(err, DistinguishedNameError::MissingValue("dc".to_string()));
    }

    #[test]
    fn domain_components_match_string_rendering() {
        let dn = mailbox("alice", "example.com");
        let domain_part = dn.rdns()[2..4]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(domain_part, vmail_core::domain::domain_to_dn("example.com"));
    }

    #[test]
    fn escape_leading_and_trailing_spaces() {
        assert_eq!(escape(" padded "), "\\ padded\\ ");
        assert_eq!(escape("#tag"), "\\#tag");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn escape_nul_as_hex_pair() {
        assert_eq!(escape("a\0b"), "a\\00b");
        let dn = mailbox("bob\0", "example.com");
        assert!(dn.as_str().starts_with("uid=bob\\00,ou=people,"));
    }
}
