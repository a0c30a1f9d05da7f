//! src/domain/mail_address.rs
use crate::domain::FieldError;
use email_address::{EmailAddress, Options};

/// A bare ASCII `local@domain` address, trimmed and syntax-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddress(String);

impl MailAddress {
    pub fn parse(s: String) -> Result<Self, FieldError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FieldError::EmailMissing);
        }
        // Internationalised addresses need SMTPUTF8 end to end, which raw
        // ISO-2022-JP headers cannot carry.
        if !trimmed.is_ascii() {
            return Err(FieldError::EmailMalformed);
        }
        // Display-name forms ("Jane <jane@example.com>") and domain literals are
        // not mailbox addresses we can put in a header as-is.
        let options = Options::default()
            .with_required_tld()
            .without_display_text()
            .without_domain_literal();
        match EmailAddress::parse_with_options(trimmed, options) {
            Ok(_) => Ok(Self(trimmed.to_string())),
            Err(_) => Err(FieldError::EmailMalformed),
        }
    }
}

impl AsRef<str> for MailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
