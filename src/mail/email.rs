use lazy_static::lazy_static;
use regex::Regex;

use super::error::AccountError;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern compiles");
}

/// Check that `email` looks like `local@domain.tld`
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A mail account identifier split into its two halves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub local: String,
    pub domain: String,
}

impl Address {
    /// Split on the single `@`. Validation of the shape is left to
    /// [`is_valid_email`]; this only requires exactly one separator.
    pub fn split(email: &str) -> Result<Self, AccountError> {
        let mut parts = email.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => Ok(Self {
                local: local.to_string(),
                domain: domain.to_string(),
            }),
            _ => Err(AccountError::InvalidFormat(email.to_string())),
        }
    }

    /// Validate and split in one step
    pub fn parse(email: &str) -> Result<Self, AccountError> {
        if !is_valid_email(email) {
            return Err(AccountError::InvalidEmail(email.to_string()));
        }
        Self::split(email)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for email in [
            "alice@example.com",
            "bob.smith+tag@mail.example.co.uk",
            "x_y%z-1@sub-domain.example.org",
            "UPPER@EXAMPLE.IO",
        ] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "",
            "alice",
            "alice@",
            "@example.com",
            "alice@example",
            "alice@example.c",
            "alice@@example.com",
            "alice@bob@example.com",
            "ali ce@example.com",
            "alice@exa_mple.com",
            "alice@example.c0m",
            "alice:x@example.com",
        ] {
            assert!(!is_valid_email(email), "{email:?} should be invalid");
        }
    }

    #[test]
    fn split_requires_exactly_one_at() {
        assert_eq!(
            Address::split("bob@example.com").unwrap(),
            Address {
                local: "bob".into(),
                domain: "example.com".into()
            }
        );
        assert!(matches!(
            Address::split("bob"),
            Err(AccountError::InvalidFormat(_))
        ));
        assert!(matches!(
            Address::split("a@b@c"),
            Err(AccountError::InvalidFormat(_))
        ));
    }

    #[test]
    fn parse_validates_then_splits() {
        let address = Address::parse("carol@example.net").unwrap();
        assert_eq!(address.to_string(), "carol@example.net");
        assert!(matches!(
            Address::parse("carol@localhost"),
            Err(AccountError::InvalidEmail(_))
        ));
    }
}
