//! Stream addresses of the form `scheme://<handle>`

use std::fmt;

use crate::error::{Error, Result};
use crate::idgen::Handle;

const SEPARATOR: &str = "://";

/// A parsed `scheme://<handle>` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    scheme: String,
    handle: Handle,
}

impl Address {
    #[must_use]
    pub fn new(scheme: impl Into<String>, handle: Handle) -> Self {
        Self {
            scheme: scheme.into(),
            handle,
        }
    }

    /// Parse `url` and require its scheme to be `scheme`.
    ///
    /// The handle part must be ASCII decimal digits only: no sign, spaces,
    /// path, query or port.
    ///
    /// # Errors
    /// `Error::InvalidAddress` for any other shape.
    pub fn parse(url: &str, scheme: &str) -> Result<Self> {
        let (found, rest) = split_scheme(url)?;
        if found != scheme {
            return Err(Error::invalid_address(url, "unexpected scheme"));
        }
        if rest.is_empty() {
            return Err(Error::invalid_address(url, "missing handle"));
        }
        if !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_address(url, "handle is not a decimal integer"));
        }
        let id = rest
            .parse::<u64>()
            .map_err(|_| Error::invalid_address(url, "handle is out of range"))?;
        Ok(Self::new(scheme, Handle::new(id)))
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.scheme, self.handle)
    }
}

/// Split `url` into its scheme and the part after `://`.
///
/// # Errors
/// `Error::InvalidAddress` if there is no `://` or the scheme is not valid.
pub fn split_scheme(url: &str) -> Result<(&str, &str)> {
    let Some((scheme, rest)) = url.split_once(SEPARATOR) else {
        return Err(Error::invalid_address(url, "expected 'scheme://<handle>'"));
    };
    if !is_valid_scheme(scheme) {
        return Err(Error::invalid_address(url, "invalid scheme"));
    }
    Ok((scheme, rest))
}

/// A scheme starts with an ASCII letter, followed by letters, digits, `+`, `-` or `.`
#[must_use]
pub fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<Address>) -> &'static str {
        match result {
            Err(Error::InvalidAddress { reason, .. }) => reason,
            other => panic!("expected InvalidAddress, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_valid() {
        let address = Address::parse("staticmem://4200017", "staticmem").unwrap();
        assert_eq!(address.scheme(), "staticmem");
        assert_eq!(address.handle(), Handle::new(4_200_017));
    }

    #[test]
    fn test_display_round_trips() {
        let address = Address::new("staticmem", Handle::new(12));
        assert_eq!(address.to_string(), "staticmem://12");
        assert_eq!(
            Address::parse(&address.to_string(), "staticmem").unwrap(),
            address
        );
    }

    #[test]
    fn test_rejects_non_numeric_handle() {
        assert_eq!(
            reason(Address::parse("staticmem://abc", "staticmem")),
            "handle is not a decimal integer"
        );
        assert_eq!(
            reason(Address::parse("staticmem://-5", "staticmem")),
            "handle is not a decimal integer"
        );
        assert_eq!(
            reason(Address::parse("staticmem://12/path", "staticmem")),
            "handle is not a decimal integer"
        );
        assert_eq!(
            reason(Address::parse("staticmem:// 12", "staticmem")),
            "handle is not a decimal integer"
        );
    }

    #[test]
    fn test_rejects_missing_parts() {
        assert_eq!(
            reason(Address::parse("staticmem://", "staticmem")),
            "missing handle"
        );
        assert_eq!(
            reason(Address::parse("12", "staticmem")),
            "expected 'scheme://<handle>'"
        );
        assert_eq!(reason(Address::parse("://12", "staticmem")), "invalid scheme");
    }

    #[test]
    fn test_rejects_other_scheme() {
        assert_eq!(
            reason(Address::parse("file://12", "staticmem")),
            "unexpected scheme"
        );
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(
            reason(Address::parse("staticmem://99999999999999999999999", "staticmem")),
            "handle is out of range"
        );
    }

    #[test]
    fn test_scheme_validation() {
        assert!(is_valid_scheme("staticmem"));
        assert!(is_valid_scheme("mem+v2.x-y"));
        assert!(!is_valid_scheme(""));
        assert!(!is_valid_scheme("2mem"));
        assert!(!is_valid_scheme("static mem"));
    }
}
