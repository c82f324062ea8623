//! Wallet address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`WalletAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletAddressError {
    /// The input string is empty.
    #[error("wallet address cannot be empty")]
    Empty,
    /// The input string has the wrong length.
    #[error("wallet address must be exactly {expected} characters (got {actual})")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Actual length of the input.
        actual: usize,
    },
    /// The input contains a character outside the base32 alphabet.
    #[error("wallet address contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// A ledger wallet address.
///
/// PAM-TALK reward tokens live on an Algorand-style ledger, whose account
/// addresses are 58-character base32 strings (alphabet `A-Z2-7`). Parsing
/// checks length and alphabet; full checksum verification is left to the
/// ledger, which rejects malformed addresses on submission.
///
/// ## Examples
///
/// ```
/// use pamtalk_core::WalletAddress;
///
/// let addr = "A".repeat(58);
/// assert!(WalletAddress::parse(&addr).is_ok());
///
/// assert!(WalletAddress::parse("").is_err());        // empty
/// assert!(WalletAddress::parse("TOO-SHORT").is_err()); // wrong length
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Length of a ledger address in its base32 string form.
    pub const LENGTH: usize = 58;

    /// Parse a `WalletAddress` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is not exactly 58 characters
    /// - Contains characters outside `A-Z2-7`
    pub fn parse(s: &str) -> Result<Self, WalletAddressError> {
        if s.is_empty() {
            return Err(WalletAddressError::Empty);
        }

        if s.len() != Self::LENGTH {
            return Err(WalletAddressError::WrongLength {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !matches!(c, 'A'..='Z' | '2'..='7'))
        {
            return Err(WalletAddressError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `WalletAddress` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = WalletAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_address() -> String {
        // 58 chars from the base32 alphabet
        "PAMTALK234567ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGHIJKLM".to_owned()
    }

    #[test]
    fn test_fixture_has_expected_length() {
        assert_eq!(valid_address().len(), WalletAddress::LENGTH);
    }

    #[test]
    fn test_parse_valid_address() {
        let addr = WalletAddress::parse(&valid_address()).unwrap();
        assert_eq!(addr.as_str().len(), WalletAddress::LENGTH);
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            WalletAddress::parse(""),
            Err(WalletAddressError::Empty)
        ));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            WalletAddress::parse("ABC234"),
            Err(WalletAddressError::WrongLength {
                expected: 58,
                actual: 6
            })
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        // '0' and '1' are not in the base32 alphabet
        let mut addr = valid_address();
        addr.replace_range(0..1, "0");
        assert!(matches!(
            WalletAddress::parse(&addr),
            Err(WalletAddressError::InvalidCharacter('0'))
        ));
    }

    #[test]
    fn test_parse_rejects_lowercase() {
        let addr = valid_address().to_lowercase();
        assert!(matches!(
            WalletAddress::parse(&addr),
            Err(WalletAddressError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_display_and_from_str() {
        let addr: WalletAddress = valid_address().parse().unwrap();
        assert_eq!(addr.to_string(), valid_address());
    }

    #[test]
    fn test_serde_roundtrip() {
        let addr = WalletAddress::parse(&valid_address()).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        let parsed: WalletAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }
}
