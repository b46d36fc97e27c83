///! ICAO 24-bit address handling
///!
///! Every aircraft in the feed and in the watchlists is keyed by its ICAO
///! hex address (6 hex characters, e.g. "4D0131"). Validation happens here,
///! at the boundary, so the rest of the system only ever handles well-formed,
///! case-normalized identifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of an ICAO 24-bit address in hex characters
const ICAO_HEX_LEN: usize = 6;

/// A validated, uppercased ICAO hex address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IcaoHex(String);

/// Rejected identifier (wrong length or non-hex characters)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed ICAO hex address: {0:?}")]
pub struct InvalidIcaoHex(pub String);

impl IcaoHex {
    /// Parse and normalize a raw identifier.
    ///
    /// Accepts exactly 6 ASCII hex characters (surrounding whitespace is
    /// trimmed) and uppercases them. Anything else is rejected.
    pub fn parse(raw: &str) -> Result<Self, InvalidIcaoHex> {
        let trimmed = raw.trim();
        if trimmed.len() != ICAO_HEX_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidIcaoHex(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for IcaoHex {
    type Err = InvalidIcaoHex;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for IcaoHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IcaoHex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let hex = IcaoHex::parse("4d0131").unwrap();
        assert_eq!(hex.as_str(), "4D0131");
        assert_eq!(hex.to_string(), "4D0131");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let hex = IcaoHex::parse(" ABC123 ").unwrap();
        assert_eq!(hex.as_str(), "ABC123");
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert!(IcaoHex::parse("ABC12").is_err());
        assert!(IcaoHex::parse("ABC1234").is_err());
        assert!(IcaoHex::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!(IcaoHex::parse("ABCXYZ").is_err());
        assert!(IcaoHex::parse("~00000").is_err());
    }

    #[test]
    fn test_equality_is_case_insensitive_via_normalization() {
        assert_eq!(
            IcaoHex::parse("ae01ff").unwrap(),
            IcaoHex::parse("AE01FF").unwrap()
        );
    }
}
