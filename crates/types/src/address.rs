use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ADDRESS_LEN;

/// Kind of ledger principal an address refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// `G...` account key
    Account,
    /// `C...` contract instance
    Contract,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unsupported address prefix '{0}'")]
    InvalidPrefix(char),

    #[error("invalid character '{0}' in address")]
    InvalidCharacter(char),

    #[error("address checksum or version byte is invalid")]
    InvalidChecksum,

    #[error("empty address")]
    Empty,
}

/// A well-formed ledger address (strkey encoding).
///
/// Parsing checks length, version prefix, the base32 alphabet and the
/// CRC16 checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        let first = raw.chars().next().ok_or(AddressError::Empty)?;

        if raw.len() != ADDRESS_LEN {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: raw.len(),
            });
        }

        if first != 'G' && first != 'C' {
            return Err(AddressError::InvalidPrefix(first));
        }

        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || ('2'..='7').contains(c)))
        {
            return Err(AddressError::InvalidCharacter(bad));
        }

        let decoded = if first == 'G' {
            stellar_strkey::ed25519::PublicKey::from_string(raw).map(|_| ())
        } else {
            stellar_strkey::Contract::from_string(raw).map(|_| ())
        };
        decoded.map_err(|_| AddressError::InvalidChecksum)?;

        Ok(Self(raw.to_string()))
    }

    /// `G...` address of an ed25519 public key
    pub fn from_account_key(key: [u8; 32]) -> Self {
        Self(stellar_strkey::ed25519::PublicKey(key).to_string())
    }

    /// `C...` address of a contract id
    pub fn from_contract_id(id: [u8; 32]) -> Self {
        Self(stellar_strkey::Contract(id).to_string())
    }

    pub fn kind(&self) -> AddressKind {
        if self.0.starts_with('C') {
            AddressKind::Contract
        } else {
            AddressKind::Account
        }
    }

    pub fn is_contract(&self) -> bool {
        self.kind() == AddressKind::Contract
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines and user-facing messages
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[ADDRESS_LEN - 4..])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "GDQNY3PBOJOKYZSRMK2S7LHHGWZIUISD4QORETLMXEWXBI7KFZZMKTL3";
    const CONTRACT: &str = "CAQ4DF5FLQHGAUEXYJKTVFFIVHVIUN6XNUE7NW27BJGWEPNHQKZYMRQ6";

    #[test]
    fn test_parse_account_and_contract() {
        let account = Address::parse(ACCOUNT).unwrap();
        assert_eq!(account.kind(), AddressKind::Account);

        let contract = Address::parse(CONTRACT).unwrap();
        assert!(contract.is_contract());
        assert_eq!(contract.to_string(), CONTRACT);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert!(matches!(
            Address::parse("ADDR1"),
            Err(AddressError::InvalidLength { actual: 5, .. })
        ));

        let wrong_prefix = format!("X{}", &ACCOUNT[1..]);
        assert_eq!(
            Address::parse(&wrong_prefix),
            Err(AddressError::InvalidPrefix('X'))
        );

        let lowercase = ACCOUNT.to_lowercase();
        assert!(Address::parse(&lowercase).is_err());

        let with_one = format!("G{}1", &ACCOUNT[1..55]);
        assert_eq!(
            Address::parse(&with_one),
            Err(AddressError::InvalidCharacter('1'))
        );
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let flipped = format!("{}4", &ACCOUNT[..55]);
        assert_eq!(Address::parse(&flipped), Err(AddressError::InvalidChecksum));

        let repeated = format!("G{}", "B".repeat(55));
        assert_eq!(Address::parse(&repeated), Err(AddressError::InvalidChecksum));

        // Account payload behind a contract prefix
        let swapped = format!("C{}", &ACCOUNT[1..]);
        assert!(Address::parse(&swapped).is_err());
    }

    #[test]
    fn test_encoded_addresses_parse_back() {
        let account = Address::from_account_key([7u8; 32]);
        assert_eq!(account.kind(), AddressKind::Account);
        assert_eq!(Address::parse(account.as_str()), Ok(account.clone()));

        let contract = Address::from_contract_id([9u8; 32]);
        assert!(contract.is_contract());
        assert_eq!(Address::parse(contract.as_str()), Ok(contract));
    }

    #[test]
    fn test_serde_validates() {
        let json = format!("\"{}\"", CONTRACT);
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_str(), CONTRACT);

        let bad: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_short_form() {
        let contract = Address::parse(CONTRACT).unwrap();
        assert_eq!(contract.short(), "CAQ4DF...MRQ6");
    }
}
