use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Ledger round number (block height).
pub type Round = u64;

/// Reference to a transaction on the external ledger.
///
/// Rendered as 64 uppercase hex characters. The same type names a pending
/// submission and a finalized transaction; only the ledger knows which one
/// it is.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    /// Length of a rendered reference.
    pub const LEN: usize = 64;

    /// Build a reference from the 32-byte transaction digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode_upper(digest))
    }

    /// Parse a rendered reference. Lowercase input is normalised.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.len() != Self::LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidTransactionRef(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Debug for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionRef({})", self.short())
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Ledger account, identified by its Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub const fn from_public_key(key: [u8; 32]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| TypeError::InvalidLength {
            expected: 32,
            actual: b.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_ref_from_digest_is_uppercase_hex() {
        let r = TransactionRef::from_digest(&[0xab; 32]);
        assert_eq!(r.as_str().len(), 64);
        assert!(r.as_str().starts_with("ABAB"));
        assert_eq!(r.short(), "ABABABAB");
    }

    #[test]
    fn transaction_ref_parse_normalises_case() {
        let r = TransactionRef::parse(&"cd".repeat(32)).unwrap();
        assert_eq!(r, TransactionRef::from_digest(&[0xcd; 32]));
    }

    #[test]
    fn transaction_ref_parse_rejects_garbage() {
        assert!(TransactionRef::parse("not-a-ref").is_err());
        assert!(TransactionRef::parse(&"g".repeat(64)).is_err());
    }

    #[test]
    fn transaction_ref_serde_is_plain_string() {
        let r = TransactionRef::from_digest(&[1; 32]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, format!("\"{}\"", r.as_str()));
    }

    #[test]
    fn account_address_hex_roundtrip() {
        let addr = AccountAddress::from_public_key([9; 32]);
        assert_eq!(AccountAddress::from_hex(&addr.to_hex()).unwrap(), addr);
        assert!(AccountAddress::from_hex("0102").is_err());
    }
}
