use std::fmt;

use docseal_types::AccountAddress;
use ed25519_dalek::Signer as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of a rendered signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Secret key of a ledger account.
///
/// The account address is the Ed25519 public key, so holding a
/// `SigningKey` is the same as controlling its [`AccountAddress`].
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

/// Public half of an account key, recoverable from the address alone.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// Detached Ed25519 signature over a transaction's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl SigningKey {
    pub fn generate() -> Self {
        let inner = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        Self { inner }
    }

    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&secret),
        }
    }

    /// Parse the 64-char hex form used by key files. Surrounding whitespace
    /// is ignored.
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let decoded = hex::decode(s.trim()).map_err(|_| SignatureError::InvalidKey)?;
        let secret = <[u8; 32]>::try_from(decoded.as_slice()).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self::from_bytes(secret))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    pub fn address(&self) -> AccountAddress {
        AccountAddress::from_public_key(self.inner.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("address", &self.address())
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl VerifyingKey {
    /// Check `signature` over `message`. Uses strict verification, which
    /// rejects malleable and small-order signatures.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.inner
            .verify_strict(message, &sig)
            .map_err(|_| SignatureError::InvalidSignature)
    }

    /// Recover the key that controls `address`. Fails when the address is
    /// not a valid curve point.
    pub fn from_address(address: &AccountAddress) -> Result<Self, SignatureError> {
        Self::from_bytes(*address.as_bytes())
    }

    pub fn from_bytes(public: [u8; 32]) -> Result<Self, SignatureError> {
        ed25519_dalek::VerifyingKey::from_bytes(&public)
            .map(|inner| Self { inner })
            .map_err(|_| SignatureError::InvalidKey)
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    pub fn address(&self) -> AccountAddress {
        AccountAddress::from_public_key(self.as_bytes())
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKey({})", self.address())
    }
}

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}

// Hex in every format, like fingerprints and account addresses.
impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        let arr = <[u8; SIGNATURE_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
            serde::de::Error::invalid_length(bytes.len(), &"64 signature bytes")
        })?;
        Ok(Self(arr))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature does not match the account key")]
    InvalidSignature,
    #[error("malformed Ed25519 key")]
    InvalidKey,
}
