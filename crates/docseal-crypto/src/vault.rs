use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// AES-GCM nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// Per-document AES-256 key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultKey([u8; KEY_SIZE]);

/// Per-document AES-GCM nonce.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultNonce([u8; NONCE_SIZE]);

impl VaultKey {
    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let arr: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| VaultError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl VaultNonce {
    /// Generate a fresh random nonce from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let arr: [u8; NONCE_SIZE] = bytes
            .try_into()
            .map_err(|_| VaultError::InvalidNonceLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VaultKey(<redacted>)")
    }
}

impl std::fmt::Debug for VaultNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VaultNonce({})", hex::encode(self.0))
    }
}

/// Output of [`Vault::encrypt`]: ciphertext (with tag) plus the key and
/// nonce it was sealed under.
#[derive(Clone, Debug)]
pub struct SealedBytes {
    pub ciphertext: Vec<u8>,
    pub nonce: VaultNonce,
    pub key: VaultKey,
}

/// Plaintext recovered by [`Vault::decrypt`], tagged with its mime type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Authenticated at-rest encryption of document bytes.
///
/// Every call to [`Vault::encrypt`] draws a new key and a new nonce, so no
/// key/nonce pair is ever reused across documents. [`Vault::decrypt`] is a
/// pure function of its inputs and never consults ambient key state.
pub struct Vault;

impl Vault {
    /// Encrypt under a freshly generated key and nonce.
    pub fn encrypt(plaintext: &[u8]) -> Result<SealedBytes, VaultError> {
        let key = VaultKey::generate();
        let nonce = VaultNonce::generate();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|_| VaultError::EncryptionFailure)?;
        Ok(SealedBytes {
            ciphertext,
            nonce,
            key,
        })
    }

    /// Decrypt and authenticate a sealed document.
    ///
    /// Any alteration of the ciphertext, key, or nonce fails with
    /// [`VaultError::AuthenticationFailure`]; wrong plaintext is never
    /// returned.
    pub fn decrypt(
        ciphertext: &[u8],
        key: &VaultKey,
        nonce: &VaultNonce,
        mime_type: &str,
    ) -> Result<DecryptedDocument, VaultError> {
        if !is_renderable_mime(mime_type) {
            return Err(VaultError::UnsupportedFormat(mime_type.to_string()));
        }
        if ciphertext.len() < TAG_SIZE {
            return Err(VaultError::AuthenticationFailure);
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let bytes = cipher
            .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
            .map_err(|_| VaultError::AuthenticationFailure)?;
        Ok(DecryptedDocument {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }
}

/// A mime type is usable when it reads `type/subtype` with non-empty,
/// whitespace-free tokens. Parameters after `;` are allowed.
fn is_renderable_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    let valid = |token: &str| {
        !token.is_empty() && !token.contains('/') && !token.chars().any(char::is_whitespace)
    };
    valid(kind) && valid(subtype)
}

/// Errors from vault operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VaultError {
    #[error("encryption failed")]
    EncryptionFailure,

    #[error("authentication failed: ciphertext, key, or nonce was altered")]
    AuthenticationFailure,

    #[error("unsupported format: {0:?}")]
    UnsupportedFormat(String),

    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid nonce length: expected 12 bytes, got {0}")]
    InvalidNonceLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip_preserves_bytes_and_mime() {
        let sealed = Vault::encrypt(b"termination letter").unwrap();
        let opened =
            Vault::decrypt(&sealed.ciphertext, &sealed.key, &sealed.nonce, "application/pdf")
                .unwrap();
        assert_eq!(opened.bytes, b"termination letter");
        assert_eq!(opened.mime_type, "application/pdf");
    }

    #[test]
    fn ciphertext_carries_tag() {
        let sealed = Vault::encrypt(b"abc").unwrap();
        assert_eq!(sealed.ciphertext.len(), 3 + TAG_SIZE);
    }

    #[test]
    fn keys_and_nonces_are_fresh_per_document() {
        let a = Vault::encrypt(b"same").unwrap();
        let b = Vault::encrypt(b"same").unwrap();
        assert_ne!(a.key, b.key);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = Vault::encrypt(b"data").unwrap();
        let other = VaultKey::generate();
        assert_eq!(
            Vault::decrypt(&sealed.ciphertext, &other, &sealed.nonce, "text/plain"),
            Err(VaultError::AuthenticationFailure)
        );
    }

    #[test]
    fn truncated_ciphertext_fails_authentication() {
        let sealed = Vault::encrypt(b"data").unwrap();
        assert_eq!(
            Vault::decrypt(&sealed.ciphertext[..4], &sealed.key, &sealed.nonce, "text/plain"),
            Err(VaultError::AuthenticationFailure)
        );
    }

    #[test]
    fn unusable_mime_is_unsupported() {
        let sealed = Vault::encrypt(b"data").unwrap();
        for mime in ["", "pdf", "text/", "/plain", "text /plain", "a/b/c"] {
            assert_eq!(
                Vault::decrypt(&sealed.ciphertext, &sealed.key, &sealed.nonce, mime),
                Err(VaultError::UnsupportedFormat(mime.to_string())),
                "mime {mime:?}"
            );
        }
        assert!(Vault::decrypt(
            &sealed.ciphertext,
            &sealed.key,
            &sealed.nonce,
            "text/plain; charset=utf-8"
        )
        .is_ok());
    }

    #[test]
    fn key_and_nonce_length_checked() {
        assert_eq!(VaultKey::from_slice(&[0; 16]), Err(VaultError::InvalidKeyLength(16)));
        assert_eq!(VaultNonce::from_slice(&[0; 8]), Err(VaultError::InvalidNonceLength(8)));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", VaultKey::generate());
        assert!(debug.contains("redacted"));
    }

    fn flip(bytes: &[u8], bit: usize) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out[bit / 8] ^= 1 << (bit % 8);
        out
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn decrypt_inverts_encrypt(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let sealed = Vault::encrypt(&data).unwrap();
            let opened = Vault::decrypt(&sealed.ciphertext, &sealed.key, &sealed.nonce, "application/octet-stream").unwrap();
            prop_assert_eq!(opened.bytes, data);
        }

        #[test]
        fn any_ciphertext_bit_flip_is_detected(data in proptest::collection::vec(any::<u8>(), 1..256), seed in any::<usize>()) {
            let sealed = Vault::encrypt(&data).unwrap();
            let bit = seed % (sealed.ciphertext.len() * 8);
            let tampered = flip(&sealed.ciphertext, bit);
            prop_assert_eq!(
                Vault::decrypt(&tampered, &sealed.key, &sealed.nonce, "text/plain"),
                Err(VaultError::AuthenticationFailure)
            );
        }

        #[test]
        fn any_key_bit_flip_is_detected(seed in 0usize..(KEY_SIZE * 8)) {
            let sealed = Vault::encrypt(b"payload").unwrap();
            let key = VaultKey::from_slice(&flip(sealed.key.as_bytes(), seed)).unwrap();
            prop_assert_eq!(
                Vault::decrypt(&sealed.ciphertext, &key, &sealed.nonce, "text/plain"),
                Err(VaultError::AuthenticationFailure)
            );
        }

        #[test]
        fn any_nonce_bit_flip_is_detected(seed in 0usize..(NONCE_SIZE * 8)) {
            let sealed = Vault::encrypt(b"payload").unwrap();
            let nonce = VaultNonce::from_slice(&flip(sealed.nonce.as_bytes(), seed)).unwrap();
            prop_assert_eq!(
                Vault::decrypt(&sealed.ciphertext, &sealed.key, &nonce, "text/plain"),
                Err(VaultError::AuthenticationFailure)
            );
        }
    }
}
