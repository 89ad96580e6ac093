//! Cryptographic primitives for shoal
//!
//! Provides:
//! - SHA-256 content hashing for chunk addressing
//! - AES-256-GCM encryption (authenticated encryption)
//! - Key derivation from passwords using PBKDF2-HMAC-SHA256

use crate::error::{Result, ShoalError};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use sha2::{Digest, Sha256};
use std::fmt;

/// AES-256-GCM key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Salt size for key derivation (32 bytes)
pub const SALT_SIZE: usize = 32;

/// AES-GCM nonce size (12 bytes / 96 bits)
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// PBKDF2 iteration count for password-based key derivation
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// SHA-256 hash wrapper for content addressing
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute SHA-256 hash of data
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| ShoalError::InvalidHash(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(ShoalError::InvalidHash(format!(
                "Invalid length: expected 32, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Verify that data matches this hash
    pub fn verify(&self, data: &[u8]) -> bool {
        let computed = Self::compute(data);
        self == &computed
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// AES-256-GCM encryption key derived from a password
///
/// Carries the derivation salt so it can be persisted alongside the file
/// record and reused to re-derive the same key on download.
#[derive(Clone)]
pub struct EncryptionKey {
    key: [u8; KEY_SIZE],
    salt: [u8; SALT_SIZE],
}

impl EncryptionKey {
    /// Derive a key from a password using PBKDF2-HMAC-SHA256
    ///
    /// Generates a fresh random salt when none is given.
    pub fn derive(password: &str, salt: Option<[u8; SALT_SIZE]>) -> Self {
        let salt = salt.unwrap_or_else(|| {
            use rand::RngCore;
            let mut s = [0u8; SALT_SIZE];
            OsRng.fill_bytes(&mut s);
            s
        });

        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key);

        Self { key, salt }
    }

    /// Re-derive a key from a password and a hex-encoded stored salt
    pub fn derive_with_salt_hex(password: &str, salt_hex: &str) -> Result<Self> {
        let bytes = hex::decode(salt_hex).map_err(|e| ShoalError::InvalidSalt(e.to_string()))?;
        if bytes.len() != SALT_SIZE {
            return Err(ShoalError::InvalidSalt(format!(
                "Invalid length: expected {}, got {}",
                SALT_SIZE,
                bytes.len()
            )));
        }
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes);
        Ok(Self::derive(password, Some(salt)))
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Hex-encoded salt, as stored in the file record
    pub fn salt_hex(&self) -> String {
        hex::encode(self.salt)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey([REDACTED])")
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.key.iter_mut().for_each(|b| *b = 0);
    }
}

/// Encrypt a chunk using AES-256-GCM
///
/// Output layout: `nonce(12) || ciphertext || tag(16)`. The nonce is drawn
/// fresh from the CSPRNG on every call; a nonce must never be reused under
/// the same key. Random 96-bit nonces keep the collision probability for
/// 2^32 chunks under one key around 2^-32.
pub fn seal(plaintext: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    use rand::RngCore;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ShoalError::Encryption(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| ShoalError::Encryption(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a chunk sealed with [`seal`]
///
/// GCM tag verification failure (wrong password or tampered bytes) surfaces
/// as a decryption error; callers must not retry.
pub fn open(sealed: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(ShoalError::Decryption(
            "Data too short for sealed content".to_string(),
        ));
    }

    let nonce = Nonce::from_slice(&sealed[..NONCE_SIZE]);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ShoalError::Decryption(e.to_string()))?;

    cipher
        .decrypt(nonce, &sealed[NONCE_SIZE..])
        .map_err(|_| ShoalError::Decryption("Authentication failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let data = b"hello world";
        let hash = ContentHash::compute(data);

        let hash2 = ContentHash::compute(data);
        assert_eq!(hash, hash2);

        let hash3 = ContentHash::compute(b"different data");
        assert_ne!(hash, hash3);

        assert!(hash.verify(data));
        assert!(!hash.verify(b"wrong data"));
    }

    #[test]
    fn test_content_hash_hex_roundtrip() {
        let hash = ContentHash::compute(b"some chunk");
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        let recovered = ContentHash::from_hex(&hex).unwrap();
        assert_eq!(hash, recovered);
    }

    #[test]
    fn test_content_hash_known_vector() {
        // SHA-256 of the empty string
        let hash = ContentHash::compute(b"");
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_derive_is_deterministic_with_same_salt() {
        let key1 = EncryptionKey::derive("hunter2", None);
        let salt_hex = key1.salt_hex();

        let key2 = EncryptionKey::derive_with_salt_hex("hunter2", &salt_hex).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        // Different password, same salt: different key
        let key3 = EncryptionKey::derive_with_salt_hex("hunter3", &salt_hex).unwrap();
        assert_ne!(key1.as_bytes(), key3.as_bytes());
    }

    #[test]
    fn test_derive_generates_fresh_salts() {
        let key1 = EncryptionKey::derive("pw", None);
        let key2 = EncryptionKey::derive("pw", None);
        assert_ne!(key1.salt_hex(), key2.salt_hex());
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = EncryptionKey::derive("secret", None);
        let plaintext = b"chunk payload bytes";

        let sealed = seal(plaintext, &key).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + NONCE_SIZE + TAG_SIZE);

        let opened = open(&sealed, &key).unwrap();
        assert_eq!(opened.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = EncryptionKey::derive("password-one", None);
        let key2 = EncryptionKey::derive("password-two", None);

        let sealed = seal(b"secret", &key1).unwrap();
        assert!(open(&sealed, &key2).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = EncryptionKey::derive("pw", None);
        let mut sealed = seal(b"secret", &key).unwrap();

        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;

        assert!(open(&sealed, &key).is_err());
    }

    #[test]
    fn test_nonces_are_fresh_per_seal() {
        let key = EncryptionKey::derive("pw", None);
        let a = seal(b"same plaintext", &key).unwrap();
        let b = seal(b"same plaintext", &key).unwrap();

        // Distinct nonces imply distinct sealed bytes for equal plaintext
        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_rejects_truncated_input() {
        let key = EncryptionKey::derive("pw", None);
        let result = open(&[0u8; NONCE_SIZE + TAG_SIZE - 1], &key);
        assert!(result.is_err());
    }
}
