//! # Ciphers over Stored Material
//!
//! The encryption layer is deliberately thin and swappable behind
//! [`KeyCipher`]. Two implementations ship: a bit-stream one-time pad,
//! and AES-256-GCM keyed by a digest of the stored material. Nonces are
//! drawn from the injected random source.

use crate::domain::bits_to_bytes;
use crate::error::{KeystoreError, KeystoreResult};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::StdRng;
use rand::Rng;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric encryption over raw key bits.
pub trait KeyCipher: Send + Sync {
    /// Human-readable cipher name, used in logs.
    fn name(&self) -> &'static str;

    /// Encrypt `plaintext` under the given key material.
    fn encrypt(
        &self,
        key_bits: &[bool],
        plaintext: &[u8],
        rng: &mut StdRng,
    ) -> KeystoreResult<Vec<u8>>;

    /// Decrypt `ciphertext` under the given key material.
    fn decrypt(&self, key_bits: &[bool], ciphertext: &[u8]) -> KeystoreResult<Vec<u8>>;
}

/// Bit-stream one-time pad. Requires eight key bits per payload byte;
/// encryption and decryption are the same XOR.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorOtp;

impl XorOtp {
    fn xor_stream(key_bits: &[bool], data: &[u8]) -> KeystoreResult<Vec<u8>> {
        let needed = data.len() * 8;
        if key_bits.len() < needed {
            return Err(KeystoreError::KeyTooShort {
                needed,
                available: key_bits.len(),
            });
        }
        let pad = bits_to_bytes(&key_bits[..needed]);
        Ok(data.iter().zip(pad).map(|(byte, key)| byte ^ key).collect())
    }
}

impl KeyCipher for XorOtp {
    fn name(&self) -> &'static str {
        "xor-otp"
    }

    fn encrypt(
        &self,
        key_bits: &[bool],
        plaintext: &[u8],
        _rng: &mut StdRng,
    ) -> KeystoreResult<Vec<u8>> {
        Self::xor_stream(key_bits, plaintext)
    }

    fn decrypt(&self, key_bits: &[bool], ciphertext: &[u8]) -> KeystoreResult<Vec<u8>> {
        Self::xor_stream(key_bits, ciphertext)
    }
}

/// AES-256-GCM under a SHA-256 digest of the packed key material.
///
/// Wire layout is `nonce || ciphertext || tag`. Unlike the pad this
/// authenticates, so decryption under the wrong key fails instead of
/// returning noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    fn derive(key_bits: &[bool]) -> KeystoreResult<Aes256Gcm> {
        if key_bits.is_empty() {
            return Err(KeystoreError::KeyTooShort {
                needed: 1,
                available: 0,
            });
        }
        let material = bits_to_bytes(key_bits);
        let derived: [u8; 32] = Sha256::digest(&material).into();
        Aes256Gcm::new_from_slice(&derived).map_err(|_| KeystoreError::CiphertextRejected {
            reason: "key derivation failed".to_owned(),
        })
    }
}

impl KeyCipher for AesGcmCipher {
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn encrypt(
        &self,
        key_bits: &[bool],
        plaintext: &[u8],
        rng: &mut StdRng,
    ) -> KeystoreResult<Vec<u8>> {
        let cipher = Self::derive(key_bits)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| KeystoreError::CiphertextRejected {
                reason: "encryption failed".to_owned(),
            })?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, key_bits: &[bool], ciphertext: &[u8]) -> KeystoreResult<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(KeystoreError::CiphertextRejected {
                reason: format!("ciphertext too short: {} bytes", ciphertext.len()),
            });
        }
        let cipher = Self::derive(key_bits)?;
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        cipher
            .decrypt(nonce, sealed)
            .map_err(|_| KeystoreError::CiphertextRejected {
                reason: "authentication failed".to_owned(),
            })
    }
}
