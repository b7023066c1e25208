//! Symmetric message encryption
//!
//! The group cipher treats the symmetric primitive as opaque: it hands over a
//! [`MessageKey`] and bytes, and gets bytes back. [`MessageCipher`] is that
//! seam. All implementations are pure and stateless.

use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};

use super::{derivation::MessageKey, error::CryptoError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Bytes of the IV used as the ChaCha20-Poly1305 nonce
const CHACHA_NONCE_SIZE: usize = 12;

/// Symmetric primitive keyed by a single-use [`MessageKey`].
pub trait MessageCipher: Clone + Send + Sync + 'static {
    /// Encrypt `plaintext` under `key`.
    fn encrypt(&self, key: &MessageKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `ciphertext` under `key`.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` on bad padding, tag mismatch or wrong key
    fn decrypt(&self, key: &MessageKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// AES-256 in CBC mode with PKCS#7 padding.
///
/// Provides confidentiality only; integrity comes from the signature over the
/// envelope that carries the ciphertext.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256CbcCipher;

impl MessageCipher for Aes256CbcCipher {
    fn encrypt(&self, key: &MessageKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256CbcEnc::new_from_slices(key.cipher_key(), key.iv())
            .map_err(|e| CryptoError::EncryptionFailed { reason: e.to_string() })?;

        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn decrypt(&self, key: &MessageKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256CbcDec::new_from_slices(key.cipher_key(), key.iv())
            .map_err(|e| CryptoError::DecryptionFailed { reason: e.to_string() })?;

        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed { reason: "invalid padding".to_string() })
    }
}

/// ChaCha20-Poly1305 AEAD.
///
/// The nonce is the first 12 bytes of the message key's IV. Message keys are
/// single-use, so a nonce never repeats under one key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Poly1305Cipher;

impl MessageCipher for ChaCha20Poly1305Cipher {
    fn encrypt(&self, key: &MessageKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = ChaCha20Poly1305::new(key.cipher_key().into());
        let nonce = Nonce::from_slice(&key.iv()[..CHACHA_NONCE_SIZE]);

        cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed { reason: "aead failure".to_string() })
    }

    fn decrypt(&self, key: &MessageKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = ChaCha20Poly1305::new(key.cipher_key().into());
        let nonce = Nonce::from_slice(&key.iv()[..CHACHA_NONCE_SIZE]);

        cipher.decrypt(nonce, ciphertext).map_err(|_| CryptoError::DecryptionFailed {
            reason: "authentication failed".to_string(),
        })
    }
}
