//! Message key expansion using HKDF

use std::fmt;

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

/// HKDF info string for sender message keys
const MESSAGE_KEY_INFO: &[u8] = b"WhisperGroup";

/// Bytes of HKDF output: 16-byte IV followed by 32-byte cipher key
const EXPANDED_SIZE: usize = 48;

/// A message key derived from one chain iteration.
///
/// Used for a single encryption or decryption, then discarded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageKey {
    /// Chain iteration this key belongs to
    iteration: u32,
    /// 16-byte cipher IV
    iv: [u8; 16],
    /// 32-byte cipher key
    cipher_key: [u8; 32],
}

impl MessageKey {
    /// Expand a message seed into an IV and cipher key.
    ///
    /// HKDF-SHA256 with a zero salt stretches `message_seed` to 48 bytes:
    /// bytes `0..16` become the IV and bytes `16..48` the cipher key.
    pub fn expand(iteration: u32, message_seed: &[u8; 32]) -> Self {
        let hkdf = Hkdf::<Sha256>::new(Some(&[0u8; 32]), message_seed);

        let mut okm = [0u8; EXPANDED_SIZE];
        let Ok(()) = hkdf.expand(MESSAGE_KEY_INFO, &mut okm) else {
            unreachable!("48 bytes is a valid HKDF-SHA256 output length");
        };

        let mut iv = [0u8; 16];
        let mut cipher_key = [0u8; 32];
        iv.copy_from_slice(&okm[..16]);
        cipher_key.copy_from_slice(&okm[16..]);
        okm.zeroize();

        Self { iteration, iv, cipher_key }
    }

    /// Chain iteration this key was derived for.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// 16-byte IV for the symmetric cipher.
    pub fn iv(&self) -> &[u8; 16] {
        &self.iv
    }

    /// 32-byte symmetric key.
    pub fn cipher_key(&self) -> &[u8; 32] {
        &self.cipher_key
    }
}

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageKey").field("iteration", &self.iteration).finish_non_exhaustive()
    }
}

impl Drop for MessageKey {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.cipher_key.zeroize();
    }
}
