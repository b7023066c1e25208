//! Ed25519 signatures for sender key envelopes
//!
//! Only the state a party created for itself holds a secret key; every peer
//! state holds the public half and can only verify.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use zeroize::Zeroize;

use super::error::CryptoError;

/// Ed25519 public key size
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 secret key (seed) size
pub const SECRET_KEY_SIZE: usize = 32;

/// Ed25519 signature size
pub const SIGNATURE_SIZE: usize = 64;

/// A sender's signing keypair.
#[derive(Clone)]
pub struct SigningKeyPair {
    secret: [u8; SECRET_KEY_SIZE],
    public: [u8; PUBLIC_KEY_SIZE],
}

impl SigningKeyPair {
    /// Derive a keypair from 32 random bytes supplied by the caller.
    pub fn from_seed(seed: [u8; SECRET_KEY_SIZE]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let public = signing_key.verifying_key().to_bytes();
        Self { secret: seed, public }
    }

    /// Public verification key.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public
    }

    /// Secret signing seed.
    pub fn secret_key(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.secret
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair").field("public", &self.public).finish_non_exhaustive()
    }
}

impl Drop for SigningKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Sign `message` with a secret signing seed.
pub fn sign(secret: &[u8; SECRET_KEY_SIZE], message: &[u8]) -> [u8; SIGNATURE_SIZE] {
    SigningKey::from_bytes(secret).sign(message).to_bytes()
}

/// Verify `signature` over `message`.
///
/// Uses strict verification, rejecting small-order keys and non-canonical
/// signatures.
///
/// # Errors
///
/// - `InvalidPublicKey` if `public` is not a valid curve point
/// - `InvalidSignature` if the signature does not verify
pub fn verify(
    public: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_bytes(public).map_err(|_| CryptoError::InvalidPublicKey)?;
    let signature = Signature::from_bytes(signature);

    key.verify_strict(message, &signature).map_err(|_| CryptoError::InvalidSignature)
}

/// Check that `public` decodes to a usable verification key.
///
/// # Errors
///
/// - `InvalidPublicKey` if decompression fails or the key has small order
pub fn validate_public_key(public: &[u8; PUBLIC_KEY_SIZE]) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_bytes(public).map_err(|_| CryptoError::InvalidPublicKey)?;
    if key.is_weak() {
        return Err(CryptoError::InvalidPublicKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let pair = SigningKeyPair::from_seed([3u8; 32]);
        let signature = sign(pair.secret_key(), b"payload");

        assert!(verify(pair.public_key(), b"payload", &signature).is_ok());
    }

    #[test]
    fn keypair_is_deterministic() {
        let a = SigningKeyPair::from_seed([9u8; 32]);
        let b = SigningKeyPair::from_seed([9u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn modified_message_fails() {
        let pair = SigningKeyPair::from_seed([3u8; 32]);
        let signature = sign(pair.secret_key(), b"payload");

        assert_eq!(
            verify(pair.public_key(), b"payloaD", &signature),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn flipped_signature_bit_fails() {
        let pair = SigningKeyPair::from_seed([3u8; 32]);
        let mut signature = sign(pair.secret_key(), b"payload");
        signature[10] ^= 0x01;

        assert!(verify(pair.public_key(), b"payload", &signature).is_err());
    }

    #[test]
    fn other_key_fails() {
        let signer = SigningKeyPair::from_seed([3u8; 32]);
        let other = SigningKeyPair::from_seed([4u8; 32]);
        let signature = sign(signer.secret_key(), b"payload");

        assert_eq!(
            verify(other.public_key(), b"payload", &signature),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn validate_accepts_real_key() {
        let pair = SigningKeyPair::from_seed([5u8; 32]);
        assert!(validate_public_key(pair.public_key()).is_ok());
    }

    #[test]
    fn validate_rejects_small_order_key() {
        // Identity point encoding
        let mut identity = [0u8; 32];
        identity[0] = 1;
        assert_eq!(validate_public_key(&identity), Err(CryptoError::InvalidPublicKey));
    }
}
