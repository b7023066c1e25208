//! Error types for sender key primitives

use thiserror::Error;

/// Errors from sender key cryptographic primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Symmetric encryption failed
    #[error("encryption failed: {reason}")]
    EncryptionFailed {
        /// Reason for encryption failure
        reason: String,
    },

    /// Decryption failed (bad padding, authentication tag mismatch, wrong key)
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for decryption failure
        reason: String,
    },

    /// Bytes do not encode a usable Ed25519 public key
    #[error("invalid signing public key")]
    InvalidPublicKey,

    /// Signature does not verify under the given public key
    #[error("invalid signature")]
    InvalidSignature,

    /// Chain iteration would overflow
    #[error("chain iteration overflow at {current}")]
    IterationOverflow {
        /// Iteration when overflow was detected
        current: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CryptoError::DecryptionFailed { reason: "bad padding".to_string() };
        assert_eq!(err.to_string(), "decryption failed: bad padding");

        let err = CryptoError::IterationOverflow { current: u32::MAX };
        assert_eq!(err.to_string(), format!("chain iteration overflow at {}", u32::MAX));
    }
}
