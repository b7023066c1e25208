//! Sender Keys: one ciphertext per message, decryptable by every member
//!
//! A sender owns a symmetric hash ratchet and an Ed25519 signing key. Group
//! members receive the ratchet seed and the public signing key once, then
//! follow the sender's chain independently.
//!
//! # Architecture
//!
//! ```text
//! ChainKey[iteration]
//!        │
//!        ▼ HMAC-SHA256(seed, 0x01)
//! Message Seed
//!        │
//!        ▼ HKDF-Expand
//! MessageKey { iv, cipher_key }
//!        │
//!        ▼ MessageCipher
//! Ciphertext ── sign(secret) ──▶ authenticated envelope
//! ```
//!
//! # Security Properties
//!
//! - Forward Secrecy: chain seeds are overwritten by their successors
//! - Single Use: each message key is consumed by exactly one operation
//! - Sender Authentication: signatures bind ciphertext to the sender

pub mod derivation;
pub mod encryption;
pub mod error;
pub mod ratchet;
pub mod signing;

pub use derivation::MessageKey;
pub use encryption::{Aes256CbcCipher, ChaCha20Poly1305Cipher, MessageCipher};
pub use error::CryptoError;
pub use ratchet::ChainKey;
pub use signing::{
    PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE, SigningKeyPair, sign, validate_public_key,
    verify,
};
