//! Chorus Cryptographic Primitives
//!
//! Cryptographic building blocks for Chorus sender keys. Pure functions with
//! deterministic outputs. Callers provide random bytes (chain seeds, signing
//! seeds) so every derivation is reproducible in tests.
//!
//! # Key Lifecycle
//!
//! A sender generates one random chain seed per sender-key state and shares it
//! with the group through a distribution message. Every member then walks the
//! same one-way chain, deriving a single-use message key per iteration.
//!
//! ```text
//! Chain Seed (iteration N)
//!        │
//!        ├── HMAC(seed, 0x02) → Chain Seed (iteration N+1)
//!        │
//!        └── HMAC(seed, 0x01) → Message Seed
//!                                    │
//!                                    ▼ HKDF-Expand (48 bytes)
//!                              IV (16) ‖ Cipher Key (32)
//!                                    │
//!                                    ▼
//!                              Symmetric Cipher → Ciphertext
//! ```
//!
//! # Security
//!
//! Forward Secrecy:
//! - Chain stepping is one-way: the next seed never reveals the previous one
//! - Message keys are single-use and zeroized on drop
//!
//! Authenticity:
//! - Every envelope is signed with the sender's Ed25519 key
//! - Receivers hold only the public half and verify before decrypting
//!
//! Domain Separation:
//! - Chain and message derivations use distinct single-byte HMAC inputs, so a
//!   message seed is independent of the next chain seed

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod sender_keys;

pub use sender_keys::{
    Aes256CbcCipher, ChaCha20Poly1305Cipher, ChainKey, CryptoError, MessageCipher, MessageKey,
    PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE, SigningKeyPair, sign, validate_public_key,
    verify,
};
