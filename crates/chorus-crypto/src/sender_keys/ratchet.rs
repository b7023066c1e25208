//! Sender chain key ratchet
//!
//! # Security Properties
//!
//! - Forward Secrecy: the next chain key is a one-way function of the current
//!   one, so a captured chain key reveals nothing about earlier iterations
//! - Domain Separation: chain and message derivations use distinct inputs
//! - Determinism: the same seed always produces the same key sequence

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use super::{derivation::MessageKey, error::CryptoError};

type HmacSha256 = Hmac<Sha256>;

/// HMAC input for deriving a message seed
const MESSAGE_KEY_SEED: &[u8] = &[0x01];

/// HMAC input for deriving the next chain key
const CHAIN_KEY_SEED: &[u8] = &[0x02];

/// One position on a sender's hash chain.
///
/// Each value is used at most once: to derive the message key for its own
/// iteration and the chain key for the following iteration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainKey {
    /// Position on the chain
    iteration: u32,
    /// 32-byte chain secret
    seed: [u8; 32],
}

impl ChainKey {
    /// Chain key at `iteration` holding `seed`.
    pub fn new(iteration: u32, seed: [u8; 32]) -> Self {
        Self { iteration, seed }
    }

    /// Position of this key on the chain.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Raw chain secret, as shared in distribution messages.
    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    /// Message key for this iteration.
    pub fn message_key(&self) -> MessageKey {
        let mut message_seed = self.derive(MESSAGE_KEY_SEED);
        let key = MessageKey::expand(self.iteration, &message_seed);
        message_seed.zeroize();
        key
    }

    /// Chain key for the following iteration.
    ///
    /// # Errors
    ///
    /// - `IterationOverflow` if this key sits at `u32::MAX`
    pub fn next(&self) -> Result<Self, CryptoError> {
        let iteration = self
            .iteration
            .checked_add(1)
            .ok_or(CryptoError::IterationOverflow { current: self.iteration })?;

        Ok(Self { iteration, seed: self.derive(CHAIN_KEY_SEED) })
    }

    fn derive(&self, input: &[u8]) -> [u8; 32] {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.seed) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac.update(input);
        let result = mac.finalize().into_bytes();

        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }
}

impl fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainKey").field("iteration", &self.iteration).finish_non_exhaustive()
    }
}

impl Drop for ChainKey {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}
