//! One sender key state: a chain, its signing key and skipped message keys.
//!
//! States are values. Every operation that would advance the chain returns
//! the message key together with a new state and leaves `self` untouched, so
//! a caller that fails after resolution simply drops the new state and
//! nothing has moved.
//!
//! ```text
//! current = 5, target = 8
//!
//!   chain:  [5] ──▶ [6] ──▶ [7] ──▶ [8] ──▶ [9]
//!            │       │       │       │
//!            ▼       ▼       ▼       ▼
//!         cached  cached  cached  returned     new chain = 9
//! ```

use std::{collections::BTreeMap, fmt};

use chorus_crypto::{ChainKey, MessageKey, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SigningKeyPair};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{config::SenderKeyConfig, error::SenderKeyError, protocol::DistributionMessage};

/// A sender key state.
///
/// Sending states hold the private signing key and exist only in the record
/// of the local identity. Receiving states hold only the public key and may
/// only verify.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderKeyState {
    key_id: u32,
    chain_key: ChainKey,
    signing_public_key: [u8; PUBLIC_KEY_SIZE],
    signing_private_key: Option<[u8; SECRET_KEY_SIZE]>,
    message_keys: BTreeMap<u32, MessageKey>,
}

impl SenderKeyState {
    /// Sending state for the local identity.
    pub fn new_sending(key_id: u32, chain_key: ChainKey, signing_key: &SigningKeyPair) -> Self {
        Self {
            key_id,
            chain_key,
            signing_public_key: *signing_key.public_key(),
            signing_private_key: Some(*signing_key.secret_key()),
            message_keys: BTreeMap::new(),
        }
    }

    /// Receiving (verify-only) state for a remote sender.
    pub fn new_receiving(
        key_id: u32,
        chain_key: ChainKey,
        signing_public_key: [u8; PUBLIC_KEY_SIZE],
    ) -> Self {
        Self {
            key_id,
            chain_key,
            signing_public_key,
            signing_private_key: None,
            message_keys: BTreeMap::new(),
        }
    }

    /// Receiving state seeded from a distribution message.
    pub fn from_distribution(message: &DistributionMessage) -> Self {
        Self::new_receiving(
            message.key_id(),
            ChainKey::new(message.iteration(), *message.chain_key()),
            *message.signing_key(),
        )
    }

    /// Distribution message describing this state at its current iteration.
    pub fn distribution_message(&self) -> DistributionMessage {
        DistributionMessage::new(
            self.key_id,
            self.chain_key.iteration(),
            *self.chain_key.seed(),
            self.signing_public_key,
        )
    }

    /// Sender key id.
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    /// Current chain key.
    pub fn chain_key(&self) -> &ChainKey {
        &self.chain_key
    }

    /// Iteration of the next message key this state will derive.
    pub fn iteration(&self) -> u32 {
        self.chain_key.iteration()
    }

    /// Public signing key.
    pub fn signing_public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.signing_public_key
    }

    /// Private signing key, present only on sending states.
    pub fn signing_private_key(&self) -> Option<&[u8; SECRET_KEY_SIZE]> {
        self.signing_private_key.as_ref()
    }

    /// Returns true if this state can sign.
    pub fn is_sending(&self) -> bool {
        self.signing_private_key.is_some()
    }

    /// Number of cached skipped message keys.
    pub fn message_key_count(&self) -> usize {
        self.message_keys.len()
    }

    /// Returns true if a skipped key for `iteration` is cached.
    pub fn has_message_key(&self, iteration: u32) -> bool {
        self.message_keys.contains_key(&iteration)
    }

    /// Copy of this state without the private signing key.
    pub fn demoted(&self) -> Self {
        let mut state = self.clone();
        if let Some(mut secret) = state.signing_private_key.take() {
            secret.zeroize();
        }
        state
    }

    /// Message key for the current iteration and the state after it.
    ///
    /// # Errors
    ///
    /// - `CryptoFailure` if the chain is exhausted at `u32::MAX`
    pub fn encrypt_step(&self) -> Result<(MessageKey, Self), SenderKeyError> {
        let message_key = self.chain_key.message_key();

        let mut next = self.clone();
        next.chain_key = self.chain_key.next().map_err(|_| SenderKeyError::CryptoFailure)?;

        Ok((message_key, next))
    }

    /// Message key for `target` and the state after consuming it.
    ///
    /// Behind the chain, the key must come from the skipped cache and is
    /// removed from it. At or ahead of the chain, the chain walks forward to
    /// `target`, caching every key it passes, and ends at `target + 1`.
    ///
    /// # Errors
    ///
    /// - `OutdatedOrReplayedMessage` if `target` is behind the chain and not
    ///   cached
    /// - `IterationGapTooLarge` if `target - current > max_skip`
    /// - `CryptoFailure` if the chain is exhausted at `u32::MAX`
    pub fn resolve_message_key(
        &self,
        target: u32,
        config: &SenderKeyConfig,
    ) -> Result<(MessageKey, Self), SenderKeyError> {
        let current = self.chain_key.iteration();

        if target < current {
            let mut next = self.clone();
            return match next.message_keys.remove(&target) {
                Some(message_key) => Ok((message_key, next)),
                None => Err(SenderKeyError::OutdatedOrReplayedMessage { current, target }),
            };
        }

        if target - current > config.max_skip {
            return Err(SenderKeyError::IterationGapTooLarge {
                current,
                target,
                max_skip: config.max_skip,
            });
        }

        let mut next = self.clone();
        let mut chain = self.chain_key.clone();
        while chain.iteration() < target {
            next.cache_message_key(chain.message_key(), config.max_message_keys);
            chain = chain.next().map_err(|_| SenderKeyError::CryptoFailure)?;
        }

        let message_key = chain.message_key();
        next.chain_key = chain.next().map_err(|_| SenderKeyError::CryptoFailure)?;

        Ok((message_key, next))
    }

    /// Cache a skipped key, evicting the lowest iterations past `capacity`.
    fn cache_message_key(&mut self, message_key: MessageKey, capacity: usize) {
        self.message_keys.insert(message_key.iteration(), message_key);
        while self.message_keys.len() > capacity {
            self.message_keys.pop_first();
        }
    }
}

impl fmt::Debug for SenderKeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderKeyState")
            .field("key_id", &self.key_id)
            .field("iteration", &self.chain_key.iteration())
            .field("sending", &self.is_sending())
            .field("message_keys", &self.message_keys.len())
            .finish_non_exhaustive()
    }
}

impl Drop for SenderKeyState {
    fn drop(&mut self) {
        if let Some(secret) = self.signing_private_key.as_mut() {
            secret.zeroize();
        }
    }
}
