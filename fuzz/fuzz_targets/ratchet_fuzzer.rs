//! Fuzz target for sender key state resolution
//!
//! Drives a sender and a receiver state through arbitrary sequences of
//! encrypt steps and out-of-order, replayed or far-future resolutions.
//!
//! # Strategy
//!
//! - Arbitrary chain seeds and starting iterations (including near u32::MAX)
//! - Targets behind, at and ahead of the receiver's chain
//! - Small skip and cache limits so eviction is exercised
//!
//! # Invariants
//!
//! - Resolution never panics
//! - A resolved key always matches the key the sender derived for that
//!   iteration
//! - A key is never resolved twice
//! - Failed resolution leaves the state untouched (it is a value)
//! - The skipped-key cache never exceeds its capacity

#![no_main]

use std::collections::{BTreeMap, BTreeSet};

use arbitrary::Arbitrary;
use chorus_core::{SenderKeyConfig, SenderKeyState};
use chorus_crypto::{
    Aes256CbcCipher, ChaCha20Poly1305Cipher, ChainKey, MessageCipher, SigningKeyPair,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct RatchetScenario {
    seed: [u8; 32],
    start: StartIteration,
    max_skip: u8,
    max_message_keys: u8,
    operations: Vec<Operation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum StartIteration {
    Zero,
    Small(u8),
    NearMax(u8),
}

impl StartIteration {
    fn value(&self) -> u32 {
        match self {
            StartIteration::Zero => 0,
            StartIteration::Small(n) => u32::from(*n),
            StartIteration::NearMax(n) => u32::MAX - u32::from(*n),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Operation {
    /// Sender produces the next message key
    Send,
    /// Receiver resolves an iteration relative to its chain
    Resolve { offset: i16 },
    /// Round trip a payload through both ciphers with the last sent key
    RoundTrip { payload: Vec<u8> },
}

fuzz_target!(|scenario: RatchetScenario| {
    let config = SenderKeyConfig {
        max_skip: u32::from(scenario.max_skip),
        max_message_keys: usize::from(scenario.max_message_keys),
        max_states: 5,
    };
    let start = scenario.start.value();
    let pair = SigningKeyPair::from_seed([7u8; 32]);

    let mut sender = SenderKeyState::new_sending(1, ChainKey::new(start, scenario.seed), &pair);
    let mut receiver = SenderKeyState::from_distribution(&sender.distribution_message());

    let mut sent = BTreeMap::new();
    let mut consumed = BTreeSet::new();

    for operation in scenario.operations {
        match operation {
            Operation::Send => {
                if let Ok((key, next)) = sender.encrypt_step() {
                    sent.insert(key.iteration(), key);
                    sender = next;
                }
            },

            Operation::Resolve { offset } => {
                let Some(target) = receiver.iteration().checked_add_signed(i32::from(offset)) else {
                    continue;
                };
                let before = receiver.clone();

                match receiver.resolve_message_key(target, &config) {
                    Ok((key, next)) => {
                        assert_eq!(key.iteration(), target);
                        assert!(consumed.insert(target), "iteration {target} resolved twice");
                        if let Some(expected) = sent.get(&target) {
                            assert_eq!(&key, expected, "receiver and sender disagree");
                        }
                        assert!(next.message_key_count() <= config.max_message_keys);
                        receiver = next;
                    },
                    Err(_) => assert_eq!(receiver, before, "failed resolution changed state"),
                }
            },

            Operation::RoundTrip { payload } => {
                let Some(key) = sent.values().next_back() else {
                    continue;
                };

                let aes = Aes256CbcCipher;
                let ciphertext = aes.encrypt(key, &payload).expect("aes encrypt");
                assert_eq!(aes.decrypt(key, &ciphertext).expect("aes decrypt"), payload);

                let chacha = ChaCha20Poly1305Cipher;
                let mut ciphertext = chacha.encrypt(key, &payload).expect("chacha encrypt");
                assert_eq!(chacha.decrypt(key, &ciphertext).expect("chacha decrypt"), payload);
                ciphertext[0] ^= 0x01;
                assert!(chacha.decrypt(key, &ciphertext).is_err(), "tampered AEAD must fail");
            },
        }
    }
});
