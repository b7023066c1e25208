//! Property-based tests for the sender key primitives
//!
//! 1. **Determinism**: the same seed always yields the same chain
//! 2. **Key uniqueness**: different iterations yield different message keys
//! 3. **Authenticity**: any single-bit change to a signed message is rejected

use chorus_crypto::{ChainKey, MessageKey, SigningKeyPair, sign, verify};
use proptest::prelude::*;

fn walk(seed: [u8; 32], steps: u32) -> ChainKey {
    let mut chain = ChainKey::new(0, seed);
    for _ in 0..steps {
        chain = chain.next().unwrap();
    }
    chain
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_chain_deterministic(seed in any::<[u8; 32]>(), steps in 0u32..64) {
        let a = walk(seed, steps);
        let b = walk(seed, steps);

        prop_assert_eq!(a.iteration(), steps);
        prop_assert_eq!(a.seed(), b.seed());
        prop_assert_eq!(a.message_key(), b.message_key());
    }

    #[test]
    fn prop_message_keys_unique(seed in any::<[u8; 32]>(), steps in 2u32..64) {
        let keys: Vec<MessageKey> = (0..steps).map(|i| walk(seed, i).message_key()).collect();

        for (i, a) in keys.iter().enumerate() {
            prop_assert_eq!(a.iteration(), i as u32);
            for b in &keys[i + 1..] {
                prop_assert_ne!(a.cipher_key(), b.cipher_key());
                prop_assert_ne!(a.iv(), b.iv());
            }
        }
    }

    #[test]
    fn prop_message_seed_differs_from_next_chain_seed(seed in any::<[u8; 32]>()) {
        let chain = ChainKey::new(0, seed);
        let next = chain.next().unwrap();
        let direct = MessageKey::expand(0, next.seed());

        let chain_message = chain.message_key();
        prop_assert_ne!(chain_message.cipher_key(), direct.cipher_key());
    }

    #[test]
    fn prop_signature_rejects_bit_flips(
        signing_seed in any::<[u8; 32]>(),
        message in prop::collection::vec(any::<u8>(), 1..128),
        flip in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let pair = SigningKeyPair::from_seed(signing_seed);
        let signature = sign(pair.secret_key(), &message);
        prop_assert!(verify(pair.public_key(), &message, &signature).is_ok());

        let mut tampered = message.clone();
        let index = flip.index(tampered.len());
        tampered[index] ^= 1 << bit;
        prop_assert!(verify(pair.public_key(), &tampered, &signature).is_err());
    }
}
