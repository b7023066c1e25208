//! Group cipher: encrypt and decrypt for one [`SenderKeyName`].
//!
//! Each call is one load-modify-store cycle on the name's record, run inside
//! the serialization queue. Every check and the cipher itself run before the
//! store, so a failed call leaves the stored record exactly as it was.

use chorus_crypto::{Aes256CbcCipher, MessageCipher};

use crate::{
    config::SenderKeyConfig,
    error::SenderKeyError,
    name::SenderKeyName,
    protocol::SenderKeyMessage,
    queue::SerialQueue,
    storage::{SenderKeyStore, load_or_empty},
};

/// Encrypts as, or decrypts from, the sender behind one [`SenderKeyName`].
///
/// For the local identity, `encrypt` uses the sending state created by
/// [`GroupSessionBuilder::create`](crate::GroupSessionBuilder::create). For a
/// peer, `decrypt` uses states added by
/// [`GroupSessionBuilder::process`](crate::GroupSessionBuilder::process).
#[derive(Clone)]
pub struct GroupCipher<S, C = Aes256CbcCipher> {
    store: S,
    queue: SerialQueue<SenderKeyName>,
    name: SenderKeyName,
    cipher: C,
    config: SenderKeyConfig,
}

impl<S: SenderKeyStore> GroupCipher<S> {
    /// Cipher for `name` using AES-256-CBC.
    pub fn new(store: S, queue: SerialQueue<SenderKeyName>, name: SenderKeyName) -> Self {
        Self { store, queue, name, cipher: Aes256CbcCipher, config: SenderKeyConfig::default() }
    }
}

impl<S: SenderKeyStore, C: MessageCipher> GroupCipher<S, C> {
    /// Swap the symmetric cipher. Every member of a group must use the same
    /// one.
    pub fn with_cipher<D: MessageCipher>(self, cipher: D) -> GroupCipher<S, D> {
        GroupCipher {
            store: self.store,
            queue: self.queue,
            name: self.name,
            cipher,
            config: self.config,
        }
    }

    /// Replace the default limits.
    #[must_use]
    pub fn with_config(mut self, config: SenderKeyConfig) -> Self {
        self.config = config;
        self
    }

    /// Name this cipher operates on.
    pub fn name(&self) -> &SenderKeyName {
        &self.name
    }

    /// Encrypt `plaintext` as the local sender and return the signed wire
    /// message.
    ///
    /// The chain advances exactly once per successful call.
    ///
    /// # Errors
    ///
    /// - `NoActiveSendingState` if no state under this name holds a private
    ///   signing key
    /// - `CryptoFailure` if the cipher fails or the chain is exhausted
    /// - `InvalidMessage` if the envelope would exceed the wire size limit
    /// - `Storage` / `Queue` on infrastructure failure
    pub async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, SenderKeyError> {
        let (store, cipher) = (self.store.clone(), self.cipher.clone());
        let name = self.name.clone();
        let plaintext = plaintext.to_vec();

        self.queue
            .run(name.clone(), async move {
                let record = load_or_empty(&store, &name).await?;
                let state = record.sending_state().ok_or(SenderKeyError::NoActiveSendingState)?;
                let signing_key =
                    state.signing_private_key().ok_or(SenderKeyError::NoActiveSendingState)?;

                let (message_key, next_state) = state.encrypt_step()?;
                let ciphertext = cipher
                    .encrypt(&message_key, &plaintext)
                    .map_err(|_| SenderKeyError::CryptoFailure)?;
                let message = SenderKeyMessage::new_signed(
                    state.key_id(),
                    message_key.iteration(),
                    ciphertext,
                    signing_key,
                )?;

                let record = record.with_updated_state(next_state);
                store.store_sender_key(&name, &record).await?;

                tracing::debug!(
                    %name,
                    key_id = message.key_id(),
                    iteration = message.iteration(),
                    "encrypted group message"
                );
                Ok::<_, SenderKeyError>(message.into_bytes())
            })
            .await?
    }

    /// Verify and decrypt a wire message from the sender behind this name.
    ///
    /// # Errors
    ///
    /// - `InvalidMessage` if the bytes do not parse
    /// - `NoSessionForKey` if no state has the message's key id
    /// - `SignatureInvalid` if the signature does not verify
    /// - `OutdatedOrReplayedMessage` if the iteration was already consumed
    /// - `IterationGapTooLarge` if the iteration is too far ahead
    /// - `CryptoFailure` if the cipher fails
    /// - `Storage` / `Queue` on infrastructure failure
    pub async fn decrypt(&self, bytes: &[u8]) -> Result<Vec<u8>, SenderKeyError> {
        let (store, cipher, config) = (self.store.clone(), self.cipher.clone(), self.config);
        let name = self.name.clone();
        let bytes = bytes.to_vec();

        self.queue
            .run(name.clone(), async move {
                let message = SenderKeyMessage::decode(&bytes)?;
                let (key_id, iteration) = (message.key_id(), message.iteration());

                let record = load_or_empty(&store, &name).await?;
                let Some(state) = record.state_for_key_id(key_id) else {
                    tracing::warn!(%name, key_id, iteration, "no session for key id");
                    return Err(SenderKeyError::NoSessionForKey { key_id });
                };

                if message.verify_signature(state.signing_public_key()).is_err() {
                    tracing::warn!(%name, key_id, iteration, "rejected message signature");
                    return Err(SenderKeyError::SignatureInvalid);
                }

                let (message_key, next_state) =
                    state.resolve_message_key(iteration, &config).inspect_err(|error| {
                        tracing::warn!(%name, key_id, iteration, %error, "rejected message");
                    })?;

                let plaintext = cipher
                    .decrypt(&message_key, message.ciphertext())
                    .map_err(|_| SenderKeyError::CryptoFailure)?;

                let skipped = next_state.message_key_count();
                let record = record.with_updated_state(next_state);
                store.store_sender_key(&name, &record).await?;

                tracing::debug!(%name, key_id, iteration, skipped, "decrypted group message");
                Ok::<_, SenderKeyError>(plaintext)
            })
            .await?
    }
}

#[cfg(test)]
mod tests {
    use chorus_crypto::{ChaCha20Poly1305Cipher, CryptoError, MessageKey};

    use super::*;
    use crate::{builder::GroupSessionBuilder, storage::MemorySenderKeyStore};

    #[derive(Clone)]
    struct FailingCipher;

    impl MessageCipher for FailingCipher {
        fn encrypt(&self, _: &MessageKey, _: &[u8]) -> Result<Vec<u8>, CryptoError> {
            Err(CryptoError::EncryptionFailed { reason: "injected".to_string() })
        }

        fn decrypt(&self, _: &MessageKey, _: &[u8]) -> Result<Vec<u8>, CryptoError> {
            Err(CryptoError::DecryptionFailed { reason: "injected".to_string() })
        }
    }

    async fn sending_cipher() -> GroupCipher<MemorySenderKeyStore> {
        let store = MemorySenderKeyStore::new();
        let queue = SerialQueue::new();
        let name = SenderKeyName::new("g", "alice");

        GroupSessionBuilder::new(store.clone(), queue.clone()).create(&name).await.unwrap();
        GroupCipher::new(store, queue, name)
    }

    #[tokio::test]
    async fn encrypt_without_state_fails() {
        let cipher = GroupCipher::new(
            MemorySenderKeyStore::new(),
            SerialQueue::new(),
            SenderKeyName::new("g", "alice"),
        );

        assert_eq!(cipher.encrypt(b"hi").await, Err(SenderKeyError::NoActiveSendingState));
    }

    #[tokio::test]
    async fn encrypt_numbers_messages_from_zero() {
        let cipher = sending_cipher().await;

        for expected in 0..3 {
            let bytes = cipher.encrypt(b"hi").await.unwrap();
            assert_eq!(SenderKeyMessage::decode(&bytes).unwrap().iteration(), expected);
        }
    }

    #[tokio::test]
    async fn chacha_round_trip_between_members() {
        let alice = sending_cipher().await.with_cipher(ChaCha20Poly1305Cipher);
        let distribution = GroupSessionBuilder::new(alice.store.clone(), alice.queue.clone())
            .create(alice.name())
            .await
            .unwrap();

        let bob_store = MemorySenderKeyStore::new();
        let bob_queue = SerialQueue::new();
        GroupSessionBuilder::new(bob_store.clone(), bob_queue.clone())
            .process(alice.name(), &distribution)
            .await
            .unwrap();
        let bob = GroupCipher::new(bob_store, bob_queue, alice.name().clone())
            .with_cipher(ChaCha20Poly1305Cipher);

        let bytes = alice.encrypt(b"over chacha").await.unwrap();
        assert_eq!(bob.decrypt(&bytes).await.unwrap(), b"over chacha");
    }

    #[tokio::test]
    async fn sender_cannot_decrypt_consumed_iteration() {
        let cipher = sending_cipher().await;

        let bytes = cipher.encrypt(b"to myself").await.unwrap();
        assert_eq!(
            cipher.decrypt(&bytes).await,
            Err(SenderKeyError::OutdatedOrReplayedMessage { current: 1, target: 0 })
        );
    }

    #[tokio::test]
    async fn failing_cipher_does_not_advance_chain() {
        let cipher = sending_cipher().await;
        let failing = cipher.clone().with_cipher(FailingCipher);

        assert_eq!(failing.encrypt(b"hi").await, Err(SenderKeyError::CryptoFailure));

        let bytes = cipher.encrypt(b"hi").await.unwrap();
        assert_eq!(SenderKeyMessage::decode(&bytes).unwrap().iteration(), 0);
    }

    #[tokio::test]
    async fn decrypt_rejects_garbage() {
        let cipher = sending_cipher().await;
        assert!(matches!(
            cipher.decrypt(&[0x33, 0x00]).await,
            Err(SenderKeyError::InvalidMessage(_))
        ));
    }
}
