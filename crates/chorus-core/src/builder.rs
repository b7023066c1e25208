//! Group session builder: creates local sender key states and ingests peers'.
//!
//! A sender calls [`GroupSessionBuilder::create`] once per group and sends
//! the returned [`DistributionMessage`] to every member over the pairwise
//! channel. Each member calls [`GroupSessionBuilder::process`] with it under
//! the sender's [`SenderKeyName`], after which they can decrypt that
//! sender's group messages.

use chorus_crypto::{ChainKey, SigningKeyPair};

use crate::{
    config::SenderKeyConfig,
    env::{Environment, SystemEnv},
    error::SenderKeyError,
    name::SenderKeyName,
    protocol::DistributionMessage,
    queue::SerialQueue,
    state::SenderKeyState,
    storage::{SenderKeyStore, load_or_empty},
};

/// Creates and ingests sender key states.
///
/// Every operation is a load-modify-store cycle on one record and runs
/// inside the shared serialization queue, so it never interleaves with a
/// [`GroupCipher`](crate::GroupCipher) call for the same name.
#[derive(Clone)]
pub struct GroupSessionBuilder<S, E = SystemEnv> {
    store: S,
    queue: SerialQueue<SenderKeyName>,
    env: E,
    config: SenderKeyConfig,
}

impl<S: SenderKeyStore> GroupSessionBuilder<S> {
    /// Builder backed by the OS RNG.
    pub fn new(store: S, queue: SerialQueue<SenderKeyName>) -> Self {
        Self::with_env(store, queue, SystemEnv::new())
    }
}

impl<S: SenderKeyStore, E: Environment> GroupSessionBuilder<S, E> {
    /// Builder drawing key ids, chain seeds and signing keys from `env`.
    pub fn with_env(store: S, queue: SerialQueue<SenderKeyName>, env: E) -> Self {
        Self { store, queue, env, config: SenderKeyConfig::default() }
    }

    /// Replace the default limits.
    #[must_use]
    pub fn with_config(mut self, config: SenderKeyConfig) -> Self {
        self.config = config;
        self
    }

    /// Distribution message for the local sender state under `name`,
    /// creating the state first if the record is empty.
    ///
    /// Idempotent: once a state exists, repeated calls return a message for
    /// the newest state and store nothing.
    pub async fn create(
        &self,
        name: &SenderKeyName,
    ) -> Result<DistributionMessage, SenderKeyError> {
        let (store, env, config) = (self.store.clone(), self.env.clone(), self.config);
        let name = name.clone();

        self.queue
            .run(name.clone(), async move {
                let record = load_or_empty(&store, &name).await?;
                if let Some(state) = record.newest_state() {
                    return Ok(state.distribution_message());
                }

                let state = new_sending_state(&env);
                let message = state.distribution_message();
                let record = record.with_state(state, config.max_states);
                store.store_sender_key(&name, &record).await?;

                tracing::debug!(%name, key_id = message.key_id(), "created sender key state");
                Ok::<_, SenderKeyError>(message)
            })
            .await?
    }

    /// Start a fresh local sender state under `name`.
    ///
    /// The previous sending state is kept verify-only, so messages already in
    /// flight still decrypt for members that have it, and only the new state
    /// signs from here on. Members must process the returned message before
    /// they can read anything encrypted after the rotation.
    pub async fn rotate(
        &self,
        name: &SenderKeyName,
    ) -> Result<DistributionMessage, SenderKeyError> {
        let (store, env, config) = (self.store.clone(), self.env.clone(), self.config);
        let name = name.clone();

        self.queue
            .run(name.clone(), async move {
                let record = load_or_empty(&store, &name).await?;

                let state = new_sending_state(&env);
                let message = state.distribution_message();
                let record = record.with_state(state, config.max_states);
                store.store_sender_key(&name, &record).await?;

                tracing::debug!(
                    %name,
                    key_id = message.key_id(),
                    states = record.len(),
                    "rotated sender key state"
                );
                Ok::<_, SenderKeyError>(message)
            })
            .await?
    }

    /// Add a verify-only state for the sender behind `name`.
    ///
    /// Freshness is the caller's concern: the message must arrive over an
    /// authenticated channel once per sender key. A message for a key id
    /// already held replaces that state only if it is ahead of it; a
    /// duplicate or older one is ignored so consumed keys cannot be derived
    /// again.
    pub async fn process(
        &self,
        name: &SenderKeyName,
        message: &DistributionMessage,
    ) -> Result<(), SenderKeyError> {
        let (store, config) = (self.store.clone(), self.config);
        let name = name.clone();
        let state = SenderKeyState::from_distribution(message);

        self.queue
            .run(name.clone(), async move {
                let key_id = state.key_id();
                let iteration = state.iteration();

                let record = load_or_empty(&store, &name).await?;
                if record.covers(key_id, iteration) {
                    tracing::debug!(%name, key_id, iteration, "ignored stale distribution message");
                    return Ok(());
                }

                let record = record.with_state(state, config.max_states);
                store.store_sender_key(&name, &record).await?;

                tracing::debug!(%name, key_id, iteration, "processed distribution message");
                Ok::<_, SenderKeyError>(())
            })
            .await?
    }

    /// Parse a serialized distribution message and [`process`](Self::process)
    /// it.
    pub async fn process_bytes(
        &self,
        name: &SenderKeyName,
        bytes: &[u8],
    ) -> Result<(), SenderKeyError> {
        let message = DistributionMessage::decode(bytes)?;
        self.process(name, &message).await
    }
}

fn new_sending_state<E: Environment>(env: &E) -> SenderKeyState {
    let key_id = env.random_key_id();
    let chain_key = ChainKey::new(0, env.random_seed());
    let signing_key = SigningKeyPair::from_seed(env.random_seed());

    SenderKeyState::new_sending(key_id, chain_key, &signing_key)
}
