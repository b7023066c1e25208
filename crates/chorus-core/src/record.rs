//! Sender key record: the bounded, ordered list of states for one name.
//!
//! Oldest first, newest last. Adding a state past capacity evicts from the
//! front. Like [`SenderKeyState`], every mutation returns a new record.

use serde::{Deserialize, Serialize};

use crate::{state::SenderKeyState, storage::StorageError};

/// All sender key states held for one [`SenderKeyName`](crate::SenderKeyName).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderKeyRecord {
    states: Vec<SenderKeyState>,
}

impl SenderKeyRecord {
    /// Record with no states.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the record holds no state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of states held.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// States, oldest first.
    pub fn states(&self) -> &[SenderKeyState] {
        &self.states
    }

    /// Most recently added state.
    pub fn newest_state(&self) -> Option<&SenderKeyState> {
        self.states.last()
    }

    /// Newest state with `key_id`.
    pub fn state_for_key_id(&self, key_id: u32) -> Option<&SenderKeyState> {
        self.states.iter().rev().find(|state| state.key_id() == key_id)
    }

    /// Newest state holding a private signing key.
    pub fn sending_state(&self) -> Option<&SenderKeyState> {
        self.states.iter().rev().find(|state| state.is_sending())
    }

    /// Returns true if a state with `key_id` is already at or past
    /// `iteration`.
    pub fn covers(&self, key_id: u32, iteration: u32) -> bool {
        self.state_for_key_id(key_id).is_some_and(|held| held.iteration() >= iteration)
    }

    /// Record with `state` appended as the newest.
    ///
    /// A state already held under the same key id is replaced only when
    /// `state` is ahead of it; otherwise the record is returned unchanged so
    /// keys it has consumed stay consumed. Adding a sending state demotes
    /// every earlier sending state to verify-only, so the record never holds
    /// more than one private key. States beyond `max_states` are evicted
    /// oldest first.
    pub fn with_state(&self, state: SenderKeyState, max_states: usize) -> Self {
        if self.covers(state.key_id(), state.iteration()) {
            return self.clone();
        }

        let mut states: Vec<SenderKeyState> = self
            .states
            .iter()
            .filter(|existing| existing.key_id() != state.key_id())
            .map(|existing| {
                if state.is_sending() && existing.is_sending() {
                    existing.demoted()
                } else {
                    existing.clone()
                }
            })
            .collect();
        states.push(state);

        let excess = states.len().saturating_sub(max_states.max(1));
        states.drain(..excess);

        Self { states }
    }

    /// Record with the newest state matching `state`'s key id replaced,
    /// keeping its position. Appends if no state has that key id.
    pub fn with_updated_state(&self, state: SenderKeyState) -> Self {
        let mut states = self.states.clone();
        match states.iter().rposition(|existing| existing.key_id() == state.key_id()) {
            Some(index) => states[index] = state,
            None => states.push(state),
        }
        Self { states }
    }

    /// Serialize for storage (CBOR).
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(self, &mut out)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(out)
    }

    /// Deserialize a stored record.
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        ciborium::de::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chorus_crypto::{ChainKey, SigningKeyPair};

    use super::*;
    use crate::config::SenderKeyConfig;

    fn receiving(key_id: u32) -> SenderKeyState {
        let pair = SigningKeyPair::from_seed([key_id as u8; 32]);
        SenderKeyState::new_receiving(key_id, ChainKey::new(0, [1u8; 32]), *pair.public_key())
    }

    fn sending(key_id: u32) -> SenderKeyState {
        let pair = SigningKeyPair::from_seed([key_id as u8; 32]);
        SenderKeyState::new_sending(key_id, ChainKey::new(0, [1u8; 32]), &pair)
    }

    fn two_states() -> SenderKeyRecord {
        SenderKeyRecord::empty().with_state(receiving(1), 5).with_state(receiving(2), 5)
    }

    #[test]
    fn empty_record_has_no_states() {
        let record = SenderKeyRecord::empty();
        assert!(record.is_empty());
        assert!(record.newest_state().is_none());
        assert!(record.sending_state().is_none());
    }

    #[test]
    fn with_state_appends_newest_last() {
        let record = two_states();

        assert_eq!(record.len(), 2);
        assert_eq!(record.newest_state().map(SenderKeyState::key_id), Some(2));
        assert!(record.state_for_key_id(1).is_some());
        assert!(record.state_for_key_id(3).is_none());
    }

    #[test]
    fn with_state_evicts_oldest() {
        let mut record = SenderKeyRecord::empty();
        for key_id in 1..=7 {
            record = record.with_state(receiving(key_id), 5);
        }

        let ids: Vec<u32> = record.states().iter().map(SenderKeyState::key_id).collect();
        assert_eq!(ids, [3, 4, 5, 6, 7]);
    }

    #[test]
    fn with_state_replaces_same_key_id_when_ahead() {
        let record = two_states();
        let pair = SigningKeyPair::from_seed([1u8; 32]);
        let ahead =
            SenderKeyState::new_receiving(1, ChainKey::new(7, [1u8; 32]), *pair.public_key());

        let record = record.with_state(ahead, 5);

        let ids: Vec<u32> = record.states().iter().map(SenderKeyState::key_id).collect();
        assert_eq!(ids, [2, 1]);
        assert_eq!(record.state_for_key_id(1).map(SenderKeyState::iteration), Some(7));
    }

    #[test]
    fn with_state_keeps_advanced_state_for_same_key_id() {
        let (_, advanced) =
            receiving(1).resolve_message_key(3, &SenderKeyConfig::default()).unwrap();
        let record = SenderKeyRecord::empty().with_state(advanced, 5);
        assert!(record.covers(1, 4));
        assert!(!record.covers(1, 5));

        // Same key id at its starting iteration: behind the held state
        let unchanged = record.with_state(receiving(1), 5);
        assert_eq!(unchanged, record);
        assert_eq!(unchanged.state_for_key_id(1).map(SenderKeyState::iteration), Some(4));
        assert!(unchanged.state_for_key_id(1).unwrap().has_message_key(0));
    }

    #[test]
    fn with_state_never_replaces_sending_state_with_its_own_copy() {
        let record = SenderKeyRecord::empty().with_state(sending(1), 5);
        let copy = SenderKeyState::from_distribution(
            &record.sending_state().unwrap().distribution_message(),
        );

        let record = record.with_state(copy, 5);
        assert_eq!(record.sending_state().map(SenderKeyState::key_id), Some(1));
    }

    #[test]
    fn new_sending_state_demotes_previous() {
        let record = SenderKeyRecord::empty().with_state(sending(1), 5).with_state(sending(2), 5);

        assert_eq!(record.sending_state().map(SenderKeyState::key_id), Some(2));
        let old = record.state_for_key_id(1).unwrap();
        assert!(!old.is_sending());
    }

    #[test]
    fn with_updated_state_keeps_position() {
        let record = two_states();
        let (_, advanced) = record
            .state_for_key_id(1)
            .unwrap()
            .resolve_message_key(3, &SenderKeyConfig::default())
            .unwrap();

        let updated = record.with_updated_state(advanced);

        assert_eq!(updated.states()[0].iteration(), 4);
        assert_eq!(updated.newest_state().map(SenderKeyState::key_id), Some(2));
        assert_eq!(record.states()[0].iteration(), 0);
    }

    #[test]
    fn encode_decode_preserves_states() {
        let (_, advanced) =
            receiving(1).resolve_message_key(3, &SenderKeyConfig::default()).unwrap();
        let record = SenderKeyRecord::empty().with_state(advanced, 5).with_state(sending(2), 5);

        let decoded = SenderKeyRecord::decode(&record.encode().unwrap()).unwrap();

        assert_eq!(decoded, record);
        let restored = decoded.state_for_key_id(1).unwrap();
        assert!(restored.has_message_key(0));
        assert!(decoded.sending_state().is_some());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            SenderKeyRecord::decode(&[0xFF, 0x00]),
            Err(StorageError::Serialization(_))
        ));
    }
}
