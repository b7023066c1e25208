use std::{
    collections::HashMap,
    future::{self, Future},
    sync::{Arc, Mutex, MutexGuard},
};

use super::{SenderKeyStore, StorageError};
use crate::{name::SenderKeyName, record::SenderKeyRecord};

/// In-memory sender key store for testing and simulation
///
/// Records are kept in their encoded form, so every load decodes a fresh copy
/// and nothing handed out aliases stored state. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemorySenderKeyStore {
    inner: Arc<Mutex<HashMap<SenderKeyName, Vec<u8>>>>,
}

impl MemorySenderKeyStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names with a stored record.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |records| records.len())
    }

    /// Returns true if no record has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a record is stored for `name`.
    pub fn contains(&self, name: &SenderKeyName) -> bool {
        self.lock().is_ok_and(|records| records.contains_key(name))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SenderKeyName, Vec<u8>>>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Io("sender key store mutex poisoned".to_string()))
    }

    fn load(&self, name: &SenderKeyName) -> Result<Option<SenderKeyRecord>, StorageError> {
        let records = self.lock()?;
        records.get(name).map(|bytes| SenderKeyRecord::decode(bytes)).transpose()
    }

    fn store(&self, name: &SenderKeyName, record: &SenderKeyRecord) -> Result<(), StorageError> {
        let bytes = record.encode()?;
        self.lock()?.insert(name.clone(), bytes);
        Ok(())
    }
}

impl SenderKeyStore for MemorySenderKeyStore {
    fn load_sender_key(
        &self,
        name: &SenderKeyName,
    ) -> impl Future<Output = Result<Option<SenderKeyRecord>, StorageError>> + Send {
        future::ready(self.load(name))
    }

    fn store_sender_key(
        &self,
        name: &SenderKeyName,
        record: &SenderKeyRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        future::ready(self.store(name, record))
    }
}
