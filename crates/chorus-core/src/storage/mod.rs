//! Storage abstraction for sender key records
//!
//! One record per [`SenderKeyName`]. The trait is async so hosts can back it
//! with a database or a remote service; the in-memory implementation resolves
//! immediately.

mod error;
mod memory;

use std::future::Future;

pub use error::StorageError;
pub use memory::MemorySenderKeyStore;

use crate::{name::SenderKeyName, record::SenderKeyRecord};

/// Persistence for sender key records, keyed by [`SenderKeyName`].
///
/// Must be Clone (the builder and every cipher hold a handle) and Send + Sync
/// (operations run on runtime worker threads). Implementations typically
/// share internal state via Arc, so clones access the same underlying store.
///
/// Callers serialize access per name through the serialization queue; a
/// store never sees two overlapping operations for the same name from this
/// crate.
pub trait SenderKeyStore: Clone + Send + Sync + 'static {
    /// Load the record for `name`.
    ///
    /// Returns `None` if nothing has been stored for this name yet.
    fn load_sender_key(
        &self,
        name: &SenderKeyName,
    ) -> impl Future<Output = Result<Option<SenderKeyRecord>, StorageError>> + Send;

    /// Store the record for `name`, replacing any previous one.
    ///
    /// # Invariants
    ///
    /// - Post: a following `load_sender_key(name)` returns an equal record
    fn store_sender_key(
        &self,
        name: &SenderKeyName,
        record: &SenderKeyRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Load the record for `name`, substituting an empty record when nothing is
/// stored.
pub(crate) async fn load_or_empty<S: SenderKeyStore>(
    store: &S,
    name: &SenderKeyName,
) -> Result<SenderKeyRecord, StorageError> {
    Ok(store.load_sender_key(name).await?.unwrap_or_default())
}
