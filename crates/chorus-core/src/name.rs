//! Sender key identity.

use std::fmt;

/// Identifies one sender's ratchet within one group.
///
/// Immutable once created; used as the storage key and the serialization
/// queue key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderKeyName {
    group_id: String,
    sender_id: String,
}

impl SenderKeyName {
    /// Name for `sender_id`'s ratchet in `group_id`.
    pub fn new(group_id: impl Into<String>, sender_id: impl Into<String>) -> Self {
        Self { group_id: group_id.into(), sender_id: sender_id.into() }
    }

    /// Group this ratchet belongs to.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Sender owning this ratchet.
    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }
}

impl fmt::Display for SenderKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.group_id, self.sender_id)
    }
}
