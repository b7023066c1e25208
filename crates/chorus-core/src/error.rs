//! Error types for sender key sessions.
//!
//! One closed enum covers every way a group encrypt, decrypt or session
//! operation can fail. Callers match on variants; nothing inspects message
//! text. Every failure is scoped to a single operation and leaves the stored
//! record untouched.

use thiserror::Error;

use crate::{protocol::ProtocolError, queue::QueueError, storage::StorageError};

/// Errors from group cipher and session builder operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SenderKeyError {
    /// Encrypt called without a local sending state for this identity
    #[error("no active sending state")]
    NoActiveSendingState,

    /// Message references a key id this record does not hold
    #[error("no session for key id {key_id}")]
    NoSessionForKey {
        /// Key id named by the message
        key_id: u32,
    },

    /// Message signature does not verify under the sender's public key
    #[error("invalid message signature")]
    SignatureInvalid,

    /// Message iteration was already consumed and is not in the skipped cache
    #[error("outdated or replayed message: chain at {current}, message at {target}")]
    OutdatedOrReplayedMessage {
        /// Receiver's current chain iteration
        current: u32,
        /// Iteration named by the message
        target: u32,
    },

    /// Message iteration is further ahead than the receiver will skip
    #[error("iteration gap too large: chain at {current}, message at {target}, limit {max_skip}")]
    IterationGapTooLarge {
        /// Receiver's current chain iteration
        current: u32,
        /// Iteration named by the message
        target: u32,
        /// Configured skip limit
        max_skip: u32,
    },

    /// A cipher or key derivation primitive failed. Deliberately carries no
    /// detail.
    #[error("cryptographic operation failed")]
    CryptoFailure,

    /// Wire message could not be encoded or decoded
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] ProtocolError),

    /// Sender key store failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization queue dropped the operation
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl SenderKeyError {
    /// Returns true if retrying the same operation may succeed.
    ///
    /// Only infrastructure failures are transient. Every protocol outcome
    /// (bad signature, replay, unknown key) is final for that message.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Queue(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_outcomes_are_final() {
        assert!(!SenderKeyError::NoActiveSendingState.is_transient());
        assert!(!SenderKeyError::NoSessionForKey { key_id: 1 }.is_transient());
        assert!(!SenderKeyError::SignatureInvalid.is_transient());
        assert!(
            !SenderKeyError::OutdatedOrReplayedMessage { current: 5, target: 1 }.is_transient()
        );
        assert!(!SenderKeyError::CryptoFailure.is_transient());
        let invalid = SenderKeyError::InvalidMessage(ProtocolError::UnsupportedVersion(0x22));
        assert!(!invalid.is_transient());
    }

    #[test]
    fn infrastructure_failures_are_transient() {
        assert!(SenderKeyError::Storage(StorageError::Io("disk full".to_string())).is_transient());
        assert!(SenderKeyError::Queue(QueueError::TaskAborted).is_transient());
    }

    #[test]
    fn error_display() {
        let err = SenderKeyError::IterationGapTooLarge { current: 0, target: 2001, max_skip: 2000 };
        assert_eq!(
            err.to_string(),
            "iteration gap too large: chain at 0, message at 2001, limit 2000"
        );
    }
}
