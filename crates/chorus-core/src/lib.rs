//! Chorus Core
//!
//! Sender key group messaging: one symmetric hash ratchet per sender per
//! group, shared with every member once, so a group message is encrypted once
//! instead of once per recipient.
//!
//! # Architecture
//!
//! ```text
//!                 DistributionMessage (pairwise, out of band)
//!   ┌────────────┐ ──────────────────────────────────────▶ ┌────────────┐
//!   │  Builder   │  create / rotate               process  │  Builder   │
//!   └─────┬──────┘                                         └─────┬──────┘
//!         │                                                      │
//!   ┌─────▼──────┐       SenderKeyMessage (group channel)  ┌─────▼──────┐
//!   │ GroupCipher│ ──────────────────────────────────────▶ │ GroupCipher│
//!   │  encrypt   │                                         │  decrypt   │
//!   └─────┬──────┘                                         └─────┬──────┘
//!         │  SerialQueue: one task at a time per SenderKeyName   │
//!   ┌─────▼──────┐                                         ┌─────▼──────┐
//!   │   Store    │  SenderKeyRecord (≤5 SenderKeyStates)   │   Store    │
//!   └────────────┘                                         └────────────┘
//! ```
//!
//! # Components
//!
//! - [`GroupSessionBuilder`]: creates the local sending state and ingests
//!   peers' distribution messages
//! - [`GroupCipher`]: encrypts as the local sender, verifies and decrypts
//!   from a peer
//! - [`SerialQueue`]: orders every record read-modify-write per name
//! - [`SenderKeyStore`]: async persistence seam, with
//!   [`MemorySenderKeyStore`] for tests
//! - [`protocol`]: versioned wire messages
//!
//! # Guarantees
//!
//! - A failed operation never changes the stored record
//! - Operations on the same name never interleave
//! - A message key is used once; replays are rejected
//! - Receivers skip ahead at most `max_skip` iterations per message

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod builder;
mod cipher;
pub mod config;
pub mod env;
pub mod error;
mod name;
pub mod protocol;
pub mod queue;
mod record;
mod state;
pub mod storage;

pub use builder::GroupSessionBuilder;
pub use cipher::GroupCipher;
pub use config::SenderKeyConfig;
pub use env::{Environment, SystemEnv};
pub use error::SenderKeyError;
pub use name::SenderKeyName;
pub use protocol::{DistributionMessage, ProtocolError, SenderKeyMessage};
pub use queue::{QueueError, SerialQueue};
pub use record::SenderKeyRecord;
pub use state::SenderKeyState;
pub use storage::{MemorySenderKeyStore, SenderKeyStore, StorageError};
