//! Sender key wire messages.
//!
//! Every message starts with one version byte carrying the protocol version
//! in both nibbles, followed by a CBOR body. CBOR keeps the body
//! self-describing without code generation, matching the rest of the stack.
//!
//! ```text
//! DistributionMessage: [version:1][CBOR {id, iteration, chain_key, signing_key}]
//! SenderKeyMessage:    [version:1][CBOR {key_id, iteration, ciphertext}][signature:64]
//! ```
//!
//! # Security
//!
//! - Size Validation First: length limits are checked before any CBOR
//!   parsing, so a hostile length prefix cannot drive allocation.
//! - Strict Versioning: unknown versions are rejected rather than parsed
//!   optimistically.

mod distribution;
mod error;
mod message;

use serde::{Serialize, de::DeserializeOwned};

pub use self::{
    distribution::DistributionMessage, error::ProtocolError, message::SenderKeyMessage,
};

/// Protocol version spoken by this implementation
pub const CURRENT_VERSION: u8 = 3;

/// Largest wire message accepted by the decoders (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1 << 20;

/// Version byte: the version in the high and low nibble.
pub const fn version_byte() -> u8 {
    (CURRENT_VERSION << 4) | CURRENT_VERSION
}

/// Split the leading version byte off `bytes` and check it.
fn strip_version(bytes: &[u8], min_len: usize) -> Result<&[u8], ProtocolError> {
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE });
    }
    if bytes.len() < min_len {
        return Err(ProtocolError::TooShort { expected: min_len, actual: bytes.len() });
    }

    let version = bytes[0];
    if version >> 4 != CURRENT_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    Ok(&bytes[1..])
}

fn encode_cbor<T: Serialize>(value: &T, dst: &mut Vec<u8>) -> Result<(), ProtocolError> {
    ciborium::ser::into_writer(value, dst).map_err(|e| ProtocolError::CborEncode(e.to_string()))
}

fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

fn to_array<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], ProtocolError> {
    bytes.try_into().map_err(|_| ProtocolError::InvalidField {
        field,
        reason: format!("expected {N} bytes, got {}", bytes.len()),
    })
}
