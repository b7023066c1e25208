//! Wire codec errors.

use thiserror::Error;

/// Errors from encoding or decoding sender key wire messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input is shorter than the fixed framing requires
    #[error("message too short: need at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum length for this message type
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// Input exceeds the maximum accepted message size
    #[error("message too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Received size
        size: usize,
        /// Maximum accepted size
        max: usize,
    },

    /// Version byte names a protocol version we do not speak
    #[error("unsupported message version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// CBOR serialization failed
    #[error("CBOR encode error: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed
    #[error("CBOR decode error: {0}")]
    CborDecode(String),

    /// A decoded field is out of range or has the wrong length
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
