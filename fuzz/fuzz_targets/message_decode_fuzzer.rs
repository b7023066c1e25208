//! Fuzz target for wire message and stored record decoding
//!
//! Feeds raw bytes to every decoder, both as-is and behind a valid version
//! byte so the CBOR body parser sees most inputs.
//!
//! # Invariants
//!
//! - Decoders never panic; invalid input returns an error
//! - A decoded distribution message re-encodes to something that decodes to
//!   the same message
//! - A decoded sender key message keeps its exact wire bytes

#![no_main]

use chorus_core::{DistributionMessage, SenderKeyMessage, SenderKeyRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut versioned = Vec::with_capacity(data.len() + 1);
    versioned.push(0x33);
    versioned.extend_from_slice(data);

    for bytes in [data, versioned.as_slice()] {
        if let Ok(message) = DistributionMessage::decode(bytes) {
            let encoded = message.encode().expect("decoded message must re-encode");
            let decoded =
                DistributionMessage::decode(&encoded).expect("re-encoded message must decode");
            assert_eq!(decoded, message, "distribution message must survive re-encoding");
        }

        if let Ok(message) = SenderKeyMessage::decode(bytes) {
            assert_eq!(message.serialized(), bytes, "wire bytes must be kept verbatim");
        }

        let _ = SenderKeyRecord::decode(bytes);
    }
});
