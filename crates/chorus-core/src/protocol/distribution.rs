//! Distribution message: bootstraps a receiver's copy of a sender ratchet.

use std::fmt;

use chorus_crypto::{PUBLIC_KEY_SIZE, validate_public_key};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::{ProtocolError, decode_cbor, encode_cbor, strip_version, to_array, version_byte};

/// CBOR body of a distribution message
#[derive(Serialize, Deserialize)]
struct DistributionBody {
    id: u32,
    iteration: u32,
    #[serde(with = "serde_bytes")]
    chain_key: Vec<u8>,
    #[serde(with = "serde_bytes")]
    signing_key: Vec<u8>,
}

/// Everything a receiver needs to follow one sender's chain.
///
/// Travels over an authenticated pairwise channel; this type does no
/// freshness checking of its own.
#[derive(Clone, PartialEq, Eq)]
pub struct DistributionMessage {
    key_id: u32,
    iteration: u32,
    chain_key: [u8; 32],
    signing_key: [u8; PUBLIC_KEY_SIZE],
}

impl DistributionMessage {
    /// Distribution message for a state at `iteration`.
    pub fn new(
        key_id: u32,
        iteration: u32,
        chain_key: [u8; 32],
        signing_key: [u8; PUBLIC_KEY_SIZE],
    ) -> Self {
        Self { key_id, iteration, chain_key, signing_key }
    }

    /// Sender key id of the state.
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    /// Chain iteration the seed belongs to.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Chain seed at `iteration`.
    pub fn chain_key(&self) -> &[u8; 32] {
        &self.chain_key
    }

    /// Sender's public signing key.
    pub fn signing_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.signing_key
    }

    /// Serialize: version byte followed by the CBOR body.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let body = DistributionBody {
            id: self.key_id,
            iteration: self.iteration,
            chain_key: self.chain_key.to_vec(),
            signing_key: self.signing_key.to_vec(),
        };

        let mut out = vec![version_byte()];
        encode_cbor(&body, &mut out)?;
        Ok(out)
    }

    /// Parse a serialized distribution message.
    ///
    /// # Errors
    ///
    /// - `TooShort`, `PayloadTooLarge`, `UnsupportedVersion` for bad framing
    /// - `CborDecode` if the body is malformed
    /// - `InvalidField` if a key has the wrong length or the signing key is
    ///   not a usable public key
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let body = strip_version(bytes, 2)?;
        let mut body: DistributionBody = decode_cbor(body)?;

        let chain_key = to_array::<32>("chain_key", &body.chain_key);
        body.chain_key.zeroize();
        let chain_key = chain_key?;

        let signing_key = to_array::<PUBLIC_KEY_SIZE>("signing_key", &body.signing_key)?;
        validate_public_key(&signing_key).map_err(|e| ProtocolError::InvalidField {
            field: "signing_key",
            reason: e.to_string(),
        })?;

        Ok(Self { key_id: body.id, iteration: body.iteration, chain_key, signing_key })
    }
}

impl fmt::Debug for DistributionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionMessage")
            .field("key_id", &self.key_id)
            .field("iteration", &self.iteration)
            .field("signing_key", &self.signing_key)
            .finish_non_exhaustive()
    }
}

impl Drop for DistributionMessage {
    fn drop(&mut self) {
        self.chain_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use chorus_crypto::SigningKeyPair;

    use super::*;

    fn test_message() -> DistributionMessage {
        let pair = SigningKeyPair::from_seed([7u8; 32]);
        DistributionMessage::new(1234, 5, [0xAB; 32], *pair.public_key())
    }

    #[test]
    fn round_trip() {
        let message = test_message();
        let bytes = message.encode().unwrap();
        assert_eq!(DistributionMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn starts_with_version_byte() {
        let bytes = test_message().encode().unwrap();
        assert_eq!(bytes[0], 0x33);
    }

    #[test]
    fn body_is_cbor_with_named_fields() {
        let bytes = test_message().encode().unwrap();
        let value: ciborium::Value = ciborium::de::from_reader(&bytes[1..]).unwrap();

        let map = value.as_map().unwrap();
        let keys: Vec<&str> = map.iter().filter_map(|(k, _)| k.as_text()).collect();
        assert_eq!(keys, ["id", "iteration", "chain_key", "signing_key"]);
        assert!(map.iter().any(|(_, v)| v == &ciborium::Value::Bytes(vec![0xAB; 32])));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = test_message().encode().unwrap();
        bytes[0] = 0x22;
        assert_eq!(
            DistributionMessage::decode(&bytes),
            Err(ProtocolError::UnsupportedVersion(0x22))
        );
    }

    #[test]
    fn rejects_short_chain_key() {
        let body = DistributionBody {
            id: 1,
            iteration: 0,
            chain_key: vec![0; 16],
            signing_key: SigningKeyPair::from_seed([1; 32]).public_key().to_vec(),
        };
        let mut bytes = vec![version_byte()];
        encode_cbor(&body, &mut bytes).unwrap();

        assert!(matches!(
            DistributionMessage::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "chain_key", .. })
        ));
    }

    #[test]
    fn rejects_invalid_signing_key() {
        let mut identity = vec![0u8; 32];
        identity[0] = 1;
        let body =
            DistributionBody { id: 1, iteration: 0, chain_key: vec![0; 32], signing_key: identity };
        let mut bytes = vec![version_byte()];
        encode_cbor(&body, &mut bytes).unwrap();

        assert!(matches!(
            DistributionMessage::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "signing_key", .. })
        ));
    }

    #[test]
    fn rejects_garbage_body() {
        assert!(matches!(
            DistributionMessage::decode(&[0x33, 0xFF, 0xFF]),
            Err(ProtocolError::CborDecode(_))
        ));
    }

    #[test]
    fn debug_hides_chain_key() {
        let rendered = format!("{:?}", test_message());
        assert!(rendered.contains("key_id: 1234"));
        assert!(!rendered.contains("chain_key"));
    }
}
