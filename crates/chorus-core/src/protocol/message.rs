//! Sender key message: the signed envelope around one group ciphertext.

use chorus_crypto::{CryptoError, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE, sign, verify};
use serde::{Deserialize, Serialize};

use super::{
    MAX_MESSAGE_SIZE, ProtocolError, decode_cbor, encode_cbor, strip_version, to_array,
    version_byte,
};

/// Smallest possible envelope: version byte, one CBOR byte, signature
const MIN_SIZE: usize = 1 + 1 + SIGNATURE_SIZE;

/// CBOR body of a sender key message
#[derive(Serialize, Deserialize)]
struct SenderKeyBody {
    key_id: u32,
    iteration: u32,
    #[serde(with = "serde_bytes")]
    ciphertext: Vec<u8>,
}

/// An encrypted group message.
///
/// Layout: `[version:1][CBOR body][signature:64]`. The Ed25519 signature
/// covers every byte before it, version byte included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderKeyMessage {
    key_id: u32,
    iteration: u32,
    ciphertext: Vec<u8>,
    signature: [u8; SIGNATURE_SIZE],
    serialized: Vec<u8>,
}

impl SenderKeyMessage {
    /// Build and sign an envelope with the sender's secret signing key.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the envelope would exceed [`MAX_MESSAGE_SIZE`],
    ///   since no receiver would accept it
    /// - `CborEncode` if the body fails to serialize
    pub fn new_signed(
        key_id: u32,
        iteration: u32,
        ciphertext: Vec<u8>,
        signing_key: &[u8; SECRET_KEY_SIZE],
    ) -> Result<Self, ProtocolError> {
        let body = SenderKeyBody { key_id, iteration, ciphertext };

        let mut serialized = vec![version_byte()];
        encode_cbor(&body, &mut serialized)?;

        let size = serialized.len() + SIGNATURE_SIZE;
        if size > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::PayloadTooLarge { size, max: MAX_MESSAGE_SIZE });
        }

        let signature = sign(signing_key, &serialized);
        serialized.extend_from_slice(&signature);

        Ok(Self { key_id, iteration, ciphertext: body.ciphertext, signature, serialized })
    }

    /// Parse a serialized envelope. Does not verify the signature.
    ///
    /// # Errors
    ///
    /// - `TooShort`, `PayloadTooLarge`, `UnsupportedVersion` for bad framing
    /// - `CborDecode` if the body is malformed
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let rest = strip_version(bytes, MIN_SIZE)?;
        let (body, signature) = rest.split_at(rest.len() - SIGNATURE_SIZE);

        let body: SenderKeyBody = decode_cbor(body)?;
        let signature = to_array::<SIGNATURE_SIZE>("signature", signature)?;

        Ok(Self {
            key_id: body.key_id,
            iteration: body.iteration,
            ciphertext: body.ciphertext,
            signature,
            serialized: bytes.to_vec(),
        })
    }

    /// Check the signature against the sender's public key.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` or `InvalidPublicKey` from the signature primitive
    pub fn verify_signature(&self, public_key: &[u8; PUBLIC_KEY_SIZE]) -> Result<(), CryptoError> {
        let signed_len = self.serialized.len() - SIGNATURE_SIZE;
        verify(public_key, &self.serialized[..signed_len], &self.signature)
    }

    /// Sender key id of the state that produced this message.
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    /// Chain iteration of the message key.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Encrypted payload.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Full wire bytes, signature included.
    pub fn serialized(&self) -> &[u8] {
        &self.serialized
    }

    /// Consume the message, returning its wire bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.serialized
    }
}
