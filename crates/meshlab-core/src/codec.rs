//! Message encoding
//!
//! Messages sit in a mailbox in encoded form and are decoded by the receiving
//! node. Any codec works as long as decoding is deterministic and every field
//! (routing fields in particular) survives the round trip.

use bytes::Bytes;

use crate::error::CodecError;
use crate::message::Message;

/// An encoded message as stored in a mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage(Bytes);

impl EncodedMessage {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Encoding between [`Message`] and [`EncodedMessage`]
pub trait MessageCodec: Send + Sync {
    /// Short name used in logs and configuration
    fn name(&self) -> &'static str;

    fn encode(&self, message: &Message) -> Result<EncodedMessage, CodecError>;

    fn decode(&self, encoded: &EncodedMessage) -> Result<Message, CodecError>;
}

/// Compact binary encoding via postcard
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardCodec;

impl MessageCodec for PostcardCodec {
    fn name(&self) -> &'static str {
        "postcard"
    }

    fn encode(&self, message: &Message) -> Result<EncodedMessage, CodecError> {
        postcard::to_allocvec(message)
            .map(EncodedMessage::new)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, encoded: &EncodedMessage) -> Result<Message, CodecError> {
        postcard::from_bytes(encoded.as_bytes()).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Human-readable encoding as a flat JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, message: &Message) -> Result<EncodedMessage, CodecError> {
        serde_json::to_vec(message)
            .map(EncodedMessage::new)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, encoded: &EncodedMessage) -> Result<Message, CodecError> {
        serde_json::from_slice(encoded.as_bytes()).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
