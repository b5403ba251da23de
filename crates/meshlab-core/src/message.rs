//! Messages exchanged between nodes
//!
//! A [`Message`] is a keyed record of string fields. Three fields have a
//! fixed meaning and typed accessors:
//!
//! - `Type`: routing kind, see [`MessageType`]
//! - `senderID`: the node that built the message
//! - `receiverID`: stamped by the sending node per delivery
//!
//! Everything else is algorithm payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::identity::NodeId;

/// Field carrying the routing kind
pub const TYPE_FIELD: &str = "Type";
/// Field carrying the sending node's id
pub const SENDER_FIELD: &str = "senderID";
/// Field carrying the receiving node's id
pub const RECEIVER_FIELD: &str = "receiverID";

/// Routing kind of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Trigger for the `on_start` hook
    Start,
    /// Peer state update, handed to `on_peer_update`
    Response,
    /// Any other value; dispatch ignores it
    Other(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Start => "Start",
            MessageType::Response => "Response",
            MessageType::Other(s) => s,
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        match s {
            "Start" => MessageType::Start,
            "Response" => MessageType::Response,
            other => MessageType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed record of string fields
///
/// Field order carries no meaning; fields are kept sorted so encoding is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: BTreeMap<String, String>,
}

impl Message {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message carrying only a `Type`
    pub fn with_type(kind: MessageType) -> Self {
        let mut message = Self::new();
        message.add_data(TYPE_FIELD, kind.as_str());
        message
    }

    /// Create a `Start` message
    pub fn start() -> Self {
        Self::with_type(MessageType::Start)
    }

    /// Create an empty `Response` message
    pub fn response() -> Self {
        Self::with_type(MessageType::Response)
    }

    /// Add (or overwrite) a field
    pub fn add_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`add_data`](Self::add_data)
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_data(key, value);
        self
    }

    /// Look up a field
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::FieldNotFound`] if the field was never added.
    pub fn get_data(&self, key: &str) -> Result<&str, MessageError> {
        self.fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| MessageError::FieldNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields, routing fields included
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over algorithm payload fields only
    pub fn payload(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields().filter(|(k, _)| !is_routing_field(k))
    }

    /// The routing kind of this message
    pub fn message_type(&self) -> Result<MessageType, MessageError> {
        self.get_data(TYPE_FIELD).map(MessageType::from)
    }

    pub fn sender_id(&self) -> Result<NodeId, MessageError> {
        self.node_field(SENDER_FIELD)
    }

    pub fn receiver_id(&self) -> Result<NodeId, MessageError> {
        self.node_field(RECEIVER_FIELD)
    }

    pub fn set_sender(&mut self, id: NodeId) {
        self.add_data(SENDER_FIELD, id.to_string());
    }

    pub fn set_receiver(&mut self, id: NodeId) {
        self.add_data(RECEIVER_FIELD, id.to_string());
    }

    fn node_field(&self, field: &str) -> Result<NodeId, MessageError> {
        let raw = self.get_data(field)?;
        raw.parse().map_err(|_| MessageError::InvalidField {
            field: field.to_string(),
            value: raw.to_string(),
        })
    }
}

fn is_routing_field(key: &str) -> bool {
    matches!(key, TYPE_FIELD | SENDER_FIELD | RECEIVER_FIELD)
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Message {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
