//! Error types for Meshlab

use thiserror::Error;

use crate::identity::NodeId;

/// Top-level error type for Meshlab
#[derive(Debug, Error)]
pub enum MeshlabError {
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),
}

/// Errors related to message field access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Invalid value for field {field}: {value}")]
    InvalidField { field: String, value: String },
}

/// Errors related to message encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),
}

/// Errors raised at the mailbox boundary
#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("Unknown recipient: node {0}")]
    UnknownRecipient(NodeId),

    #[error("Mailbox closed for node {0}")]
    Closed(NodeId),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Errors raised while a node dispatches or sends messages
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Node {0} has terminated")]
    Terminated(NodeId),
}

impl NodeError {
    /// Create an algorithm-level error from any displayable value
    pub fn algorithm(reason: impl Into<String>) -> Self {
        Self::Algorithm(reason.into())
    }
}

/// Result type alias for Meshlab operations
pub type MeshlabResult<T> = Result<T, MeshlabError>;
