//! Error types for the simulation bootstrap

use meshlab_core::{MailboxError, NodeError, NodeId};
use thiserror::Error;

/// Errors raised while configuring or running a simulation
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid topology: node {node} lists unknown neighbor {neighbor}")]
    UnknownNeighbor { node: NodeId, neighbor: NodeId },

    #[error("Invalid topology: node {0} is its own neighbor")]
    SelfLoop(NodeId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Simulation did not finish within {0}s")]
    Timeout(u64),

    #[error("Node task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_capitalized() {
        assert_eq!(
            SimError::Timeout(3).to_string(),
            "Simulation did not finish within 3s"
        );
        assert_eq!(
            SimError::SelfLoop(NodeId(2)).to_string(),
            "Invalid topology: node 2 is its own neighbor"
        );
        let err = SimError::UnknownNeighbor {
            node: NodeId(1),
            neighbor: NodeId(9),
        };
        assert_eq!(
            err.to_string(),
            "Invalid topology: node 1 lists unknown neighbor 9"
        );
    }
}
