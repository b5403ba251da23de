//! Node identity
//!
//! Nodes are identified by small integers. The textual form (plain decimal)
//! is what travels in the `senderID` / `receiverID` message fields.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Unique integer identity of a simulated node
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display("{_0}")]
pub struct NodeId(pub u32);

impl NodeId {
    /// Generate identities `1..=count`
    pub fn range(count: u32) -> Vec<Self> {
        (1..=count).map(Self).collect()
    }

    /// Get the underlying integer
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_range() {
        let ids = NodeId::range(3);
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert!(NodeId::range(0).is_empty());
    }

    #[test]
    fn test_node_id_text_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<NodeId>().unwrap(), id);
        assert!("forty-two".parse::<NodeId>().is_err());
    }
}
