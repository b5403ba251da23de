use meshlab_core::{Algorithm, Message, NodeContext, NodeError};

/// State key counting received peer updates
pub const RECEIVED_KEY: &str = "received";
/// State key holding the sender of the latest peer update
pub const LAST_SENDER_KEY: &str = "last_sender";

/// Publish once, then record incoming updates
///
/// Never republishes, so a node only ever receives one update per neighbor.
/// Pair it with `iteration_max = 1 + degree`; a larger bound leaves the node
/// waiting for messages that never come.
#[derive(Debug, Clone, Default)]
pub struct Echo {
    received: u64,
}

impl Echo {
    pub fn received(&self) -> u64 {
        self.received
    }
}

impl Algorithm for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn on_start(&mut self, ctx: &mut NodeContext) -> Result<(), NodeError> {
        ctx.send_values_to_neighbors()
    }

    fn on_peer_update(&mut self, ctx: &mut NodeContext, message: Message) -> Result<(), NodeError> {
        self.received += 1;
        ctx.set_value(RECEIVED_KEY, self.received.to_string());
        ctx.set_value(LAST_SENDER_KEY, message.sender_id()?.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use meshlab_core::{ChannelMailbox, Mailbox, Node, NodeId, NodeState};

    use super::*;
    use crate::algorithms::testing::drain;

    #[test]
    fn test_records_without_republishing() {
        let mailbox = Arc::new(ChannelMailbox::with_nodes(NodeId::range(3)));
        let mut node = Node::new(NodeId(1), vec![NodeId(2), NodeId(3)], NodeState::new(), mailbox.clone(), Echo::default());

        for sender in [2, 3] {
            let mut message = Message::response();
            message.set_sender(NodeId(sender));
            let encoded = mailbox.codec().encode(&message).unwrap();
            node.process_message(&encoded).unwrap();
        }

        assert_eq!(node.algorithm().received(), 2);
        assert_eq!(node.context().get_value(RECEIVED_KEY), Some("2"));
        assert_eq!(node.context().get_value(LAST_SENDER_KEY), Some("3"));
        assert!(drain(&mailbox, 2).is_empty());
        assert!(drain(&mailbox, 3).is_empty());
    }
}
