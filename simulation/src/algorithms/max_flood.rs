use meshlab_core::{Algorithm, Message, NodeContext, NodeError, NodeId};

use super::LEADER_KEY;

/// Leader election by flooding the maximum id
///
/// Every node starts out believing it is the leader and publishes that
/// belief. A node adopts any larger leader it hears about. Beliefs are
/// republished on every update, so after enough rounds (the diameter of the
/// network) every node agrees on the largest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFlood;

fn leader_of(raw: &str) -> Result<NodeId, NodeError> {
    raw.parse()
        .map_err(|_| NodeError::algorithm(format!("leader is not a node id: {}", raw)))
}

impl Algorithm for MaxFlood {
    fn name(&self) -> &'static str {
        "max-flood"
    }

    fn on_start(&mut self, ctx: &mut NodeContext) -> Result<(), NodeError> {
        if ctx.get_value(LEADER_KEY).is_none() {
            let id = ctx.id().to_string();
            ctx.set_value(LEADER_KEY, id);
        }
        ctx.send_values_to_neighbors()
    }

    fn on_peer_update(&mut self, ctx: &mut NodeContext, message: Message) -> Result<(), NodeError> {
        let peer_leader = leader_of(message.get_data(LEADER_KEY)?)?;
        let current = match ctx.get_value(LEADER_KEY) {
            Some(raw) => leader_of(raw)?,
            None => ctx.id(),
        };

        if peer_leader > current {
            tracing::debug!(old = %current, new = %peer_leader, "adopt leader");
        }
        ctx.set_value(LEADER_KEY, current.max(peer_leader).to_string());

        ctx.send_values_to_neighbors()
    }
}
