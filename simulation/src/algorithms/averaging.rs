use meshlab_core::{Algorithm, Message, NodeContext, NodeError};
use tracing::trace;

use super::{VALUE_KEY, parse_number};

/// Pairwise averaging
///
/// On start a node publishes its `value`. Every peer update replaces the
/// node's value with the mean of its own and the peer's value, then the new
/// value is published again. Values drift towards a common consensus.
///
/// Every processed message triggers one send per neighbor, so each neighbor
/// receives at least as many updates as it can process within its bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Averaging;

impl Algorithm for Averaging {
    fn name(&self) -> &'static str {
        "averaging"
    }

    fn on_start(&mut self, ctx: &mut NodeContext) -> Result<(), NodeError> {
        ctx.send_values_to_neighbors()
    }

    fn on_peer_update(&mut self, ctx: &mut NodeContext, message: Message) -> Result<(), NodeError> {
        let own = ctx
            .get_value(VALUE_KEY)
            .ok_or_else(|| NodeError::algorithm("node has no value"))?;
        let own = parse_number(VALUE_KEY, own)?;
        let peer = parse_number(VALUE_KEY, message.get_data(VALUE_KEY)?)?;

        let averaged = (own + peer) / 2.0;
        trace!(own, peer, averaged, from = %message.sender_id()?, "average");
        ctx.set_value(VALUE_KEY, averaged.to_string());

        ctx.send_values_to_neighbors()
    }
}
