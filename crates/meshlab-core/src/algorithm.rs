//! Algorithm hooks and the context they run in
//!
//! An algorithm variant implements [`Algorithm`]. The node calls
//! [`on_start`](Algorithm::on_start) for every `Start` message and
//! [`on_peer_update`](Algorithm::on_peer_update) for every `Response`
//! message. Both hooks receive the node's [`NodeContext`], which owns the
//! node's state and exposes the outbound operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::NodeError;
use crate::identity::NodeId;
use crate::mailbox::Mailbox;
use crate::message::Message;

/// Local state of a node: string key to string value
pub type NodeState = BTreeMap<String, String>;

/// Algorithm-specific logic plugged into a [`Node`](crate::Node)
///
/// Hooks may mutate the node state and send messages through `ctx`. An error
/// returned from a hook halts the node.
pub trait Algorithm: Send + 'static {
    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called when the node receives a `Start` message
    fn on_start(&mut self, ctx: &mut NodeContext) -> Result<(), NodeError>;

    /// Called when the node receives a `Response` message from a peer
    fn on_peer_update(&mut self, ctx: &mut NodeContext, message: Message) -> Result<(), NodeError>;
}

impl<A: Algorithm + ?Sized> Algorithm for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn on_start(&mut self, ctx: &mut NodeContext) -> Result<(), NodeError> {
        (**self).on_start(ctx)
    }

    fn on_peer_update(&mut self, ctx: &mut NodeContext, message: Message) -> Result<(), NodeError> {
        (**self).on_peer_update(ctx, message)
    }
}

/// Everything a node owns apart from its algorithm
///
/// The state is never shared: peers only ever see the snapshots carried by
/// messages built from it.
pub struct NodeContext {
    id: NodeId,
    neighbors: Vec<NodeId>,
    state: NodeState,
    mailbox: Arc<dyn Mailbox>,
    iteration: u64,
    iteration_max: u64,
}

impl NodeContext {
    pub(crate) fn new(
        id: NodeId,
        neighbors: Vec<NodeId>,
        state: NodeState,
        mailbox: Arc<dyn Mailbox>,
        iteration_max: u64,
    ) -> Self {
        Self {
            id,
            neighbors,
            state,
            mailbox,
            iteration: 1,
            iteration_max,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn mailbox(&self) -> &Arc<dyn Mailbox> {
        &self.mailbox
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Copy of the current state
    pub fn state_snapshot(&self) -> NodeState {
        self.state.clone()
    }

    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.state.get(key).map(String::as_str)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.state.insert(key.into(), value.into());
    }

    pub fn remove_value(&mut self, key: &str) -> Option<String> {
        self.state.remove(key)
    }

    // ------------------------------------------------------------------
    // Iteration bound
    // ------------------------------------------------------------------

    /// Current iteration, starting at 1
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn iteration_max(&self) -> u64 {
        self.iteration_max
    }

    pub(crate) fn set_iteration_max(&mut self, iteration_max: u64) {
        self.iteration_max = iteration_max;
    }

    /// Move to the next iteration
    pub fn advance_iteration(&mut self) {
        self.iteration = self.iteration.saturating_add(1);
    }

    /// Whether the run loop may go around once more
    pub fn within_bound(&self) -> bool {
        self.iteration <= self.iteration_max
    }

    // ------------------------------------------------------------------
    // Outbound operations
    // ------------------------------------------------------------------

    /// Stamp `receiverID = target` on `message` and deliver it
    ///
    /// # Errors
    ///
    /// Fails with [`MessageError::FieldNotFound`](crate::MessageError) if the
    /// message has no `Type`, or with the mailbox error if delivery fails.
    pub fn send_message(&self, target: NodeId, mut message: Message) -> Result<(), NodeError> {
        let kind = message.message_type()?;
        message.set_receiver(target);

        debug!(from = %self.id, to = %target, kind = %kind, "send message");
        self.mailbox.deliver(target, &message)?;
        Ok(())
    }

    /// Send a copy of `message` to every neighbor, in neighbor order
    ///
    /// Stops at the first failed delivery.
    pub fn send_message_to_neighbors(&self, message: &Message) -> Result<(), NodeError> {
        for neighbor in &self.neighbors {
            self.send_message(*neighbor, message.clone())?;
        }
        Ok(())
    }

    /// Publish the current state to every neighbor as a `Response`
    pub fn send_values_to_neighbors(&self) -> Result<(), NodeError> {
        let mut message: Message = self.state.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        // Routing fields win over state keys of the same name.
        message.add_data(crate::message::TYPE_FIELD, "Response");
        message.set_sender(self.id);

        self.send_message_to_neighbors(&message)
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("id", &self.id)
            .field("neighbors", &self.neighbors)
            .field("state", &self.state)
            .field("iteration", &self.iteration)
            .field("iteration_max", &self.iteration_max)
            .finish()
    }
}
