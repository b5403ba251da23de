//! The node actor
//!
//! A [`Node`] owns a [`NodeContext`] and an [`Algorithm`]. Once started it
//! loops: wait on its own mailbox queue, decode one message, dispatch it by
//! `Type`, and repeat until the iteration bound is reached.
//!
//! ```text
//!   Idle ──run()──▶ Running ──bound reached / failure──▶ Terminated
//! ```
//!
//! Dispatch:
//!
//! | `Type`     | action                               |
//! |------------|--------------------------------------|
//! | `Start`    | `on_start(ctx)`                      |
//! | `Response` | `on_peer_update(ctx, message)`       |
//! | other      | ignored, the loop carries on         |
//!
//! A failure while retrieving, decoding, or dispatching halts the node. A
//! halted node still reports completion. The loop has no timeout: a node
//! waiting for a message nobody sends stays in `Running` forever.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::algorithm::{Algorithm, NodeContext, NodeState};
use crate::codec::EncodedMessage;
use crate::error::NodeError;
use crate::identity::NodeId;
use crate::mailbox::Mailbox;
use crate::message::{Message, MessageType};

/// Default iteration bound
pub const DEFAULT_ITERATION_MAX: u64 = 1000;

/// Lifecycle phase of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    /// Constructed, loop not started
    Idle,
    /// Waiting on or dispatching messages
    Running,
    /// Loop finished; never restarts
    Terminated,
}

/// Who advances the iteration counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IterationPolicy {
    /// The node advances the counter once per retrieved message
    #[default]
    PerMessage,
    /// Only the algorithm advances the counter, through
    /// [`NodeContext::advance_iteration`]. If it never does, the bound is
    /// never reached.
    Manual,
}

/// Configuration for a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Loop runs while the iteration counter is at most this value
    pub iteration_max: u64,
    pub iteration_policy: IterationPolicy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            iteration_max: DEFAULT_ITERATION_MAX,
            iteration_policy: IterationPolicy::default(),
        }
    }
}

impl NodeConfig {
    pub fn with_iteration_max(mut self, iteration_max: u64) -> Self {
        self.iteration_max = iteration_max;
        self
    }

    pub fn with_iteration_policy(mut self, policy: IterationPolicy) -> Self {
        self.iteration_policy = policy;
        self
    }
}

/// What [`Node::process_message`] did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Start,
    PeerUpdate,
    /// Unrecognised `Type`; carries the value
    Ignored(String),
}

/// How a node's loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Iteration bound reached
    Completed,
    /// Stopped early on an unrecovered failure
    Halted(String),
}

impl NodeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NodeOutcome::Completed)
    }
}

/// Completion signal sent when a node terminates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: NodeId,
    pub outcome: NodeOutcome,
}

/// Final report of a terminated node
#[derive(Debug, Clone)]
pub struct NodeReport {
    pub id: NodeId,
    /// Iteration counter value at termination
    pub iteration: u64,
    /// Messages retrieved and dispatched (ignored types included)
    pub messages_processed: u64,
    pub outcome: NodeOutcome,
    pub final_state: NodeState,
}

/// A simulated network participant
pub struct Node<A: Algorithm> {
    ctx: NodeContext,
    algorithm: A,
    config: NodeConfig,
    phase: NodePhase,
    messages_processed: u64,
    outcome: Option<NodeOutcome>,
    completion: Option<mpsc::UnboundedSender<Completion>>,
}

impl<A: Algorithm> Node<A> {
    /// Create an idle node with the default [`NodeConfig`]
    pub fn new(
        id: NodeId,
        neighbors: Vec<NodeId>,
        initial_state: NodeState,
        mailbox: Arc<dyn Mailbox>,
        algorithm: A,
    ) -> Self {
        let config = NodeConfig::default();
        Self {
            ctx: NodeContext::new(id, neighbors, initial_state, mailbox, config.iteration_max),
            algorithm,
            config,
            phase: NodePhase::Idle,
            messages_processed: 0,
            outcome: None,
            completion: None,
        }
    }

    /// Replace the node configuration (before the node is started)
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.ctx.set_iteration_max(config.iteration_max);
        self.config = config;
        self
    }

    /// Send a [`Completion`] on `sender` when the node terminates
    pub fn with_completion(mut self, sender: mpsc::UnboundedSender<Completion>) -> Self {
        self.completion = Some(sender);
        self
    }

    pub fn id(&self) -> NodeId {
        self.ctx.id()
    }

    pub fn neighbors(&self) -> &[NodeId] {
        self.ctx.neighbors()
    }

    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn context(&self) -> &NodeContext {
        &self.ctx
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    // ------------------------------------------------------------------
    // Outbound operations
    // ------------------------------------------------------------------

    pub fn send_message(&self, target: NodeId, message: Message) -> Result<(), NodeError> {
        self.ctx.send_message(target, message)
    }

    pub fn send_message_to_neighbors(&self, message: &Message) -> Result<(), NodeError> {
        self.ctx.send_message_to_neighbors(message)
    }

    pub fn send_values_to_neighbors(&self) -> Result<(), NodeError> {
        self.ctx.send_values_to_neighbors()
    }

    // ------------------------------------------------------------------
    // Dispatch and run loop
    // ------------------------------------------------------------------

    /// Decode one message and route it to the matching hook
    ///
    /// # Errors
    ///
    /// Fails if the payload does not decode, if it has no `Type` field, or
    /// if the hook fails. No hook runs when the `Type` is missing.
    /// A terminated node rejects every message with [`NodeError::Terminated`].
    pub fn process_message(&mut self, encoded: &EncodedMessage) -> Result<Dispatch, NodeError> {
        if self.phase == NodePhase::Terminated {
            return Err(NodeError::Terminated(self.id()));
        }

        let message = self.ctx.mailbox().codec().decode(encoded)?;

        match message.message_type()? {
            MessageType::Start => {
                self.algorithm.on_start(&mut self.ctx)?;
                Ok(Dispatch::Start)
            }
            MessageType::Response => {
                self.algorithm.on_peer_update(&mut self.ctx, message)?;
                Ok(Dispatch::PeerUpdate)
            }
            MessageType::Other(kind) => Ok(Dispatch::Ignored(kind)),
        }
    }

    /// Run the message loop until the iteration bound is reached
    ///
    /// Calling this again on a terminated node does nothing and returns the
    /// same report.
    pub async fn run(&mut self) -> NodeReport {
        let span = info_span!("node", node_id = %self.id(), algorithm = self.algorithm.name());
        self.run_loop().instrument(span).await
    }

    /// Move the node onto its own tokio task
    pub fn spawn(mut self) -> JoinHandle<NodeReport> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run_loop(&mut self) -> NodeReport {
        if self.phase == NodePhase::Terminated {
            warn!("node already terminated, not restarting");
            return self.report();
        }

        self.phase = NodePhase::Running;
        debug!(
            neighbors = self.ctx.neighbors().len(),
            iteration_max = self.config.iteration_max,
            policy = ?self.config.iteration_policy,
            "node running"
        );
        if self.config.iteration_policy == IterationPolicy::Manual {
            warn!("iteration bound is only reached if the algorithm advances the counter");
        }

        let id = self.id();
        let mailbox = self.ctx.mailbox().clone();

        let outcome = loop {
            if !self.ctx.within_bound() {
                break NodeOutcome::Completed;
            }

            let encoded = match mailbox.await_next(id).await {
                Ok(encoded) => encoded,
                Err(e) => {
                    error!(error = %e, "mailbox retrieval failed, halting");
                    break NodeOutcome::Halted(e.to_string());
                }
            };

            match self.process_message(&encoded) {
                Ok(dispatch) => trace!(?dispatch, iteration = self.ctx.iteration(), "dispatched"),
                Err(e) => {
                    error!(error = %e, iteration = self.ctx.iteration(), "dispatch failed, halting");
                    break NodeOutcome::Halted(e.to_string());
                }
            }

            self.messages_processed += 1;
            if self.config.iteration_policy == IterationPolicy::PerMessage {
                self.ctx.advance_iteration();
            }
        };

        self.finish(outcome)
    }

    fn finish(&mut self, outcome: NodeOutcome) -> NodeReport {
        self.phase = NodePhase::Terminated;
        self.outcome = Some(outcome.clone());

        info!(
            iteration = self.ctx.iteration(),
            messages = self.messages_processed,
            outcome = ?outcome,
            "Node {} finished.",
            self.id()
        );

        if let Some(sender) = self.completion.take() {
            // A dropped receiver only means nobody is listening.
            let _ = sender.send(Completion {
                id: self.id(),
                outcome,
            });
        }

        self.report()
    }

    fn report(&self) -> NodeReport {
        NodeReport {
            id: self.id(),
            iteration: self.ctx.iteration(),
            messages_processed: self.messages_processed,
            outcome: self
                .outcome
                .clone()
                .unwrap_or_else(|| NodeOutcome::Halted("not terminated".to_string())),
            final_state: self.ctx.state_snapshot(),
        }
    }
}

impl<A: Algorithm> std::fmt::Debug for Node<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("ctx", &self.ctx)
            .field("algorithm", &self.algorithm.name())
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish()
    }
}
