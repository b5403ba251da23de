//! # Meshlab Core
//!
//! The node actor abstraction for the Meshlab network simulator.
//!
//! A simulated network is a set of [`Node`]s, each running as its own tokio
//! task. Nodes never share state: they talk only by handing [`Message`]s to a
//! shared [`Mailbox`] service, which keeps one FIFO queue per node id.
//!
//! Algorithm designers implement the two [`Algorithm`] hooks; the node
//! supplies identity, neighbors, decoding, dispatch, and the bounded run loop.
//!
//! ## Key Traits
//!
//! - [`Algorithm`]: `on_start` / `on_peer_update` hooks of an algorithm variant
//! - [`Mailbox`]: per-node queue contract (`deliver` / `await_next`)
//! - [`MessageCodec`]: encoding of messages while they sit in a mailbox
//!
//! ## Key Types
//!
//! - [`NodeId`]: Integer node identity
//! - [`Message`]: Keyed record with typed routing accessors
//! - [`ChannelMailbox`]: In-memory mailbox backed by tokio channels
//! - [`Node`]: The actor driving the run loop
//! - [`NodeContext`]: What a hook sees: id, neighbors, state, outbound operations
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meshlab_core::*;
//!
//! struct Gossip;
//!
//! impl Algorithm for Gossip {
//!     fn on_start(&mut self, ctx: &mut NodeContext) -> Result<(), NodeError> {
//!         ctx.send_values_to_neighbors()
//!     }
//!
//!     fn on_peer_update(&mut self, ctx: &mut NodeContext, message: Message) -> Result<(), NodeError> {
//!         ctx.set_value("seen", message.get_data("value")?);
//!         Ok(())
//!     }
//! }
//!
//! let mailbox = Arc::new(ChannelMailbox::with_nodes(NodeId::range(2)));
//! let node = Node::new(NodeId(1), vec![NodeId(2)], Default::default(), mailbox.clone(), Gossip);
//! let handle = node.spawn();
//! mailbox.deliver(NodeId(1), &Message::start())?;
//! ```

pub mod algorithm;
pub mod codec;
pub mod error;
pub mod identity;
pub mod mailbox;
pub mod message;
pub mod node;

// Re-export main types
pub use algorithm::*;
pub use codec::*;
pub use error::*;
pub use identity::*;
pub use mailbox::*;
pub use message::*;
pub use node::*;
