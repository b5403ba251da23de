//! Mailbox service
//!
//! The [`Mailbox`] trait is the only channel between nodes: one FIFO queue
//! per node id, filled by [`Mailbox::deliver`] and drained one message at a
//! time by [`Mailbox::await_next`].
//!
//! [`ChannelMailbox`] is the in-memory implementation used by the simulator.
//! Each registered node gets an unbounded tokio channel, so delivery never
//! blocks and retrieval suspends the calling task until a message arrives.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meshlab_core::{ChannelMailbox, Mailbox, Message, NodeId};
//!
//! let mailbox = ChannelMailbox::with_nodes(NodeId::range(2));
//! mailbox.deliver(NodeId(2), &Message::start())?;
//!
//! let encoded = mailbox.await_next(NodeId(2)).await?;
//! let message = mailbox.codec().decode(&encoded)?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use crate::codec::{EncodedMessage, MessageCodec, PostcardCodec};
use crate::error::MailboxError;
use crate::identity::NodeId;
use crate::message::Message;

/// Per-node FIFO message queues
///
/// Implementations must be reliable (no drops) and preserve FIFO order per
/// target id. There is no timeout on [`await_next`](Mailbox::await_next):
/// a node waiting for a message that is never sent waits forever.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Encode `message` and enqueue it for `target`
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::UnknownRecipient`] if `target` has no queue.
    fn deliver(&self, target: NodeId, message: &Message) -> Result<(), MailboxError>;

    /// Wait for the next message queued for `id` and dequeue it
    async fn await_next(&self, id: NodeId) -> Result<EncodedMessage, MailboxError>;

    /// Dequeue the next message for `id` if one is already waiting
    fn try_next(&self, id: NodeId) -> Result<Option<EncodedMessage>, MailboxError>;

    /// Number of messages waiting for `id`
    fn pending(&self, id: NodeId) -> Result<usize, MailboxError>;

    /// The codec used to encode delivered messages
    fn codec(&self) -> &dyn MessageCodec;
}

/// Counters for mailbox traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    pub delivered: u64,
    pub retrieved: u64,
}

struct Slot {
    tx: mpsc::UnboundedSender<EncodedMessage>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<EncodedMessage>>>,
    queued: Arc<AtomicUsize>,
}

impl Slot {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// In-memory mailbox service backed by tokio channels
pub struct ChannelMailbox {
    slots: DashMap<NodeId, Slot>,
    codec: Arc<dyn MessageCodec>,
    delivered: AtomicU64,
    retrieved: AtomicU64,
}

impl std::fmt::Debug for ChannelMailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelMailbox")
            .field("nodes", &self.slots.len())
            .field("codec", &self.codec.name())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for ChannelMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelMailbox {
    /// Create an empty mailbox service using [`PostcardCodec`]
    pub fn new() -> Self {
        Self::with_codec(Arc::new(PostcardCodec))
    }

    /// Create an empty mailbox service using the given codec
    pub fn with_codec(codec: Arc<dyn MessageCodec>) -> Self {
        Self {
            slots: DashMap::new(),
            codec,
            delivered: AtomicU64::new(0),
            retrieved: AtomicU64::new(0),
        }
    }

    /// Create a mailbox service with a queue for each of `ids`
    pub fn with_nodes(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mailbox = Self::new();
        for id in ids {
            mailbox.register(id);
        }
        mailbox
    }

    /// Create a queue for `id`; registering twice keeps the existing queue
    pub fn register(&self, id: NodeId) {
        self.slots.entry(id).or_insert_with(Slot::new);
    }

    /// Drop the queue for `id`
    ///
    /// Later deliveries fail with `UnknownRecipient`; a node currently
    /// waiting on the queue gets `Closed` once the queue drains.
    pub fn unregister(&self, id: NodeId) -> bool {
        self.slots.remove(&id).is_some()
    }

    pub fn is_registered(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.slots.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            retrieved: self.retrieved.load(Ordering::Relaxed),
        }
    }

    fn receiver(
        &self,
        id: NodeId,
    ) -> Result<(Arc<Mutex<mpsc::UnboundedReceiver<EncodedMessage>>>, Arc<AtomicUsize>), MailboxError>
    {
        let slot = self
            .slots
            .get(&id)
            .ok_or(MailboxError::UnknownRecipient(id))?;
        Ok((slot.rx.clone(), slot.queued.clone()))
    }

    fn mark_retrieved(&self, queued: &AtomicUsize) {
        queued.fetch_sub(1, Ordering::Relaxed);
        self.retrieved.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl Mailbox for ChannelMailbox {
    fn deliver(&self, target: NodeId, message: &Message) -> Result<(), MailboxError> {
        let slot = self
            .slots
            .get(&target)
            .ok_or(MailboxError::UnknownRecipient(target))?;

        let encoded = self.codec.encode(message)?;
        trace!(target_node = %target, bytes = encoded.len(), "enqueue message");

        slot.queued.fetch_add(1, Ordering::Relaxed);
        if slot.tx.send(encoded).is_err() {
            slot.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(MailboxError::Closed(target));
        }

        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn await_next(&self, id: NodeId) -> Result<EncodedMessage, MailboxError> {
        // The map guard must not be held across the await below.
        let (rx, queued) = self.receiver(id)?;

        let mut rx = rx.lock().await;
        let encoded = rx.recv().await.ok_or(MailboxError::Closed(id))?;
        self.mark_retrieved(&queued);
        Ok(encoded)
    }

    fn try_next(&self, id: NodeId) -> Result<Option<EncodedMessage>, MailboxError> {
        let (rx, queued) = self.receiver(id)?;

        // Someone is already waiting on this queue; it gets the next message.
        let Ok(mut rx) = rx.try_lock() else {
            return Ok(None);
        };

        match rx.try_recv() {
            Ok(encoded) => {
                self.mark_retrieved(&queued);
                Ok(Some(encoded))
            }
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(MailboxError::Closed(id)),
        }
    }

    fn pending(&self, id: NodeId) -> Result<usize, MailboxError> {
        let slot = self
            .slots
            .get(&id)
            .ok_or(MailboxError::UnknownRecipient(id))?;
        Ok(slot.queued.load(Ordering::Relaxed))
    }

    fn codec(&self) -> &dyn MessageCodec {
        self.codec.as_ref()
    }
}
