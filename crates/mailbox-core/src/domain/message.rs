//! Message entity and its per-recipient delivery bookkeeping.
//!
//! ## State Machine
//!
//! ```text
//! [PENDING] ──retrieve──→ [PARTIALLY_DELIVERED]* ──last recipient──→ [CONSUMED]
//!     │                            │
//!     └────────── delete by subject ──────────→ [DELETED]
//! ```
//!
//! Transitions only move forward; a message is never re-queued.

use super::value_objects::{DeliveryModel, UserId};

/// Monotonic identifier assigned by the owning store. Used for logging.
pub type MessageId = u64;

/// Delivery bookkeeping, one variant per delivery model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Target-list model: recipients that have not retrieved the message yet.
    Pending(Vec<UserId>),
    /// Permission model: recipients that already retrieved the message.
    Delivered(Vec<UserId>),
}

/// Observable lifecycle stage of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageState {
    Pending,
    PartiallyDelivered,
    Consumed,
}

/// A message held by a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    body: Vec<u8>,
    subject: Option<String>,
    delivery: Delivery,
    initial_recipients: usize,
}

impl Message {
    /// Creates a target-list message addressed to `recipients`.
    pub fn addressed(id: MessageId, body: Vec<u8>, subject: Option<String>, recipients: Vec<UserId>) -> Self {
        let initial_recipients = recipients.len();
        Self {
            id,
            body,
            subject,
            delivery: Delivery::Pending(recipients),
            initial_recipients,
        }
    }

    /// Creates a permission-model message with nobody served yet.
    pub fn open(id: MessageId, body: Vec<u8>, subject: Option<String>) -> Self {
        Self {
            id,
            body,
            subject,
            delivery: Delivery::Delivered(Vec::new()),
            initial_recipients: 0,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    pub fn model(&self) -> DeliveryModel {
        match self.delivery {
            Delivery::Pending(_) => DeliveryModel::TargetList,
            Delivery::Delivered(_) => DeliveryModel::Permission,
        }
    }

    /// Whether `caller` still has this message to consume.
    ///
    /// Eligibility from the mailbox lists is not considered here.
    pub fn awaits(&self, caller: UserId) -> bool {
        match &self.delivery {
            Delivery::Pending(pending) => pending.contains(&caller),
            Delivery::Delivered(served) => !served.contains(&caller),
        }
    }

    /// Records that `caller` consumed the message.
    pub fn mark_delivered(&mut self, caller: UserId) {
        match &mut self.delivery {
            Delivery::Pending(pending) => {
                if let Some(index) = pending.iter().position(|id| *id == caller) {
                    pending.remove(index);
                }
            }
            Delivery::Delivered(served) => {
                if !served.contains(&caller) {
                    served.push(caller);
                }
            }
        }
    }

    /// True once a target-list message has no pending recipient left.
    /// Permission-model messages are never collectable.
    pub fn is_collectable(&self) -> bool {
        matches!(&self.delivery, Delivery::Pending(pending) if pending.is_empty())
    }

    pub fn state(&self) -> MessageState {
        match &self.delivery {
            Delivery::Pending(pending) if pending.is_empty() => MessageState::Consumed,
            Delivery::Pending(pending) if pending.len() < self.initial_recipients => {
                MessageState::PartiallyDelivered
            }
            Delivery::Pending(_) => MessageState::Pending,
            Delivery::Delivered(served) if served.is_empty() => MessageState::Pending,
            Delivery::Delivered(_) => MessageState::PartiallyDelivered,
        }
    }
}
