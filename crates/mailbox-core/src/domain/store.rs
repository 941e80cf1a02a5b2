//! Bounded, ordered message store.
//!
//! Insertion order is retrieval order (oldest first). The delivery model is
//! a policy flag of the store:
//!
//! | Model | Deposit | Retrieve | Collection |
//! |-------|---------|----------|------------|
//! | `TargetList` | explicit recipients | caller must be pending | when no recipient is pending |
//! | `Permission` | subject only | caller must be list-eligible and unserved | never (delete by subject) |
//!
//! The message count is the length of the sequence, so `count == len` holds
//! by construction.

use super::errors::{MailboxError, MailboxResult};
use super::message::{Message, MessageId};
use super::value_objects::{DeliveryModel, UserId};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// What a successful retrieval hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retrieved {
    pub message_id: MessageId,
    pub body: Vec<u8>,
    /// The message was destroyed because every recipient consumed it.
    pub collected: bool,
}

/// Per-mailbox message queue.
#[derive(Clone, Debug)]
pub struct MessageStore {
    model: DeliveryModel,
    capacity: usize,
    max_message_len: usize,
    messages: VecDeque<Message>,
    next_id: MessageId,
}

impl MessageStore {
    pub fn new(model: DeliveryModel, capacity: usize, max_message_len: usize) -> Self {
        Self {
            model,
            capacity,
            max_message_len,
            messages: VecDeque::with_capacity(capacity),
            next_id: 1,
        }
    }

    pub fn model(&self) -> DeliveryModel {
        self.model
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.messages.len() >= self.capacity
    }

    /// Messages oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Rejects bodies longer than the configured maximum.
    pub fn check_body_len(&self, body: &[u8]) -> MailboxResult<()> {
        if body.len() > self.max_message_len {
            return Err(MailboxError::PayloadTooLarge {
                size: body.len(),
                max: self.max_message_len,
            });
        }
        Ok(())
    }

    /// Appends a message at the tail.
    ///
    /// Target-list stores require a non-empty `recipients` list (repeats
    /// collapse to one); permission stores ignore it. Nothing changes on
    /// failure.
    pub fn deposit(
        &mut self,
        label: &str,
        body: Vec<u8>,
        subject: Option<String>,
        recipients: Option<Vec<UserId>>,
    ) -> MailboxResult<MessageId> {
        self.check_body_len(&body)?;

        let recipients = match (self.model, recipients) {
            (DeliveryModel::TargetList, Some(mut r)) if !r.is_empty() => {
                let mut seen = Vec::with_capacity(r.len());
                r.retain(|id| {
                    let first = !seen.contains(id);
                    seen.push(*id);
                    first
                });
                Some(r)
            }
            (DeliveryModel::TargetList, _) => {
                return Err(MailboxError::invalid(
                    "target-list delivery requires at least one recipient",
                ))
            }
            (DeliveryModel::Permission, _) => None,
        };

        if self.is_full() {
            return Err(MailboxError::MailboxFull {
                mailbox: label.to_string(),
                capacity: self.capacity,
            });
        }

        let id = self.next_id;
        self.next_id += 1;

        let size = body.len();
        let message = match recipients {
            Some(recipients) => Message::addressed(id, body, subject, recipients),
            None => Message::open(id, body, subject),
        };
        self.messages.push_back(message);

        info!(
            mailbox = label,
            message_id = id,
            size,
            count = self.messages.len(),
            "Message deposited"
        );
        Ok(id)
    }

    /// Oldest message `caller` has not consumed yet. Nothing changes.
    ///
    /// `list_eligible` is the permission evaluator's verdict on the
    /// mailbox's receive list; only permission stores consult it.
    pub fn peek_next(&self, label: &str, caller: UserId, list_eligible: bool) -> Option<&Message> {
        if self.model == DeliveryModel::Permission && !list_eligible {
            debug!(mailbox = label, caller = %caller, "Caller not eligible to receive");
            return None;
        }
        self.messages.iter().find(|m| m.awaits(caller))
    }

    /// Records that `caller` consumed `message_id`, collecting the message
    /// when no recipient is left. `None` if the message is gone or `caller`
    /// already consumed it.
    pub fn commit_delivery(&mut self, label: &str, message_id: MessageId, caller: UserId) -> Option<Retrieved> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id() == message_id && m.awaits(caller))?;
        let message = &mut self.messages[index];
        message.mark_delivered(caller);

        let body = message.body().to_vec();
        let collected = message.is_collectable();

        if collected {
            self.messages.remove(index);
            info!(
                mailbox = label,
                message_id,
                count = self.messages.len(),
                "Message garbage collected"
            );
        } else {
            debug!(mailbox = label, message_id, caller = %caller, "Message delivered");
        }

        Some(Retrieved {
            message_id,
            body,
            collected,
        })
    }

    /// Hands the oldest message `caller` has not consumed yet.
    pub fn take_next(&mut self, label: &str, caller: UserId, list_eligible: bool) -> Option<Retrieved> {
        let message_id = self.peek_next(label, caller, list_eligible)?.id();
        self.commit_delivery(label, message_id, caller)
    }

    /// Like `take_next`, but the message is consumed only if `deliver`
    /// accepts its body. On failure the store is untouched.
    pub fn take_next_with<R>(
        &mut self,
        label: &str,
        caller: UserId,
        list_eligible: bool,
        deliver: impl FnOnce(&[u8]) -> MailboxResult<R>,
    ) -> Option<MailboxResult<(Retrieved, R)>> {
        let message = self.peek_next(label, caller, list_eligible)?;
        let message_id = message.id();
        let delivered = match deliver(message.body()) {
            Ok(delivered) => delivered,
            Err(e) => {
                warn!(mailbox = label, message_id, caller = %caller, error = %e, "Delivery failed, message kept");
                return Some(Err(e));
            }
        };
        self.commit_delivery(label, message_id, caller)
            .map(|retrieved| Ok((retrieved, delivered)))
    }

    /// Removes the first message whose subject equals `subject`. A message
    /// deposited without a subject matches the empty subject.
    pub fn delete_by_subject(&mut self, label: &str, subject: &str) -> MailboxResult<Message> {
        let index = self
            .messages
            .iter()
            .position(|m| m.subject().unwrap_or_default() == subject)
            .ok_or_else(|| {
                MailboxError::not_found(format!("Message with subject {:?} in {}", subject, label))
            })?;

        let removed = self
            .messages
            .remove(index)
            .ok_or_else(|| MailboxError::not_found(format!("Message at {}", index)))?;

        info!(
            mailbox = label,
            message_id = removed.id(),
            count = self.messages.len(),
            "Message deleted by subject"
        );
        Ok(removed)
    }
}
