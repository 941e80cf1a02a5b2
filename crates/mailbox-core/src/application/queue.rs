//! Unrestricted single-mailbox queue.
//!
//! No users, no access lists: a depositor names the recipients explicitly
//! and the message is collected once all of them have retrieved it. The
//! store is created on the first successful deposit.

use crate::domain::errors::{MailboxError, MailboxResult};
use crate::domain::message::MessageId;
use crate::domain::store::MessageStore;
use crate::domain::value_objects::{DeliveryModel, UserId};
use parking_lot::Mutex;
use tracing::{debug, warn};

const QUEUE_LABEL: &str = "queue";

/// Parses a whitespace-separated recipient list.
///
/// Tokens that are not identities are skipped with a warning and repeated
/// identities collapse to one. An empty result is an error.
pub fn parse_recipients(text: &str) -> MailboxResult<Vec<UserId>> {
    let mut recipients: Vec<UserId> = Vec::new();

    for token in text.split_whitespace() {
        match token.parse::<u32>() {
            Ok(raw) => {
                let id = UserId(raw);
                if !recipients.contains(&id) {
                    recipients.push(id);
                }
            }
            Err(_) => warn!(token, "Skipping malformed recipient"),
        }
    }

    if recipients.is_empty() {
        return Err(MailboxError::InvalidArgument {
            reason: "recipient list names nobody".into(),
        });
    }
    Ok(recipients)
}

/// The single target-list mailbox.
pub struct MessageQueue {
    capacity: usize,
    max_message_len: usize,
    store: Mutex<Option<MessageStore>>,
}

impl MessageQueue {
    pub fn new(capacity: usize, max_message_len: usize) -> Self {
        Self {
            capacity,
            max_message_len,
            store: Mutex::new(None),
        }
    }

    /// Whether the first deposit has happened.
    pub fn is_created(&self) -> bool {
        self.store.lock().is_some()
    }

    pub fn count(&self) -> usize {
        self.store.lock().as_ref().map_or(0, MessageStore::count)
    }

    /// Deposits `body` for the identities listed in `recipients`.
    pub fn deposit(&self, caller: UserId, body: Vec<u8>, recipients: &str) -> MailboxResult<MessageId> {
        if body.len() > self.max_message_len {
            warn!(caller = %caller, size = body.len(), "Queue payload too large");
            return Err(MailboxError::PayloadTooLarge {
                size: body.len(),
                max: self.max_message_len,
            });
        }
        let recipients = parse_recipients(recipients)?;

        let mut guard = self.store.lock();
        let store = guard.get_or_insert_with(|| {
            debug!("Creating message queue");
            MessageStore::new(DeliveryModel::TargetList, self.capacity, self.max_message_len)
        });

        store
            .deposit(QUEUE_LABEL, body, None, Some(recipients))
            .inspect_err(|e| warn!(caller = %caller, error = %e, "Queue deposit failed"))
    }

    /// Hands `caller` the oldest message addressed to it.
    pub fn retrieve(&self, caller: UserId) -> MailboxResult<Vec<u8>> {
        self.retrieve_with(caller, |body| Ok(body.to_vec()))
    }

    /// Passes the oldest message addressed to `caller` to `deliver`; the
    /// message is consumed only when `deliver` succeeds.
    pub fn retrieve_with<R>(
        &self,
        caller: UserId,
        deliver: impl FnOnce(&[u8]) -> MailboxResult<R>,
    ) -> MailboxResult<R> {
        let mut guard = self.store.lock();
        let (_, delivered) = guard
            .as_mut()
            .and_then(|store| store.take_next_with(QUEUE_LABEL, caller, false, deliver))
            .ok_or(MailboxError::NoMessage { caller: caller.0 })??;
        Ok(delivered)
    }

    /// Runs `check` against the store, if it exists.
    pub(crate) fn with_store<R>(&self, check: impl FnOnce(&MessageStore) -> R) -> Option<R> {
        self.store.lock().as_ref().map(check)
    }
}
