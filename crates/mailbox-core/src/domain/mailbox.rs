//! Mailbox entity: a named store with an owner, a kind and two access lists.

use super::acl::AccessList;
use super::errors::{MailboxError, MailboxResult};
use super::message::MessageId;
use super::permission;
use super::store::{MessageStore, Retrieved};
use super::value_objects::{DeliveryModel, Direction, MailboxKind, Privileges, UserId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A named, access-controlled message queue.
#[derive(Clone, Debug)]
pub struct Mailbox {
    name: String,
    owner: UserId,
    kind: MailboxKind,
    send_acl: AccessList,
    receive_acl: AccessList,
    store: MessageStore,
}

impl Mailbox {
    pub fn new(
        name: String,
        owner: UserId,
        kind: MailboxKind,
        send_acl: AccessList,
        receive_acl: AccessList,
        store: MessageStore,
    ) -> Self {
        Self {
            name,
            owner,
            kind,
            send_acl,
            receive_acl,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn kind(&self) -> MailboxKind {
        self.kind
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn acl(&self, direction: Direction) -> &AccessList {
        match direction {
            Direction::Send => &self.send_acl,
            Direction::Receive => &self.receive_acl,
        }
    }

    fn acl_mut(&mut self, direction: Direction) -> &mut AccessList {
        match direction {
            Direction::Send => &mut self.send_acl,
            Direction::Receive => &mut self.receive_acl,
        }
    }

    /// Permission evaluator applied to this mailbox.
    pub fn eligible(&self, caller: UserId, direction: Direction) -> bool {
        permission::eligible(caller, self.kind, self.acl(direction))
    }

    /// Only the owner and the superuser may remove a mailbox.
    pub fn may_remove(&self, caller: UserId) -> bool {
        caller.is_superuser() || caller == self.owner
    }

    /// Deposits a message.
    ///
    /// Permission-model mailboxes check the send list; target-list mailboxes
    /// take `recipients` instead and skip the lists entirely.
    pub fn deposit(
        &mut self,
        caller: UserId,
        body: Vec<u8>,
        subject: Option<String>,
        recipients: Option<Vec<UserId>>,
    ) -> MailboxResult<MessageId> {
        self.store.check_body_len(&body)?;

        if self.store.model() == DeliveryModel::Permission && !self.eligible(caller, Direction::Send) {
            warn!(mailbox = %self.name, caller = %caller, "Caller may not send to mailbox");
            return Err(MailboxError::Forbidden {
                caller: caller.0,
                action: "send to",
                mailbox: self.name.clone(),
            });
        }

        self.store.deposit(&self.name, body, subject, recipients)
    }

    /// Takes the oldest message `caller` may still consume, if any.
    pub fn retrieve(&mut self, caller: UserId) -> Option<Retrieved> {
        let list_eligible = self.eligible(caller, Direction::Receive);
        self.store.take_next(&self.name, caller, list_eligible)
    }

    /// Hands the oldest message `caller` may still consume to `deliver`.
    /// The message is consumed only when `deliver` succeeds.
    pub fn retrieve_with<R>(
        &mut self,
        caller: UserId,
        deliver: impl FnOnce(&[u8]) -> MailboxResult<R>,
    ) -> Option<MailboxResult<(Retrieved, R)>> {
        let list_eligible = self.eligible(caller, Direction::Receive);
        self.store.take_next_with(&self.name, caller, list_eligible, deliver)
    }

    /// Deletes the first message with `subject`.
    pub fn delete_by_subject(&mut self, subject: &str) -> MailboxResult<MessageId> {
        self.store
            .delete_by_subject(&self.name, subject)
            .map(|message| message.id())
    }

    /// Adds `id` to a list, rejecting duplicates.
    pub fn grant(
        &mut self,
        direction: Direction,
        id: UserId,
        privileges: Option<Privileges>,
    ) -> MailboxResult<()> {
        let name = self.name.clone();
        let acl = self.acl_mut(direction);
        if acl.contains(id) {
            return Err(MailboxError::already_exists(format!(
                "User {} in {} list of {}",
                id,
                direction_label(direction),
                name
            )));
        }

        acl.add(id, privileges);
        info!(mailbox = %name, user = %id, list = direction_label(direction), "Added to access list");
        Ok(())
    }

    /// Removes `id` from a list.
    pub fn revoke(&mut self, direction: Direction, id: UserId) -> MailboxResult<()> {
        let name = self.name.clone();
        if !self.acl_mut(direction).remove(id) {
            return Err(MailboxError::not_found(format!(
                "User {} in {} list of {}",
                id,
                direction_label(direction),
                name
            )));
        }

        info!(mailbox = %name, user = %id, list = direction_label(direction), "Removed from access list");
        Ok(())
    }

    pub fn summary(&self) -> MailboxSummary {
        MailboxSummary {
            name: self.name.clone(),
            owner: self.owner,
            kind: self.kind,
            delivery_model: self.store.model(),
            message_count: self.store.count(),
            senders: self.send_acl.identities(),
            receivers: self.receive_acl.identities(),
        }
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Send => "send",
        Direction::Receive => "receive",
    }
}

/// Read-only snapshot of a mailbox for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxSummary {
    pub name: String,
    pub owner: UserId,
    pub kind: MailboxKind,
    pub delivery_model: DeliveryModel,
    pub message_count: usize,
    pub senders: Vec<UserId>,
    pub receivers: Vec<UserId>,
}
