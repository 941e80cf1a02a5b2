//! Inbound Ports (Driving Ports / API)
//!
//! The synchronous operation boundary. Every method takes the caller
//! identity, already resolved and trusted, plus the operation arguments
//! with payload bytes already copied in.

use crate::domain::directory::MailboxSpec;
use crate::domain::errors::MailboxResult;
use crate::domain::mailbox::MailboxSummary;
use crate::domain::value_objects::{Privileges, RetrieveScope, UserId};

/// Hands a message body to the caller and reports how many bytes landed.
/// The message counts as consumed only if this returns `Ok`.
pub type Deliver<'a> = &'a mut dyn FnMut(&[u8]) -> MailboxResult<usize>;

/// Primary mailbox API
pub trait MailboxApi: Send + Sync {
    /// Registers `id` with `privileges`. Superuser only.
    fn add_user(&self, caller: UserId, id: UserId, privileges: Privileges) -> MailboxResult<()>;

    /// Unregisters `id`. Superuser only.
    fn remove_user(&self, caller: UserId, id: UserId) -> MailboxResult<()>;

    /// Overwrites the privilege mask of `id`. Superuser only.
    fn update_privileges(
        &self,
        caller: UserId,
        id: UserId,
        privileges: Privileges,
    ) -> MailboxResult<()>;

    /// Creates a mailbox. The caller needs the create-mailbox capability.
    fn create_mailbox(&self, caller: UserId, spec: MailboxSpec) -> MailboxResult<()>;

    /// Removes a mailbox and all its messages. Owner or superuser only.
    fn remove_mailbox(&self, caller: UserId, name: &str) -> MailboxResult<()>;

    /// Deposits a message into a named mailbox.
    ///
    /// Permission-model mailboxes check the send list and ignore
    /// `recipients`; target-list mailboxes require `recipients`.
    fn deposit_message(
        &self,
        caller: UserId,
        mailbox: &str,
        body: Vec<u8>,
        subject: Option<String>,
        recipients: Option<Vec<UserId>>,
    ) -> MailboxResult<()>;

    /// Delivers the oldest message the caller may still consume.
    ///
    /// `buffer_capacity` must be able to hold a maximum-size message.
    /// `deliver` runs under the mailbox lock; if it fails the message stays
    /// pending for the caller.
    fn retrieve_message_with(
        &self,
        caller: UserId,
        scope: RetrieveScope,
        buffer_capacity: usize,
        deliver: Deliver<'_>,
    ) -> MailboxResult<usize>;

    /// Retrieves the oldest message the caller may still consume.
    fn retrieve_message(
        &self,
        caller: UserId,
        scope: RetrieveScope,
        buffer_capacity: usize,
    ) -> MailboxResult<Vec<u8>> {
        let mut body = Vec::new();
        let mut collect = |bytes: &[u8]| -> MailboxResult<usize> {
            body.extend_from_slice(bytes);
            Ok(bytes.len())
        };
        self.retrieve_message_with(caller, scope, buffer_capacity, &mut collect)?;
        Ok(body)
    }

    /// Deletes the first message with `subject`. Needs delete-message.
    ///
    /// A message deposited without a subject is deleted with `""`.
    fn delete_message(&self, caller: UserId, mailbox: &str, subject: &str) -> MailboxResult<()>;

    /// Adds `id` to the send list. Needs modify-sender.
    fn add_sender(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()>;

    /// Removes `id` from the send list. Needs modify-sender.
    fn remove_sender(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()>;

    /// Adds `id` to the receive list. Needs modify-receiver.
    fn add_receiver(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()>;

    /// Removes `id` from the receive list. Needs modify-receiver.
    fn remove_receiver(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()>;

    /// Deposits into the unrestricted single queue.
    ///
    /// `recipients` is a whitespace-separated identity list.
    fn queue_deposit(&self, caller: UserId, body: Vec<u8>, recipients: &str) -> MailboxResult<()>;

    /// Delivers from the unrestricted single queue, with the same
    /// all-or-nothing rule as `retrieve_message_with`.
    fn queue_retrieve_with(
        &self,
        caller: UserId,
        buffer_capacity: usize,
        deliver: Deliver<'_>,
    ) -> MailboxResult<usize>;

    /// Retrieves from the unrestricted single queue.
    fn queue_retrieve(&self, caller: UserId, buffer_capacity: usize) -> MailboxResult<Vec<u8>> {
        let mut body = Vec::new();
        let mut collect = |bytes: &[u8]| -> MailboxResult<usize> {
            body.extend_from_slice(bytes);
            Ok(bytes.len())
        };
        self.queue_retrieve_with(caller, buffer_capacity, &mut collect)?;
        Ok(body)
    }

    /// Largest accepted message body, in bytes.
    fn max_message_len(&self) -> usize;

    /// Registry snapshot in registration order.
    fn list_users(&self) -> Vec<(UserId, Privileges)>;

    /// Snapshot of every live mailbox, in directory order.
    fn mailbox_summaries(&self) -> Vec<MailboxSummary>;
}
