//! Mailbox Service
//!
//! Main service implementing `MailboxApi`. One instance is the whole
//! engine: user registry, mailbox directory and the basic queue.
//!
//! ## Locking
//!
//! Locks are always taken in the order users → directory → mailbox.
//! Creating or removing a mailbox takes the directory write lock; every
//! other mailbox operation takes the directory read lock plus the
//! mailbox's own mutex, so operations on one mailbox never interleave.

use crate::application::queue::MessageQueue;
use crate::config::MailboxConfig;
use crate::domain::directory::{MailboxDirectory, MailboxSpec, SharedMailbox};
use crate::domain::errors::{MailboxError, MailboxResult};
use crate::domain::invariants;
use crate::domain::mailbox::MailboxSummary;
use crate::domain::permission::require_capability;
use crate::domain::user::UserRegistry;
use crate::domain::value_objects::{Direction, Privileges, RetrieveScope, UserId};
use crate::ports::inbound::{Deliver, MailboxApi};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

/// Mailbox Service
pub struct MailboxService {
    config: MailboxConfig,
    users: RwLock<UserRegistry>,
    directory: RwLock<MailboxDirectory>,
    queue: MessageQueue,
}

impl MailboxService {
    /// Create a new service with default config
    pub fn new() -> Self {
        Self::with_config(MailboxConfig::default())
    }

    /// Create a new service with custom config
    pub fn with_config(config: MailboxConfig) -> Self {
        let directory = MailboxDirectory::new(&config);
        let queue = MessageQueue::new(config.max_message_count, config.max_message_len);
        Self {
            config,
            users: RwLock::new(UserRegistry::new()),
            directory: RwLock::new(directory),
            queue,
        }
    }

    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    pub fn mailbox_count(&self) -> usize {
        self.directory.read().len()
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    /// Verifies the structural invariants of every store.
    pub fn check_invariants(&self) -> Result<(), String> {
        let directory = self.directory.read();

        let names = directory.names();
        if !invariants::invariant_unique_names(names.iter().map(String::as_str)) {
            return Err("duplicate mailbox names".into());
        }
        for mailbox in directory.mailboxes() {
            invariants::check_mailbox(&mailbox.lock())?;
        }

        let queue_ok = self.queue.with_store(|store| {
            invariants::invariant_count_matches(store)
                && invariants::invariant_within_capacity(store)
                && invariants::invariant_no_collectable_messages(store)
        });
        if queue_ok == Some(false) {
            return Err("message queue invariants violated".into());
        }
        Ok(())
    }

    fn check_buffer(&self, buffer_capacity: usize) -> MailboxResult<()> {
        if buffer_capacity < self.config.max_message_len {
            return Err(MailboxError::BufferTooSmall {
                size: buffer_capacity,
                required: self.config.max_message_len,
            });
        }
        Ok(())
    }

    fn check_subject(&self, subject: Option<&str>) -> MailboxResult<()> {
        match subject {
            Some(s) if s.len() > self.config.max_subject_len => Err(MailboxError::PayloadTooLarge {
                size: s.len(),
                max: self.config.max_subject_len,
            }),
            _ => Ok(()),
        }
    }

    fn find(&self, name: &str) -> MailboxResult<SharedMailbox> {
        self.directory.read().find(name)
    }

    /// Resolves `name` and checks that `caller` holds `capability`.
    fn authorize_on(
        &self,
        users: &UserRegistry,
        caller: UserId,
        name: &str,
        capability: Privileges,
        action: &str,
    ) -> MailboxResult<SharedMailbox> {
        let mailbox = self.find(name)?;
        require_capability(caller, users.lookup(caller).ok(), capability, action).inspect_err(
            |e| warn!(caller = %caller, mailbox = name, error = %e, "Capability check failed"),
        )?;
        Ok(mailbox)
    }

    fn edit_acl(
        &self,
        caller: UserId,
        name: &str,
        direction: Direction,
        id: UserId,
        grant: bool,
    ) -> MailboxResult<()> {
        let (capability, action) = match direction {
            Direction::Send => (Privileges::MODIFY_SENDERS, "modify a send list"),
            Direction::Receive => (Privileges::MODIFY_RECEIVERS, "modify a receive list"),
        };

        let users = self.users.read();
        let mailbox = self.authorize_on(&users, caller, name, capability, action)?;
        let mut mailbox = mailbox.lock();

        if grant {
            mailbox.grant(direction, id, users.lookup(id).ok())
        } else {
            mailbox.revoke(direction, id)
        }
    }
}

impl Default for MailboxService {
    fn default() -> Self {
        Self::new()
    }
}

impl MailboxApi for MailboxService {
    fn add_user(&self, caller: UserId, id: UserId, privileges: Privileges) -> MailboxResult<()> {
        self.users.write().add_user(id, privileges, caller)
    }

    fn remove_user(&self, caller: UserId, id: UserId) -> MailboxResult<()> {
        self.users.write().remove_user(id, caller)
    }

    fn update_privileges(
        &self,
        caller: UserId,
        id: UserId,
        privileges: Privileges,
    ) -> MailboxResult<()> {
        self.users.write().update_privileges(id, privileges, caller)
    }

    fn create_mailbox(&self, caller: UserId, spec: MailboxSpec) -> MailboxResult<()> {
        let users = self.users.read();
        self.directory.write().create(spec, caller, &users)?;
        Ok(())
    }

    fn remove_mailbox(&self, caller: UserId, name: &str) -> MailboxResult<()> {
        self.directory.write().remove(name, caller)
    }

    fn deposit_message(
        &self,
        caller: UserId,
        mailbox: &str,
        body: Vec<u8>,
        subject: Option<String>,
        recipients: Option<Vec<UserId>>,
    ) -> MailboxResult<()> {
        if body.len() > self.config.max_message_len {
            warn!(caller = %caller, mailbox, size = body.len(), "Payload too large");
            return Err(MailboxError::PayloadTooLarge {
                size: body.len(),
                max: self.config.max_message_len,
            });
        }
        self.check_subject(subject.as_deref())?;

        let handle = self.find(mailbox)?;
        let mut target = handle.lock();
        target
            .deposit(caller, body, subject, recipients)
            .inspect_err(|e| warn!(caller = %caller, mailbox, error = %e, "Deposit rejected"))?;
        Ok(())
    }

    fn retrieve_message_with(
        &self,
        caller: UserId,
        scope: RetrieveScope,
        buffer_capacity: usize,
        deliver: Deliver<'_>,
    ) -> MailboxResult<usize> {
        self.check_buffer(buffer_capacity)?;

        let directory = self.directory.read();
        let candidates: Vec<SharedMailbox> = match &scope {
            RetrieveScope::Any => directory.mailboxes().cloned().collect(),
            RetrieveScope::Named(name) => vec![directory.find(name)?],
        };

        for handle in candidates {
            let mut mailbox = handle.lock();
            if let Some(outcome) = mailbox.retrieve_with(caller, |body| deliver(body)) {
                let (retrieved, copied) = outcome?;
                info!(
                    mailbox = mailbox.name(),
                    caller = %caller,
                    message_id = retrieved.message_id,
                    size = retrieved.body.len(),
                    "Message retrieved"
                );
                return Ok(copied);
            }
            debug!(mailbox = mailbox.name(), caller = %caller, "Nothing to retrieve");
        }

        Err(MailboxError::NoMessage { caller: caller.0 })
    }

    fn delete_message(&self, caller: UserId, mailbox: &str, subject: &str) -> MailboxResult<()> {
        let users = self.users.read();
        let handle = self.authorize_on(
            &users,
            caller,
            mailbox,
            Privileges::DELETE_MESSAGE,
            "delete a message",
        )?;
        let mut target = handle.lock();
        target.delete_by_subject(subject)?;
        Ok(())
    }

    fn add_sender(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()> {
        self.edit_acl(caller, mailbox, Direction::Send, id, true)
    }

    fn remove_sender(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()> {
        self.edit_acl(caller, mailbox, Direction::Send, id, false)
    }

    fn add_receiver(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()> {
        self.edit_acl(caller, mailbox, Direction::Receive, id, true)
    }

    fn remove_receiver(&self, caller: UserId, mailbox: &str, id: UserId) -> MailboxResult<()> {
        self.edit_acl(caller, mailbox, Direction::Receive, id, false)
    }

    fn queue_deposit(&self, caller: UserId, body: Vec<u8>, recipients: &str) -> MailboxResult<()> {
        self.queue.deposit(caller, body, recipients)?;
        Ok(())
    }

    fn queue_retrieve_with(
        &self,
        caller: UserId,
        buffer_capacity: usize,
        deliver: Deliver<'_>,
    ) -> MailboxResult<usize> {
        self.check_buffer(buffer_capacity)?;
        self.queue.retrieve_with(caller, |body| deliver(body))
    }

    fn max_message_len(&self) -> usize {
        self.config.max_message_len
    }

    fn list_users(&self) -> Vec<(UserId, Privileges)> {
        self.users
            .read()
            .iter()
            .map(|u| (u.id, u.privileges))
            .collect()
    }

    fn mailbox_summaries(&self) -> Vec<MailboxSummary> {
        self.directory.read().summaries()
    }
}
