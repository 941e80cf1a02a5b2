//! Mailbox directory: the set of live, uniquely named mailboxes.
//!
//! Each mailbox sits behind its own mutex so operations on different
//! mailboxes never contend; the directory itself is guarded by the owning
//! service. Lookups are linear, the directory holds tens of mailboxes at
//! most.

use super::acl::AccessList;
use super::errors::{MailboxError, MailboxResult};
use super::mailbox::{Mailbox, MailboxSummary};
use super::permission::CreatePolicy;
use super::store::MessageStore;
use super::user::UserRegistry;
use super::value_objects::{DeliveryModel, MailboxKind, UserId};
use crate::config::MailboxConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared handle to a live mailbox.
pub type SharedMailbox = Arc<Mutex<Mailbox>>;

/// Arguments of a create-mailbox operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxSpec {
    pub name: String,
    /// Owner of the new mailbox; `None` means the caller.
    pub owner: Option<UserId>,
    pub kind: MailboxKind,
    /// Whitespace-separated identities for the send list.
    pub send_list: String,
    /// Whitespace-separated identities for the receive list.
    pub receive_list: String,
    /// Delivery model; `None` means the configured default.
    pub delivery_model: Option<DeliveryModel>,
}

impl MailboxSpec {
    pub fn new(name: impl Into<String>, kind: MailboxKind) -> Self {
        Self {
            name: name.into(),
            owner: None,
            kind,
            send_list: String::new(),
            receive_list: String::new(),
            delivery_model: None,
        }
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_senders(mut self, list: impl Into<String>) -> Self {
        self.send_list = list.into();
        self
    }

    pub fn with_receivers(mut self, list: impl Into<String>) -> Self {
        self.receive_list = list.into();
        self
    }

    pub fn with_delivery_model(mut self, model: DeliveryModel) -> Self {
        self.delivery_model = Some(model);
        self
    }
}

struct DirectoryEntry {
    name: String,
    mailbox: SharedMailbox,
}

/// Directory of live mailboxes, in creation order.
pub struct MailboxDirectory {
    entries: Vec<DirectoryEntry>,
    max_message_count: usize,
    max_message_len: usize,
    max_name_len: usize,
    default_model: DeliveryModel,
    create_policy: CreatePolicy,
}

impl MailboxDirectory {
    pub fn new(config: &MailboxConfig) -> Self {
        Self {
            entries: Vec::new(),
            max_message_count: config.max_message_count,
            max_message_len: config.max_message_len,
            max_name_len: config.max_name_len,
            default_model: config.default_delivery_model,
            create_policy: config.create_policy,
        }
    }

    /// Creates a mailbox.
    ///
    /// 1. Authorize the caller against the create policy
    /// 2. Validate the name and reject collisions
    /// 3. Build both access lists (unknown identities are skipped)
    /// 4. Insert
    pub fn create(
        &mut self,
        spec: MailboxSpec,
        caller: UserId,
        users: &UserRegistry,
    ) -> MailboxResult<SharedMailbox> {
        // 1. Authorize
        let privileges = users.lookup(caller).map_err(|_| {
            MailboxError::unauthorized(format!("unknown user {} may not create a mailbox", caller))
        })?;
        if !caller.is_superuser() && !self.create_policy.allows(privileges) {
            warn!(caller = %caller, privileges = %privileges, "Create mailbox denied");
            return Err(MailboxError::unauthorized(format!(
                "user {} with privileges {} may not create a mailbox",
                caller, privileges
            )));
        }

        let owner = spec.owner.unwrap_or(caller);
        if owner != caller && !caller.is_superuser() {
            return Err(MailboxError::unauthorized(format!(
                "user {} may not create a mailbox owned by {}",
                caller, owner
            )));
        }

        // 2. Name
        self.validate_name(&spec.name)?;
        if self.position(&spec.name).is_some() {
            warn!(mailbox = %spec.name, "Mailbox already exists");
            return Err(MailboxError::already_exists(format!("Mailbox {}", spec.name)));
        }

        // 3. Access lists and store
        let send_acl = AccessList::parse_from_list(&spec.send_list, users);
        let receive_acl = AccessList::parse_from_list(&spec.receive_list, users);
        let model = spec.delivery_model.unwrap_or(self.default_model);
        let store = MessageStore::new(model, self.max_message_count, self.max_message_len);

        // 4. Insert
        let mailbox = Arc::new(Mutex::new(Mailbox::new(
            spec.name.clone(),
            owner,
            spec.kind,
            send_acl,
            receive_acl,
            store,
        )));
        self.entries.push(DirectoryEntry {
            name: spec.name.clone(),
            mailbox: Arc::clone(&mailbox),
        });

        info!(
            mailbox = %spec.name,
            owner = %owner,
            kind = %spec.kind,
            model = %model,
            "Mailbox created"
        );
        Ok(mailbox)
    }

    /// Removes a mailbox and everything it owns. Owner or superuser only.
    pub fn remove(&mut self, name: &str, caller: UserId) -> MailboxResult<()> {
        let index = self
            .position(name)
            .ok_or_else(|| MailboxError::not_found(format!("Mailbox {}", name)))?;

        let may_remove = self.entries[index].mailbox.lock().may_remove(caller);
        if !may_remove {
            warn!(mailbox = name, caller = %caller, "Caller is not the mailbox owner");
            return Err(MailboxError::unauthorized(format!(
                "user {} is not the owner of mailbox {}",
                caller, name
            )));
        }

        self.entries.remove(index);
        info!(mailbox = name, "Mailbox removed");
        Ok(())
    }

    pub fn find(&self, name: &str) -> MailboxResult<SharedMailbox> {
        self.position(name)
            .map(|index| Arc::clone(&self.entries[index].mailbox))
            .ok_or_else(|| MailboxError::not_found(format!("Mailbox {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live mailboxes in directory order.
    pub fn mailboxes(&self) -> impl Iterator<Item = &SharedMailbox> {
        self.entries.iter().map(|e| &e.mailbox)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<MailboxSummary> {
        self.entries.iter().map(|e| e.mailbox.lock().summary()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    fn validate_name(&self, name: &str) -> MailboxResult<()> {
        if name.is_empty() {
            return Err(MailboxError::invalid("mailbox name is empty"));
        }
        if name.len() > self.max_name_len {
            return Err(MailboxError::invalid(format!(
                "mailbox name longer than {} bytes",
                self.max_name_len
            )));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(MailboxError::invalid("mailbox name contains whitespace"));
        }
        Ok(())
    }
}
