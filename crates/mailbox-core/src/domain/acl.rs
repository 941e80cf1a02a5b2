//! Access control lists.
//!
//! An ordered list of identities, used as a mailbox's send list or receive
//! list. Whether membership grants or revokes access depends on the mailbox
//! kind and is decided by the permission evaluator, not here.

use super::user::UserRegistry;
use super::value_objects::{Privileges, UserId};
use tracing::warn;

/// One member of an access list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessListEntry {
    pub id: UserId,
    /// Privileges the identity held when it was inserted, if registered.
    pub privileges: Option<Privileges>,
}

/// Ordered list of identities. Duplicate suppression is the caller's job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessList {
    entries: Vec<AccessListEntry>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from whitespace-separated identities.
    ///
    /// Identities unknown to `users` and tokens that are not identities are
    /// skipped with a warning, so a mailbox can still be created when some
    /// listed collaborators do not exist.
    pub fn parse_from_list(text: &str, users: &UserRegistry) -> Self {
        let mut list = Self::new();

        for token in text.split_whitespace() {
            let id = match token.parse::<u32>() {
                Ok(raw) => UserId(raw),
                Err(_) => {
                    warn!(token, "Skipping malformed identity in access list");
                    continue;
                }
            };

            match users.lookup(id) {
                Ok(privileges) => list.add(id, Some(privileges)),
                Err(_) => warn!(user = %id, "No user found, skipping access list entry"),
            }
        }

        list
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Appends `id` at the tail.
    pub fn add(&mut self, id: UserId, privileges: Option<Privileges>) {
        self.entries.push(AccessListEntry { id, privileges });
    }

    /// Removes the first entry for `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: UserId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessListEntry> {
        self.entries.iter()
    }

    /// Member identities in list order.
    pub fn identities(&self) -> Vec<UserId> {
        self.entries.iter().map(|e| e.id).collect()
    }
}
