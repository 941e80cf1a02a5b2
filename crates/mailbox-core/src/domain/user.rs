//! User registry: identity → capability mask.
//!
//! The registry is the root of every authorization decision. It starts with
//! exactly the superuser and is only mutated by the superuser.

use super::errors::{MailboxError, MailboxResult};
use super::value_objects::{Privileges, UserId};
use tracing::{info, warn};

/// A registered user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub privileges: Privileges,
}

/// Ordered set of registered users. Identities are unique.
#[derive(Clone, Debug)]
pub struct UserRegistry {
    users: Vec<User>,
}

impl UserRegistry {
    /// Creates a registry holding only the superuser with mask `1111`.
    pub fn new() -> Self {
        Self {
            users: vec![User {
                id: UserId::SUPERUSER,
                privileges: Privileges::ALL,
            }],
        }
    }

    /// Registers `id` with `privileges`. Superuser only.
    pub fn add_user(
        &mut self,
        id: UserId,
        privileges: Privileges,
        caller: UserId,
    ) -> MailboxResult<()> {
        require_superuser(caller, "add a user")?;

        if self.contains(id) {
            warn!(user = %id, "User already exists");
            return Err(MailboxError::already_exists(format!("User {}", id)));
        }

        self.users.push(User { id, privileges });
        info!(user = %id, privileges = %privileges, "Added user");
        Ok(())
    }

    /// Removes `id` from the registry. Superuser only.
    pub fn remove_user(&mut self, id: UserId, caller: UserId) -> MailboxResult<()> {
        require_superuser(caller, "remove a user")?;
        reject_superuser_target(id)?;

        let index = self
            .position(id)
            .ok_or_else(|| MailboxError::not_found(format!("User {}", id)))?;
        self.users.remove(index);

        info!(user = %id, "Removed user");
        Ok(())
    }

    /// Overwrites the mask of `id`. Superuser only.
    pub fn update_privileges(
        &mut self,
        id: UserId,
        privileges: Privileges,
        caller: UserId,
    ) -> MailboxResult<()> {
        require_superuser(caller, "update privileges")?;
        reject_superuser_target(id)?;

        let index = self
            .position(id)
            .ok_or_else(|| MailboxError::not_found(format!("User {}", id)))?;
        self.users[index].privileges = privileges;

        info!(user = %id, privileges = %privileges, "Updated user privileges");
        Ok(())
    }

    /// Returns the mask of `id`.
    pub fn lookup(&self, id: UserId) -> MailboxResult<Privileges> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.privileges)
            .ok_or_else(|| MailboxError::not_found(format!("User {}", id)))
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    fn position(&self, id: UserId) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn require_superuser(caller: UserId, action: &str) -> MailboxResult<()> {
    if caller.is_superuser() {
        return Ok(());
    }
    warn!(caller = %caller, action, "Superuser required");
    Err(MailboxError::unauthorized(format!(
        "user {} is not superuser and may not {}",
        caller, action
    )))
}

// Identity 0 stays registered at `1111` for the registry's lifetime: remove
// and update refuse it with `InvalidArgument`, whoever the caller is.
fn reject_superuser_target(id: UserId) -> MailboxResult<()> {
    if id.is_superuser() {
        return Err(MailboxError::invalid("the superuser entry cannot be modified"));
    }
    Ok(())
}
