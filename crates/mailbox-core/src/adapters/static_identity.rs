//! Static endpoint-to-identity table.

use crate::domain::errors::{MailboxError, MailboxResult};
use crate::domain::value_objects::UserId;
use crate::ports::outbound::{Endpoint, IdentityResolver};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Identity resolver backed by an explicit binding table.
#[derive(Default)]
pub struct StaticIdentityResolver {
    bindings: RwLock<HashMap<Endpoint, UserId>>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver from `(endpoint, identity)` pairs.
    pub fn with_bindings(bindings: impl IntoIterator<Item = (Endpoint, UserId)>) -> Self {
        Self {
            bindings: RwLock::new(bindings.into_iter().collect()),
        }
    }

    pub fn bind(&self, endpoint: Endpoint, id: UserId) {
        self.bindings.write().insert(endpoint, id);
    }

    pub fn unbind(&self, endpoint: Endpoint) -> Option<UserId> {
        self.bindings.write().remove(&endpoint)
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self, endpoint: Endpoint) -> MailboxResult<UserId> {
        self.bindings
            .read()
            .get(&endpoint)
            .copied()
            .ok_or_else(|| MailboxError::Unauthorized {
                reason: format!("endpoint {} has no identity", endpoint),
            })
    }
}
