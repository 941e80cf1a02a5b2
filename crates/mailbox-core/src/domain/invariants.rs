//! Structural invariants of the mailbox engine.
//!
//! These never fail on a correct build; they exist so tests (and the
//! service's `check_invariants`) can assert them after arbitrary operation
//! sequences.

use super::mailbox::Mailbox;
use super::store::MessageStore;
use std::collections::HashSet;

/// The message count equals the length of the sequence.
pub fn invariant_count_matches(store: &MessageStore) -> bool {
    store.count() == store.iter().count()
}

/// The message count never exceeds the store capacity.
pub fn invariant_within_capacity(store: &MessageStore) -> bool {
    store.count() <= store.capacity()
}

/// Collectable messages never linger after a retrieval.
pub fn invariant_no_collectable_messages(store: &MessageStore) -> bool {
    store.iter().all(|m| !m.is_collectable())
}

/// Mailbox names are unique across the directory.
pub fn invariant_unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    let mut seen = HashSet::new();
    names.into_iter().all(|name| seen.insert(name))
}

/// Checks every per-mailbox invariant, returning the first violation.
pub fn check_mailbox(mailbox: &Mailbox) -> Result<(), String> {
    let store = mailbox.store();
    if !invariant_count_matches(store) {
        return Err(format!("mailbox {}: count does not match messages", mailbox.name()));
    }
    if !invariant_within_capacity(store) {
        return Err(format!(
            "mailbox {}: {} messages exceed capacity {}",
            mailbox.name(),
            store.count(),
            store.capacity()
        ));
    }
    if !invariant_no_collectable_messages(store) {
        return Err(format!("mailbox {}: consumed message not collected", mailbox.name()));
    }
    Ok(())
}
