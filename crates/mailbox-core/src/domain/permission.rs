//! Permission evaluator.
//!
//! Pure functions shared by the send path, the receive path and the list
//! editing operations.
//!
//! ## Public / Secure inversion
//!
//! | Kind | Caller in list | Caller not in list |
//! |------|----------------|--------------------|
//! | `Secure` | eligible | ineligible |
//! | `Public` | ineligible | eligible |
//!
//! The superuser is eligible everywhere.

use super::acl::AccessList;
use super::errors::{MailboxError, MailboxResult};
use super::value_objects::{MailboxKind, Privileges, UserId};
use serde::{Deserialize, Serialize};

/// Masks accepted by the exact-match create policy.
pub const CREATE_MASKS: [u8; 2] = [0b1111, 0b1011];

/// How the create-mailbox capability is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatePolicy {
    /// Mask must equal `1111` or `1011` exactly.
    #[default]
    ExactMask,
    /// Mask must have the create bit set.
    CapabilityBit,
}

impl CreatePolicy {
    pub fn allows(self, privileges: Privileges) -> bool {
        match self {
            CreatePolicy::ExactMask => can_create(privileges),
            CreatePolicy::CapabilityBit => privileges.contains(Privileges::CREATE_MAILBOX),
        }
    }
}

/// Exact-match create policy: only `1111` and `1011` may create mailboxes.
///
/// Not a subset test: `1001` and `1110` are refused even though they carry
/// the create bit.
pub fn can_create(privileges: Privileges) -> bool {
    CREATE_MASKS.contains(&privileges.bits())
}

/// Whether `caller` may use the direction governed by `acl`.
pub fn eligible(caller: UserId, kind: MailboxKind, acl: &AccessList) -> bool {
    if caller.is_superuser() {
        return true;
    }

    let listed = acl.contains(caller);
    match kind {
        MailboxKind::Secure => listed,
        MailboxKind::Public => !listed,
    }
}

/// Checks that `caller` holds `capability`.
///
/// `privileges` is the caller's registry entry; `None` means the caller is
/// not registered and holds nothing. The superuser always passes.
pub fn require_capability(
    caller: UserId,
    privileges: Option<Privileges>,
    capability: Privileges,
    action: &str,
) -> MailboxResult<()> {
    if caller.is_superuser() {
        return Ok(());
    }

    match privileges {
        Some(held) if held.contains(capability) => Ok(()),
        Some(held) => Err(MailboxError::unauthorized(format!(
            "user {} with privileges {} may not {}",
            caller, held, action
        ))),
        None => Err(MailboxError::unauthorized(format!(
            "unknown user {} may not {}",
            caller, action
        ))),
    }
}
