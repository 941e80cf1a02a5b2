//! Value objects for the mailbox engine.
//!
//! Identities, capability masks and the small enums that select mailbox
//! behaviour. All of them are `Copy` or cheap to clone.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a user as supplied by the trusted boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl UserId {
    /// The reserved superuser. Always fully privileged and exempt from every
    /// permission check.
    pub const SUPERUSER: UserId = UserId(0);

    /// Returns true for the superuser identity.
    pub fn is_superuser(self) -> bool {
        self == Self::SUPERUSER
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(raw: u32) -> Self {
        UserId(raw)
    }
}

bitflags! {
    /// 4-bit capability mask held by every registered user.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Privileges: u8 {
        /// May add or remove identities on a receive list.
        const MODIFY_RECEIVERS = 0b0001;
        /// May add or remove identities on a send list.
        const MODIFY_SENDERS   = 0b0010;
        /// May delete messages by subject.
        const DELETE_MESSAGE   = 0b0100;
        /// Conceptual create-mailbox bit. Creation itself is decided by
        /// `permission::can_create`, which does not test this bit alone.
        const CREATE_MAILBOX   = 0b1000;

        /// Every capability; the superuser's mask.
        const ALL = Self::MODIFY_RECEIVERS.bits()
            | Self::MODIFY_SENDERS.bits()
            | Self::DELETE_MESSAGE.bits()
            | Self::CREATE_MAILBOX.bits();
    }
}

impl Privileges {
    /// Builds a mask from a raw value, dropping anything above bit 3.
    pub fn from_mask(mask: u8) -> Self {
        Self::from_bits_truncate(mask)
    }
}

impl fmt::Display for Privileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.bits())
    }
}

/// Whether a mailbox's access lists allow or deny.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MailboxKind {
    /// Lists are deny-lists: membership revokes access.
    Public,
    /// Lists are allow-lists: membership grants access.
    Secure,
}

impl fmt::Display for MailboxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailboxKind::Public => write!(f, "public"),
            MailboxKind::Secure => write!(f, "secure"),
        }
    }
}

/// Message lifecycle policy of a message store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryModel {
    /// Recipients fixed at deposit; the message is collected once every
    /// recipient has retrieved it.
    TargetList,
    /// Eligibility recomputed from the mailbox lists on every retrieval;
    /// messages persist until deleted by subject.
    Permission,
}

impl fmt::Display for DeliveryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryModel::TargetList => write!(f, "target-list"),
            DeliveryModel::Permission => write!(f, "permission"),
        }
    }
}

/// Direction of access a list governs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Receive,
}

/// Where a retrieval looks for messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrieveScope {
    /// Every mailbox, in directory order.
    Any,
    /// A single named mailbox.
    Named(String),
}
