//! Domain module for the mailbox engine
//!
//! Contains the user registry, access lists, the permission evaluator,
//! messages, stores, mailboxes and the directory.

pub mod acl;
pub mod directory;
pub mod errors;
pub mod invariants;
pub mod mailbox;
pub mod message;
pub mod permission;
pub mod store;
pub mod user;
pub mod value_objects;

pub use acl::{AccessList, AccessListEntry};
pub use directory::{MailboxDirectory, MailboxSpec, SharedMailbox};
pub use errors::*;
pub use mailbox::{Mailbox, MailboxSummary};
pub use message::{Delivery, Message, MessageId, MessageState};
pub use permission::{can_create, eligible, CreatePolicy};
pub use store::{MessageStore, Retrieved};
pub use user::{User, UserRegistry};
pub use value_objects::*;
