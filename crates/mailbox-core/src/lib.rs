//! # Mailbox IPC Engine
//!
//! Named-mailbox message passing between processes, with per-user
//! privileges and per-mailbox send/receive access lists.
//!
//! ## Architecture
//!
//! - **Domain**: users, access lists, the permission evaluator, messages,
//!   stores, mailboxes and the directory
//! - **Ports**: Inbound (`MailboxApi`) and Outbound (`PayloadTransfer`,
//!   `IdentityResolver`)
//! - **Adapters**: in-memory transfer and a static identity table
//! - **Application**: `MailboxService` and the unrestricted `MessageQueue`
//! - **IPC**: request/response records and their handler
//!
//! ## Delivery models
//!
//! | Model | Recipients | Message removed |
//! |-------|-----------|-----------------|
//! | Target list | named at deposit | once every recipient retrieved it |
//! | Permission | anyone eligible on the receive list | only by delete-by-subject |

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;

pub use adapters::{InMemoryTransfer, StaticIdentityResolver};
pub use application::{parse_recipients, MailboxService, MessageQueue};
pub use config::{MailboxConfig, MAX_MESSAGE_COUNT, MAX_MESSAGE_LEN};
pub use domain::errors::{MailboxError, MailboxResult, RESULT_OK};
pub use domain::{
    CreatePolicy, DeliveryModel, Direction, MailboxKind, MailboxSpec, MailboxSummary, Privileges,
    RetrieveScope, UserId,
};
pub use ipc::{BufferRef, MailboxHandler, MailboxOperation, MailboxRequest, MailboxResponse};
pub use ports::inbound::{Deliver, MailboxApi};
pub use ports::outbound::{BufferHandle, Endpoint, IdentityResolver, PayloadTransfer};
