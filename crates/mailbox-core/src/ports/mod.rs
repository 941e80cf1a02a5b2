//! Ports: the driving API and the driven collaborators.

pub mod inbound;
pub mod outbound;

pub use inbound::MailboxApi;
pub use outbound::{BufferHandle, Endpoint, IdentityResolver, PayloadTransfer};
