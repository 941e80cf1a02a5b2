//! # IPC Layer
//!
//! Fixed-field request and response records, and the handler that turns
//! them into `MailboxApi` calls.
//!
//! Every request carries the endpoint it arrived from; the caller
//! identity is resolved from that endpoint, never taken from the request
//! body. Message bodies travel as buffer references and are moved through
//! the `PayloadTransfer` port.

pub mod handler;
pub mod payloads;

pub use handler::MailboxHandler;
pub use payloads::*;
