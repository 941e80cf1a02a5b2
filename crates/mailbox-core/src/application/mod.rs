//! Application layer: the service context and the basic queue.

pub mod queue;
pub mod service;

pub use queue::{parse_recipients, MessageQueue};
pub use service::MailboxService;
