//! # Mailbox Node
//!
//! Runtime wiring for the mailbox engine: configuration from the
//! environment, a single-consumer request loop, and a JSON-lines frontend.
//! The entry point is the `main.rs` binary.

pub mod config;
pub mod frontend;
pub mod server;

pub use config::{load_config, ConfigError, NodeConfig};
pub use frontend::{serve_lines, ClientFrame, ServerReply};
pub use server::{MailboxServer, ServerError, ServerHandle};
