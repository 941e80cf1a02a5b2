//! Adapters implementing the outbound ports in memory.

pub mod memory_transfer;
pub mod static_identity;

pub use memory_transfer::InMemoryTransfer;
pub use static_identity::StaticIdentityResolver;
