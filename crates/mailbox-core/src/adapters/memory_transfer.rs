//! In-memory payload transfer.
//!
//! Stands in for the kernel copy primitive: each `(endpoint, handle)` pair
//! names a byte buffer the "caller" owns.

use crate::domain::errors::{MailboxError, MailboxResult};
use crate::ports::outbound::{BufferHandle, Endpoint, PayloadTransfer};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Buffer table keyed by endpoint and handle.
#[derive(Default)]
pub struct InMemoryTransfer {
    buffers: RwLock<HashMap<(Endpoint, BufferHandle), Vec<u8>>>,
}

impl InMemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `bytes` in a caller buffer, replacing what was there.
    pub fn write(&self, endpoint: Endpoint, buffer: BufferHandle, bytes: impl Into<Vec<u8>>) {
        self.buffers.write().insert((endpoint, buffer), bytes.into());
    }

    /// Reads a caller buffer.
    pub fn read(&self, endpoint: Endpoint, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.buffers.read().get(&(endpoint, buffer)).cloned()
    }

    /// Drops a caller buffer.
    pub fn release(&self, endpoint: Endpoint, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.buffers.write().remove(&(endpoint, buffer))
    }
}

impl PayloadTransfer for InMemoryTransfer {
    fn copy_in(&self, endpoint: Endpoint, buffer: BufferHandle, len: usize) -> MailboxResult<Vec<u8>> {
        let buffers = self.buffers.read();
        let source = buffers.get(&(endpoint, buffer)).ok_or_else(|| MailboxError::Transfer {
            reason: format!("endpoint {} has no buffer {}", endpoint, buffer),
        })?;

        if len > source.len() {
            return Err(MailboxError::Transfer {
                reason: format!(
                    "buffer {} of endpoint {} holds {} bytes, {} requested",
                    buffer,
                    endpoint,
                    source.len(),
                    len
                ),
            });
        }

        debug!(endpoint, buffer, len, "Copied in");
        Ok(source[..len].to_vec())
    }

    fn copy_out(&self, endpoint: Endpoint, buffer: BufferHandle, bytes: &[u8]) -> MailboxResult<usize> {
        self.buffers.write().insert((endpoint, buffer), bytes.to_vec());
        debug!(endpoint, buffer, len = bytes.len(), "Copied out");
        Ok(bytes.len())
    }
}
