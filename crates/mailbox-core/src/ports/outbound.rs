//! Outbound (Driven) ports for the mailbox engine.
//!
//! The engine never touches caller memory or decides who a caller is;
//! both are supplied by the host through these traits.

use crate::domain::errors::MailboxResult;
use crate::domain::value_objects::UserId;
use std::sync::Arc;

/// Process endpoint a request arrived from.
pub type Endpoint = u32;

/// Opaque reference to a buffer in the caller's address space.
pub type BufferHandle = u64;

/// Cross-boundary byte copy.
pub trait PayloadTransfer: Send + Sync {
    /// Copies `len` bytes from the caller's buffer into server memory.
    fn copy_in(&self, endpoint: Endpoint, buffer: BufferHandle, len: usize) -> MailboxResult<Vec<u8>>;

    /// Copies `bytes` into the caller's buffer. Returns the bytes written.
    fn copy_out(&self, endpoint: Endpoint, buffer: BufferHandle, bytes: &[u8]) -> MailboxResult<usize>;
}

/// Resolves the identity of the process behind an endpoint.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, endpoint: Endpoint) -> MailboxResult<UserId>;
}

impl<T: PayloadTransfer + ?Sized> PayloadTransfer for Arc<T> {
    fn copy_in(&self, endpoint: Endpoint, buffer: BufferHandle, len: usize) -> MailboxResult<Vec<u8>> {
        (**self).copy_in(endpoint, buffer, len)
    }

    fn copy_out(&self, endpoint: Endpoint, buffer: BufferHandle, bytes: &[u8]) -> MailboxResult<usize> {
        (**self).copy_out(endpoint, buffer, bytes)
    }
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for Arc<R> {
    fn resolve(&self, endpoint: Endpoint) -> MailboxResult<UserId> {
        (**self).resolve(endpoint)
    }
}

/// Mock transfer that serves one fixed payload and records copies out.
#[cfg(test)]
pub struct MockTransfer {
    pub payload: Vec<u8>,
    pub copied_out: parking_lot::Mutex<Vec<Vec<u8>>>,
    pub fail: bool,
}

#[cfg(test)]
impl MockTransfer {
    pub fn new(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            copied_out: parking_lot::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            payload: Vec::new(),
            copied_out: parking_lot::Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[cfg(test)]
impl PayloadTransfer for MockTransfer {
    fn copy_in(&self, _endpoint: Endpoint, _buffer: BufferHandle, len: usize) -> MailboxResult<Vec<u8>> {
        if self.fail {
            return Err(crate::domain::MailboxError::Transfer {
                reason: "mock copy-in failure".into(),
            });
        }
        Ok(self.payload.iter().copied().take(len).collect())
    }

    fn copy_out(&self, _endpoint: Endpoint, _buffer: BufferHandle, bytes: &[u8]) -> MailboxResult<usize> {
        if self.fail {
            return Err(crate::domain::MailboxError::Transfer {
                reason: "mock copy-out failure".into(),
            });
        }
        self.copied_out.lock().push(bytes.to_vec());
        Ok(bytes.len())
    }
}

/// Mock resolver mapping every endpoint to its own number.
#[cfg(test)]
pub struct MockIdentity;

#[cfg(test)]
impl IdentityResolver for MockIdentity {
    fn resolve(&self, endpoint: Endpoint) -> MailboxResult<UserId> {
        Ok(UserId(endpoint))
    }
}
