//! Error types for the mailbox engine.
//!
//! Every failure is reported to the immediate caller; nothing is retried
//! internally and no error is fatal to the service.

use thiserror::Error;

/// Result code returned at the boundary on success.
pub const RESULT_OK: i32 = 0;

/// All errors that can occur in mailbox operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// Capability or ownership check failed.
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// User, mailbox, list entry or message is absent.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Name or identity collision.
    #[error("{what} already exists")]
    AlreadyExists { what: String },

    /// Access list eligibility failed.
    #[error("Forbidden: user {caller} may not {action} mailbox {mailbox}")]
    Forbidden {
        caller: u32,
        action: &'static str,
        mailbox: String,
    },

    /// Mailbox already holds the maximum number of messages.
    #[error("Mailbox {mailbox} is full ({capacity} messages)")]
    MailboxFull { mailbox: String, capacity: usize },

    /// Receive buffer cannot hold a maximum-size message.
    #[error("Buffer too small: {size} < {required}")]
    BufferTooSmall { size: usize, required: usize },

    /// No eligible, undelivered message for the caller.
    #[error("No message available for user {caller}")]
    NoMessage { caller: u32 },

    /// Body or subject exceeds its limit.
    #[error("Payload too large: {size} > {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Malformed request argument.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The payload transfer port failed.
    #[error("Transfer failed: {reason}")]
    Transfer { reason: String },
}

impl MailboxError {
    /// Stable result code for the operation boundary.
    pub fn code(&self) -> i32 {
        match self {
            MailboxError::Unauthorized { .. } => -1,
            MailboxError::NotFound { .. } => -2,
            MailboxError::AlreadyExists { .. } => -3,
            MailboxError::Forbidden { .. } => -4,
            MailboxError::MailboxFull { .. } => -5,
            MailboxError::BufferTooSmall { .. } => -6,
            MailboxError::NoMessage { .. } => -7,
            MailboxError::PayloadTooLarge { .. } => -8,
            MailboxError::InvalidArgument { .. } => -9,
            MailboxError::Transfer { .. } => -10,
        }
    }

    pub(crate) fn unauthorized(reason: impl Into<String>) -> Self {
        MailboxError::Unauthorized {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        MailboxError::NotFound { what: what.into() }
    }

    pub(crate) fn already_exists(what: impl Into<String>) -> Self {
        MailboxError::AlreadyExists { what: what.into() }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        MailboxError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Result type for mailbox operations.
pub type MailboxResult<T> = Result<T, MailboxError>;
