//! # IPC Message Payloads
//!
//! Request/response types for the mailbox operation boundary.

use crate::domain::errors::{MailboxError, RESULT_OK};
use crate::domain::value_objects::{DeliveryModel, MailboxKind, RetrieveScope};
use crate::ports::outbound::{BufferHandle, Endpoint};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A region of the caller's memory holding `len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferRef {
    pub handle: BufferHandle,
    pub len: usize,
}

/// The operation a request asks for, with its fixed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailboxOperation {
    AddUser {
        id: u32,
        mask: u8,
    },
    RemoveUser {
        id: u32,
    },
    UpdatePrivileges {
        id: u32,
        mask: u8,
    },
    CreateMailbox {
        name: String,
        kind: MailboxKind,
        send_list: String,
        receive_list: String,
        /// Owner other than the caller; superuser only.
        owner: Option<u32>,
        delivery_model: Option<DeliveryModel>,
    },
    RemoveMailbox {
        name: String,
    },
    DepositMessage {
        mailbox: String,
        body: BufferRef,
        subject: Option<String>,
        /// Required by target-list mailboxes, ignored otherwise.
        recipients: Option<Vec<u32>>,
    },
    RetrieveMessage {
        scope: RetrieveScope,
        buffer: BufferHandle,
        capacity: usize,
    },
    DeleteMessage {
        mailbox: String,
        /// Empty matches a message deposited without a subject.
        subject: String,
    },
    AddSender {
        mailbox: String,
        id: u32,
    },
    RemoveSender {
        mailbox: String,
        id: u32,
    },
    AddReceiver {
        mailbox: String,
        id: u32,
    },
    RemoveReceiver {
        mailbox: String,
        id: u32,
    },
    /// Deposit into the unrestricted queue.
    QueueDeposit {
        body: BufferRef,
        /// Whitespace-separated identities.
        recipients: String,
    },
    /// Retrieve from the unrestricted queue.
    QueueRetrieve {
        buffer: BufferHandle,
        capacity: usize,
    },
}

impl MailboxOperation {
    /// Short operation name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            MailboxOperation::AddUser { .. } => "add_user",
            MailboxOperation::RemoveUser { .. } => "remove_user",
            MailboxOperation::UpdatePrivileges { .. } => "update_privileges",
            MailboxOperation::CreateMailbox { .. } => "create_mailbox",
            MailboxOperation::RemoveMailbox { .. } => "remove_mailbox",
            MailboxOperation::DepositMessage { .. } => "deposit_message",
            MailboxOperation::RetrieveMessage { .. } => "retrieve_message",
            MailboxOperation::DeleteMessage { .. } => "delete_message",
            MailboxOperation::AddSender { .. } => "add_sender",
            MailboxOperation::RemoveSender { .. } => "remove_sender",
            MailboxOperation::AddReceiver { .. } => "add_receiver",
            MailboxOperation::RemoveReceiver { .. } => "remove_receiver",
            MailboxOperation::QueueDeposit { .. } => "queue_deposit",
            MailboxOperation::QueueRetrieve { .. } => "queue_retrieve",
        }
    }
}

/// A request as it arrives at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxRequest {
    /// Correlation ID for request tracking.
    pub correlation_id: Uuid,
    /// Endpoint the request came from.
    pub endpoint: Endpoint,
    pub operation: MailboxOperation,
}

impl MailboxRequest {
    pub fn new(endpoint: Endpoint, operation: MailboxOperation) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            endpoint,
            operation,
        }
    }
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxResponse {
    /// Correlation ID matching the request.
    pub correlation_id: Uuid,
    /// `RESULT_OK` or the error's result code.
    pub code: i32,
    /// Bytes copied into the caller's buffer (retrievals only).
    pub bytes_copied: usize,
    /// Error message if the operation failed.
    pub error: Option<String>,
}

impl MailboxResponse {
    pub fn ok(correlation_id: Uuid, bytes_copied: usize) -> Self {
        Self {
            correlation_id,
            code: RESULT_OK,
            bytes_copied,
            error: None,
        }
    }

    pub fn failed(correlation_id: Uuid, error: &MailboxError) -> Self {
        Self {
            correlation_id,
            code: error.code(),
            bytes_copied: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == RESULT_OK
    }
}
