//! Configuration for the mailbox engine

use crate::domain::errors::{MailboxError, MailboxResult};
use crate::domain::permission::CreatePolicy;
use crate::domain::value_objects::DeliveryModel;
use serde::{Deserialize, Serialize};

/// Largest message body, in bytes.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Messages a single mailbox may hold.
pub const MAX_MESSAGE_COUNT: usize = 16;

/// Mailbox engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Largest accepted message body; also the minimum receive buffer
    pub max_message_len: usize,
    /// Messages a mailbox holds before deposits fail `MailboxFull`
    pub max_message_count: usize,
    /// Longest accepted subject, in bytes
    pub max_subject_len: usize,
    /// Longest accepted mailbox name, in bytes
    pub max_name_len: usize,
    /// Delivery model of mailboxes created without an explicit one
    pub default_delivery_model: DeliveryModel,
    /// How the create-mailbox capability is decided
    pub create_policy: CreatePolicy,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_message_len: MAX_MESSAGE_LEN,
            max_message_count: MAX_MESSAGE_COUNT,
            max_subject_len: 64,
            max_name_len: 64,
            default_delivery_model: DeliveryModel::Permission,
            create_policy: CreatePolicy::ExactMask,
        }
    }
}

impl MailboxConfig {
    /// Rejects limits that would make every operation fail.
    pub fn validate(&self) -> MailboxResult<()> {
        let limits = [
            ("max_message_len", self.max_message_len),
            ("max_message_count", self.max_message_count),
            ("max_subject_len", self.max_subject_len),
            ("max_name_len", self.max_name_len),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(MailboxError::InvalidArgument {
                    reason: format!("{} must be greater than zero", field),
                });
            }
        }
        Ok(())
    }
}
