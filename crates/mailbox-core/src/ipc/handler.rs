//! IPC message handler for the mailbox engine.
//!
//! Resolves the caller from the request endpoint, moves payload bytes
//! through the transfer port and maps every outcome to a result code.

use crate::domain::directory::MailboxSpec;
use crate::domain::errors::{MailboxError, MailboxResult};
use crate::domain::value_objects::{Privileges, UserId};
use crate::ipc::payloads::{BufferRef, MailboxOperation, MailboxRequest, MailboxResponse};
use crate::ports::inbound::MailboxApi;
use crate::ports::outbound::{Endpoint, IdentityResolver, PayloadTransfer};
use tracing::{debug, warn};

/// IPC handler over a `MailboxApi` implementation.
pub struct MailboxHandler<A: MailboxApi, T: PayloadTransfer, R: IdentityResolver> {
    api: A,
    transfer: T,
    identity: R,
}

impl<A: MailboxApi, T: PayloadTransfer, R: IdentityResolver> MailboxHandler<A, T, R> {
    /// Creates a new handler.
    pub fn new(api: A, transfer: T, identity: R) -> Self {
        Self {
            api,
            transfer,
            identity,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn identity(&self) -> &R {
        &self.identity
    }

    /// Handles one request. Never fails; errors become result codes.
    pub fn handle(&self, request: MailboxRequest) -> MailboxResponse {
        let correlation_id = request.correlation_id;
        let operation = request.operation.name();

        match self.dispatch(request.endpoint, request.operation) {
            Ok(bytes_copied) => {
                debug!(%correlation_id, operation, bytes_copied, "Request completed");
                MailboxResponse::ok(correlation_id, bytes_copied)
            }
            Err(e) => {
                debug!(%correlation_id, operation, code = e.code(), error = %e, "Request failed");
                MailboxResponse::failed(correlation_id, &e)
            }
        }
    }

    fn dispatch(&self, endpoint: Endpoint, operation: MailboxOperation) -> MailboxResult<usize> {
        let caller = self.identity.resolve(endpoint).inspect_err(|e| {
            warn!(endpoint, error = %e, "Rejected request from unresolved endpoint")
        })?;

        match operation {
            MailboxOperation::AddUser { id, mask } => {
                self.api.add_user(caller, UserId(id), parse_mask(mask)?)?;
            }
            MailboxOperation::RemoveUser { id } => {
                self.api.remove_user(caller, UserId(id))?;
            }
            MailboxOperation::UpdatePrivileges { id, mask } => {
                self.api.update_privileges(caller, UserId(id), parse_mask(mask)?)?;
            }
            MailboxOperation::CreateMailbox {
                name,
                kind,
                send_list,
                receive_list,
                owner,
                delivery_model,
            } => {
                let spec = MailboxSpec {
                    name,
                    owner: owner.map(UserId),
                    kind,
                    send_list,
                    receive_list,
                    delivery_model,
                };
                self.api.create_mailbox(caller, spec)?;
            }
            MailboxOperation::RemoveMailbox { name } => {
                self.api.remove_mailbox(caller, &name)?;
            }
            MailboxOperation::DepositMessage {
                mailbox,
                body,
                subject,
                recipients,
            } => {
                let body = self.copy_in(endpoint, body)?;
                let recipients = recipients.map(|ids| ids.into_iter().map(UserId).collect());
                self.api
                    .deposit_message(caller, &mailbox, body, subject, recipients)?;
            }
            MailboxOperation::RetrieveMessage {
                scope,
                buffer,
                capacity,
            } => {
                // Consumed only once the copy-out lands
                let mut copy_out = |body: &[u8]| self.transfer.copy_out(endpoint, buffer, body);
                return self
                    .api
                    .retrieve_message_with(caller, scope, capacity, &mut copy_out);
            }
            MailboxOperation::DeleteMessage { mailbox, subject } => {
                self.api.delete_message(caller, &mailbox, &subject)?;
            }
            MailboxOperation::AddSender { mailbox, id } => {
                self.api.add_sender(caller, &mailbox, UserId(id))?;
            }
            MailboxOperation::RemoveSender { mailbox, id } => {
                self.api.remove_sender(caller, &mailbox, UserId(id))?;
            }
            MailboxOperation::AddReceiver { mailbox, id } => {
                self.api.add_receiver(caller, &mailbox, UserId(id))?;
            }
            MailboxOperation::RemoveReceiver { mailbox, id } => {
                self.api.remove_receiver(caller, &mailbox, UserId(id))?;
            }
            MailboxOperation::QueueDeposit { body, recipients } => {
                let body = self.copy_in(endpoint, body)?;
                self.api.queue_deposit(caller, body, &recipients)?;
            }
            MailboxOperation::QueueRetrieve { buffer, capacity } => {
                let mut copy_out = |body: &[u8]| self.transfer.copy_out(endpoint, buffer, body);
                return self.api.queue_retrieve_with(caller, capacity, &mut copy_out);
            }
        }

        Ok(0)
    }

    /// Copies a body in, rejecting oversized declarations before any copy.
    fn copy_in(&self, endpoint: Endpoint, body: BufferRef) -> MailboxResult<Vec<u8>> {
        let max = self.api.max_message_len();
        if body.len > max {
            warn!(endpoint, size = body.len, max, "Declared payload too large");
            return Err(MailboxError::PayloadTooLarge { size: body.len, max });
        }
        self.transfer.copy_in(endpoint, body.handle, body.len)
    }
}

fn parse_mask(mask: u8) -> MailboxResult<Privileges> {
    Privileges::from_bits(mask).ok_or_else(|| MailboxError::InvalidArgument {
        reason: format!("privilege mask {:#b} has bits above bit 3", mask),
    })
}
