//! JSON-lines client frontend.
//!
//! Each input line is a [`ClientFrame`]; each output line is a
//! [`ServerReply`]. Message bodies travel inline as text: the frontend
//! stages them in the caller's buffer before submitting and reads
//! retrieved bodies back out afterwards.

use crate::server::ServerHandle;
use anyhow::{Context, Result};
use mailbox_core::{BufferHandle, Endpoint, MailboxOperation, MailboxRequest, MailboxResponse};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// One client request line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub endpoint: Endpoint,
    pub operation: MailboxOperation,
    /// Body for deposit operations; sets the declared length.
    #[serde(default)]
    pub payload: Option<String>,
}

/// One reply line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<MailboxResponse>,
    /// Retrieved body, for successful retrievals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Frame-level failure (malformed line, stopped loop).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serves frames from `reader` until EOF. Returns the frames handled.
pub async fn serve_lines<R, W>(handle: &ServerHandle, reader: R, mut writer: W) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0u64;

    while let Some(line) = lines.next_line().await.context("Failed to read request line")? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<ClientFrame>(&line) {
            Ok(frame) => submit(handle, frame).await,
            Err(e) => {
                warn!(error = %e, "Malformed request line");
                ServerReply {
                    error: Some(format!("malformed request: {}", e)),
                    ..Default::default()
                }
            }
        };

        let mut encoded = serde_json::to_string(&reply).context("Failed to encode reply")?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write reply")?;
        writer.flush().await.context("Failed to flush reply")?;
        handled += 1;
    }

    debug!(handled, "Input closed");
    Ok(handled)
}

async fn submit(handle: &ServerHandle, frame: ClientFrame) -> ServerReply {
    let ClientFrame {
        endpoint,
        mut operation,
        payload,
    } = frame;

    let staged = payload
        .and_then(|text| stage_payload(handle, endpoint, &mut operation, text.into_bytes()));
    let output = output_buffer(&operation);

    let result = handle.call(MailboxRequest::new(endpoint, operation)).await;
    if let Some(buffer) = staged {
        handle.transfer().release(endpoint, buffer);
    }

    match result {
        Ok(response) => {
            let payload = match output {
                Some(buffer) if response.is_ok() => handle
                    .transfer()
                    .release(endpoint, buffer)
                    .map(|bytes| {
                        let end = response.bytes_copied.min(bytes.len());
                        String::from_utf8_lossy(&bytes[..end]).into_owned()
                    }),
                _ => None,
            };
            ServerReply {
                response: Some(response),
                payload,
                error: None,
            }
        }
        Err(e) => ServerReply {
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

/// Writes `bytes` into the caller buffer named by a deposit operation and
/// returns that buffer. The caller releases it once the request completes.
fn stage_payload(
    handle: &ServerHandle,
    endpoint: Endpoint,
    operation: &mut MailboxOperation,
    bytes: Vec<u8>,
) -> Option<BufferHandle> {
    let body = match operation {
        MailboxOperation::DepositMessage { body, .. } | MailboxOperation::QueueDeposit { body, .. } => body,
        _ => return None,
    };
    body.len = bytes.len();
    handle.transfer().write(endpoint, body.handle, bytes);
    Some(body.handle)
}

fn output_buffer(operation: &MailboxOperation) -> Option<BufferHandle> {
    match operation {
        MailboxOperation::RetrieveMessage { buffer, .. } | MailboxOperation::QueueRetrieve { buffer, .. } => {
            Some(*buffer)
        }
        _ => None,
    }
}
