//! # Request Loop
//!
//! A single consumer drains a bounded channel and runs each request to
//! completion before taking the next, so the engine sees one request at a
//! time no matter how many clients hold a `ServerHandle`.
//!
//! ```text
//! ServerHandle ──┐
//! ServerHandle ──┼──mpsc──→ MailboxServer::run ──→ MailboxHandler ──→ MailboxService
//! ServerHandle ──┘    ←──oneshot── MailboxResponse
//! ```

use crate::config::NodeConfig;
use mailbox_core::{
    Endpoint, InMemoryTransfer, MailboxHandler, MailboxRequest, MailboxResponse, MailboxService,
    StaticIdentityResolver, UserId,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Handler type served by the node.
pub type NodeHandler =
    MailboxHandler<MailboxService, Arc<InMemoryTransfer>, Arc<StaticIdentityResolver>>;

/// Errors seen by clients of the request loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("request loop has stopped")]
    Stopped,

    #[error("request {0} was dropped without a response")]
    NoResponse(uuid::Uuid),
}

struct Envelope {
    request: MailboxRequest,
    reply: oneshot::Sender<MailboxResponse>,
}

/// The single consumer.
pub struct MailboxServer {
    handler: NodeHandler,
    requests: mpsc::Receiver<Envelope>,
    shutdown: watch::Receiver<bool>,
}

/// Cloneable client side of the request loop.
#[derive(Clone)]
pub struct ServerHandle {
    requests: mpsc::Sender<Envelope>,
    shutdown: Arc<watch::Sender<bool>>,
    transfer: Arc<InMemoryTransfer>,
    identity: Arc<StaticIdentityResolver>,
}

impl MailboxServer {
    /// Builds the engine and its adapters from `config`.
    pub fn new(config: &NodeConfig) -> (Self, ServerHandle) {
        let transfer = Arc::new(InMemoryTransfer::new());
        let identity = Arc::new(StaticIdentityResolver::with_bindings(
            config
                .server
                .identities
                .iter()
                .map(|(endpoint, uid)| (*endpoint, UserId(*uid))),
        ));
        let service = MailboxService::with_config(config.mailbox.clone());
        let handler = MailboxHandler::new(service, Arc::clone(&transfer), Arc::clone(&identity));

        let (request_tx, request_rx) = mpsc::channel(config.server.request_queue_depth);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let server = Self {
            handler,
            requests: request_rx,
            shutdown: shutdown_rx,
        };
        let handle = ServerHandle {
            requests: request_tx,
            shutdown: Arc::new(shutdown_tx),
            transfer,
            identity,
        };
        (server, handle)
    }

    /// Serves requests until shutdown is signalled or every handle is
    /// dropped. Returns the number of requests served.
    pub async fn run(mut self) -> u64 {
        info!("Mailbox request loop started");
        let mut served = 0u64;

        loop {
            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Shutdown signal received");
                        break;
                    }
                }
                envelope = self.requests.recv() => {
                    let Some(Envelope { request, reply }) = envelope else {
                        info!("All handles dropped");
                        break;
                    };
                    let correlation_id = request.correlation_id;
                    let response = self.handler.handle(request);
                    served += 1;
                    if reply.send(response).is_err() {
                        debug!(%correlation_id, "Client went away before the response");
                    }
                }
            }
        }

        info!(served, "Mailbox request loop stopped");
        served
    }
}

impl ServerHandle {
    /// Submits a request and waits for its response.
    pub async fn call(&self, request: MailboxRequest) -> Result<MailboxResponse, ServerError> {
        let correlation_id = request.correlation_id;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.requests
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ServerError::Stopped)?;

        reply_rx
            .await
            .map_err(|_| ServerError::NoResponse(correlation_id))
    }

    /// Caller buffers shared with the engine.
    pub fn transfer(&self) -> &InMemoryTransfer {
        &self.transfer
    }

    /// Binds `endpoint` to identity `uid`.
    pub fn bind(&self, endpoint: Endpoint, uid: u32) {
        self.identity.bind(endpoint, UserId(uid));
    }

    /// Asks the request loop to stop.
    pub fn shutdown(&self) {
        if self.shutdown.send(true).is_err() {
            warn!("Request loop already stopped");
        }
    }
}
