//! Caller side of the transport
//!
//! The bridge keeps a pending-request map `id → oneshot::Sender` and one
//! dispatcher task per link that routes each reply to its waiter. Replies
//! with an unknown id or an unexpected type are ignored.

use crate::error::{Error, Result};
use crate::transport::channel::{decode_incoming, ContextEndpoint, ContextSender};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use themeprobe_common::config::ProbeConfig;
use themeprobe_common::model::ProbeRunResult;
use themeprobe_common::protocol::{Envelope, MessageBody};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const READY: &str = "THEME_PROBE_READY";
const RESULT: &str = "THEME_PROBE_RESULT";

/// Opens a fresh rendering context when the current one is unreachable
#[async_trait]
pub trait ContextOpener: Send + Sync {
    async fn open(&self) -> Result<ContextEndpoint>;
}

struct Pending {
    expects: &'static str,
    reply: oneshot::Sender<Envelope>,
}

type PendingMap = Arc<Mutex<HashMap<String, Pending>>>;

/// One live connection: sender, pending map and its dispatcher
struct Link {
    sender: ContextSender,
    pending: PendingMap,
    dispatcher: JoinHandle<()>,
}

impl Link {
    fn spawn(endpoint: ContextEndpoint) -> Self {
        let (sender, incoming) = endpoint.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let dispatcher = tokio::spawn(dispatch(incoming, pending.clone()));
        Self {
            sender,
            pending,
            dispatcher,
        }
    }

    /// Post `envelope` and wait for the correlated reply of type `expects`
    async fn request(
        &self,
        envelope: Envelope,
        expects: &'static str,
        timeout: Duration,
        on_timeout: fn(Duration) -> Error,
    ) -> Result<Envelope> {
        let id = envelope.id.clone();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.lock_pending()?.insert(
            id.clone(),
            Pending {
                expects,
                reply: reply_tx,
            },
        );

        if let Err(e) = self.sender.post(&envelope) {
            self.forget(&id);
            return Err(e);
        }
        debug!(id = %id, "Sent {}", envelope.body.kind());

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(Error::ChannelClosed),
            Err(_) => {
                self.forget(&id);
                Err(on_timeout(timeout))
            }
        }
    }

    fn lock_pending(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Pending>>> {
        self.pending
            .lock()
            .map_err(|_| Error::Protocol("pending request map poisoned".to_string()))
    }

    fn forget(&self, id: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(id);
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Route incoming replies to their waiters until the peer goes away
async fn dispatch(mut incoming: mpsc::UnboundedReceiver<String>, pending: PendingMap) {
    while let Some(text) = incoming.recv().await {
        let Some(envelope) = decode_incoming(&text) else {
            continue;
        };

        let Ok(mut waiting) = pending.lock() else {
            break;
        };
        let matches = waiting
            .get(&envelope.id)
            .is_some_and(|p| p.expects == envelope.body.kind());
        if !matches {
            debug!(
                id = %envelope.id,
                "Ignoring uncorrelated {}",
                envelope.body.kind()
            );
            continue;
        }
        if let Some(waiter) = waiting.remove(&envelope.id) {
            // Waiter may have timed out in the meantime
            let _ = waiter.reply.send(envelope);
        }
    }

    // Dropping the senders wakes every waiter with ChannelClosed
    if let Ok(mut waiting) = pending.lock() {
        waiting.clear();
    }
    debug!("Bridge dispatcher stopped");
}

/// Controller-side handle to a remote probe listener
pub struct ProbeBridge {
    link: RwLock<Arc<Link>>,
    opener: Option<Arc<dyn ContextOpener>>,
    connect_timeout: Duration,
    run_timeout: Duration,
    remote_origin: RwLock<Option<String>>,
}

impl ProbeBridge {
    /// Must be called from within a Tokio runtime
    pub fn new(endpoint: ContextEndpoint, connect_timeout: Duration, run_timeout: Duration) -> Self {
        Self {
            link: RwLock::new(Arc::new(Link::spawn(endpoint))),
            opener: None,
            connect_timeout,
            run_timeout,
            remote_origin: RwLock::new(None),
        }
    }

    pub fn from_config(endpoint: ContextEndpoint, config: &ProbeConfig) -> Self {
        Self::new(
            endpoint,
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.run_timeout_ms),
        )
    }

    /// Fallback used when the handshake over the current link fails
    pub fn with_opener(mut self, opener: Arc<dyn ContextOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Origin declared by the listener in its last READY
    pub async fn remote_origin(&self) -> Option<String> {
        self.remote_origin.read().await.clone()
    }

    /// Handshake with the listener, opening a new context once if needed
    ///
    /// Returns the listener's declared origin.
    pub async fn connect(&self) -> Result<String> {
        match self.handshake().await {
            Ok(origin) => Ok(origin),
            Err(e @ (Error::ConnectTimeout(_) | Error::ChannelClosed)) => {
                let Some(opener) = &self.opener else {
                    return Err(e);
                };
                warn!("Remote context unreachable ({}), opening a new one", e);
                let endpoint = opener.open().await?;
                *self.link.write().await = Arc::new(Link::spawn(endpoint));
                self.handshake().await
            }
            Err(e) => Err(e),
        }
    }

    async fn handshake(&self) -> Result<String> {
        let link = self.link.read().await.clone();
        let reply = link
            .request(Envelope::ping(), READY, self.connect_timeout, Error::ConnectTimeout)
            .await?;

        match reply.body {
            MessageBody::Ready { origin } => {
                info!("Connected to probe listener at {}", origin);
                *self.remote_origin.write().await = Some(origin.clone());
                Ok(origin)
            }
            other => Err(Error::Protocol(format!("expected READY, got {}", other.kind()))),
        }
    }

    /// Run a full probe of `screen` remotely
    ///
    /// Connects first if no handshake has succeeded yet. A remote that stays
    /// silent yields [`Error::RunTimeout`]; a remote failure yields
    /// [`Error::Remote`]. Never resolves with a partial result.
    pub async fn run(&self, screen: &str) -> Result<ProbeRunResult> {
        if self.remote_origin.read().await.is_none() {
            self.connect().await?;
        }

        let link = self.link.read().await.clone();
        info!("Requesting probe run for '{}'", screen);
        let reply = link
            .request(Envelope::run(screen), RESULT, self.run_timeout, Error::RunTimeout)
            .await?;

        match reply.body {
            MessageBody::Result {
                error: Some(error), ..
            } => Err(Error::Remote(error)),
            MessageBody::Result {
                result: Some(result),
                summary,
                ..
            } => {
                if let Some(summary) = summary {
                    debug!("Remote run covered {} elements", summary.total_elements);
                }
                Ok(*result)
            }
            MessageBody::Result { .. } => Err(Error::Protocol(
                "RESULT carries neither result nor error".to_string(),
            )),
            other => Err(Error::Protocol(format!("expected RESULT, got {}", other.kind()))),
        }
    }
}
