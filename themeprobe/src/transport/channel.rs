//! In-process message channel between two contexts
//!
//! Messages travel as serialized JSON text, the same way they would cross a
//! window or process boundary.

use crate::error::{Error, Result};
use themeprobe_common::protocol::Envelope;
use tokio::sync::mpsc;
use tracing::debug;

/// One end of a bidirectional context link
#[derive(Debug)]
pub struct ContextEndpoint {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<String>,
}

/// Two connected endpoints: what one posts, the other receives
pub fn context_pair() -> (ContextEndpoint, ContextEndpoint) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    (
        ContextEndpoint {
            outgoing: a_tx,
            incoming: b_rx,
        },
        ContextEndpoint {
            outgoing: b_tx,
            incoming: a_rx,
        },
    )
}

impl ContextEndpoint {
    pub fn sender(&self) -> ContextSender {
        ContextSender {
            tx: self.outgoing.clone(),
        }
    }

    pub fn split(self) -> (ContextSender, mpsc::UnboundedReceiver<String>) {
        (ContextSender { tx: self.outgoing }, self.incoming)
    }

    /// Next raw message, `None` once the peer is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.incoming.recv().await
    }
}

/// Cloneable posting half of an endpoint
#[derive(Debug, Clone)]
pub struct ContextSender {
    tx: mpsc::UnboundedSender<String>,
}

impl ContextSender {
    pub fn post(&self, envelope: &Envelope) -> Result<()> {
        let text = envelope.to_json()?;
        self.post_raw(text)
    }

    /// Post arbitrary text, well-formed or not
    pub fn post_raw(&self, text: String) -> Result<()> {
        self.tx.send(text).map_err(|_| Error::ChannelClosed)
    }
}

/// Parse an incoming message, dropping anything foreign
///
/// Unparseable text and envelopes from another protocol version yield
/// `None`; neither is an error for the receiver.
pub fn decode_incoming(text: &str) -> Option<Envelope> {
    let envelope = match Envelope::from_json(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Dropping unparseable message: {}", e);
            return None;
        }
    };

    if !envelope.is_compatible() {
        debug!(
            id = %envelope.id,
            version = %envelope.version,
            "Dropping message with incompatible protocol version"
        );
        return None;
    }

    Some(envelope)
}
