//! Callee side of the transport
//!
//! Hosts a [`ProbeEngine`] in the rendering context. Announces itself with a
//! `READY {id: "init"}` on start, answers every PING, and executes RUN
//! requests one at a time. PINGs keep being answered while a run is in
//! flight.

use crate::engine::ProbeEngine;
use crate::transport::channel::{decode_incoming, ContextEndpoint, ContextSender};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use themeprobe_common::config::ProbeConfig;
use themeprobe_common::protocol::{Envelope, MessageBody, INIT_ID};
use tokio::sync::{oneshot, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

pub struct ProbeListener {
    engine: Arc<ProbeEngine>,
    origin: String,
}

impl ProbeListener {
    pub fn new(engine: Arc<ProbeEngine>, origin: impl Into<String>) -> Self {
        Self {
            engine,
            origin: origin.into(),
        }
    }

    pub fn from_config(engine: Arc<ProbeEngine>, config: &ProbeConfig) -> Self {
        Self::new(engine, config.origin.clone())
    }

    /// Start serving on `endpoint`
    ///
    /// The listener lives until [`ListenerHandle::stop`] is called, the
    /// handle is dropped, or the peer goes away.
    pub fn start(self, endpoint: ContextEndpoint) -> ListenerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.serve(endpoint, shutdown_rx));
        ListenerHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn serve(self, endpoint: ContextEndpoint, mut shutdown_rx: oneshot::Receiver<()>) {
        let (sender, mut incoming) = endpoint.split();
        let run_lock = Arc::new(Mutex::new(()));
        let mut runs = JoinSet::new();

        info!("Probe listener started (origin: {})", self.origin);
        if let Err(e) = sender.post(&Envelope::ready(INIT_ID, &self.origin)) {
            debug!("Initial READY not delivered: {}", e);
        }

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                message = incoming.recv() => {
                    let Some(text) = message else {
                        debug!("Peer context closed");
                        break;
                    };
                    let Some(envelope) = decode_incoming(&text) else {
                        continue;
                    };
                    match envelope.body {
                        MessageBody::Ping => {
                            debug!(id = %envelope.id, "PING received");
                            if let Err(e) = sender.post(&Envelope::ready(&envelope.id, &self.origin)) {
                                warn!("Failed to answer PING: {}", e);
                            }
                        }
                        MessageBody::Run { screen } => {
                            runs.spawn(execute_run(
                                self.engine.clone(),
                                run_lock.clone(),
                                sender.clone(),
                                envelope.id,
                                screen,
                            ));
                        }
                        other => debug!(id = %envelope.id, "Ignoring {}", other.kind()),
                    }
                }
                Some(joined) = runs.join_next(), if !runs.is_empty() => {
                    if let Err(e) = joined {
                        error!("Probe run task failed: {}", e);
                    }
                }
            }
        }

        // In-flight runs finish so their restores are never cut short
        if !runs.is_empty() {
            info!("Waiting for {} in-flight probe run(s)", runs.len());
        }
        while let Some(joined) = runs.join_next().await {
            if let Err(e) = joined {
                error!("Probe run task failed: {}", e);
            }
        }
        info!("Probe listener stopped");
    }
}

async fn execute_run(
    engine: Arc<ProbeEngine>,
    run_lock: Arc<Mutex<()>>,
    sender: ContextSender,
    id: String,
    screen: String,
) {
    let _serialized = run_lock.lock().await;
    info!(id = %id, "Probe run requested for '{}'", screen);

    let reply = match AssertUnwindSafe(engine.run(&screen)).catch_unwind().await {
        Ok(Ok(result)) => Envelope::result(&id, result),
        Ok(Err(e)) => {
            warn!(id = %id, "Probe run failed: {}", e);
            Envelope::failure(&id, e.to_string())
        }
        Err(_) => {
            error!(id = %id, "Probe run panicked");
            Envelope::failure(&id, "probe run panicked")
        }
    };

    if let Err(e) = sender.post(&reply) {
        debug!(id = %id, "RESULT not delivered: {}", e);
    }
}

/// Lifecycle handle of a running listener
pub struct ListenerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop accepting messages and wait for in-flight runs to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!("Probe listener task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
