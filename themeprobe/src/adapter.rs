//! Configuration adapter
//!
//! The probe never touches the configuration store directly; it goes through
//! [`ThemeAdapter`]. A new value must be observable by the render surface
//! synchronously or before the next frame.
//!
//! [`SharedThemeStore`] is an in-memory implementation with change
//! notification, used by the CLI and tests.

use crate::document::{ScalarValue, ThemeNode};
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

/// Read/write/notify interface over the live theme document
#[async_trait]
pub trait ThemeAdapter: Send + Sync {
    /// Snapshot of the current document
    async fn document(&self) -> Result<ThemeNode>;

    /// Inject a signal value at `path`
    async fn set_scalar(&self, path: &str, value: ScalarValue) -> Result<()>;

    /// Put a previously read value back at `path`
    async fn restore_scalar(&self, path: &str, previous: ScalarValue) -> Result<()>;

    /// Ask the rendering layer to pick up the current document
    async fn force_rerender(&self) -> Result<()>;
}

/// Change notification emitted by [`SharedThemeStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeChange {
    ScalarSet { path: String, revision: u64 },
    ScalarRestored { path: String, revision: u64 },
    RerenderRequested { revision: u64 },
}

/// In-memory theme store
///
/// Uses RwLock for concurrent reads by the render surface with rare writes
/// from the probe.
pub struct SharedThemeStore {
    document: RwLock<ThemeNode>,
    revision: AtomicU64,
    change_tx: broadcast::Sender<ThemeChange>,
}

impl SharedThemeStore {
    pub fn new(document: ThemeNode) -> Self {
        let (change_tx, _) = broadcast::channel(100);
        Self {
            document: RwLock::new(document),
            revision: AtomicU64::new(0),
            change_tx,
        }
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        Self::new(ThemeNode::from(value))
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ThemeChange> {
        self.change_tx.subscribe()
    }

    /// Number of writes and rerender requests so far
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }

    /// Current document, without going through the adapter trait
    pub async fn snapshot(&self) -> ThemeNode {
        self.document.read().await.clone()
    }

    /// Read a scalar without cloning the whole document
    pub async fn scalar_at(&self, path: &str) -> Option<ScalarValue> {
        self.document.read().await.scalar_at(path).cloned()
    }

    fn bump(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn notify(&self, change: ThemeChange) {
        // No subscribers is fine
        let _ = self.change_tx.send(change);
    }
}

#[async_trait]
impl ThemeAdapter for SharedThemeStore {
    async fn document(&self) -> Result<ThemeNode> {
        Ok(self.snapshot().await)
    }

    async fn set_scalar(&self, path: &str, value: ScalarValue) -> Result<()> {
        self.document.write().await.set_scalar(path, value)?;
        let revision = self.bump();
        trace!(path, revision, "Scalar set");
        self.notify(ThemeChange::ScalarSet {
            path: path.to_string(),
            revision,
        });
        Ok(())
    }

    async fn restore_scalar(&self, path: &str, previous: ScalarValue) -> Result<()> {
        self.document.write().await.set_scalar(path, previous)?;
        let revision = self.bump();
        trace!(path, revision, "Scalar restored");
        self.notify(ThemeChange::ScalarRestored {
            path: path.to_string(),
            revision,
        });
        Ok(())
    }

    async fn force_rerender(&self) -> Result<()> {
        let revision = self.bump();
        self.notify(ThemeChange::RerenderRequested { revision });
        Ok(())
    }
}
