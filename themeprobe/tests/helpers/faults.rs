//! Collaborators that misbehave on cue

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use themeprobe::adapter::{SharedThemeStore, ThemeAdapter};
use themeprobe::document::{ScalarValue, ThemeNode};
use themeprobe::scene::SceneSurface;
use themeprobe::surface::{ElementInfo, RenderSurface, StyleMap};
use themeprobe::{Error, Result};

/// Unmounts `target` the first time it is read while `trigger_path` holds a
/// value other than `original`
pub struct VanishingSurface {
    pub inner: Arc<SceneSurface>,
    store: Arc<SharedThemeStore>,
    target: String,
    trigger_path: String,
    original: ScalarValue,
}

impl VanishingSurface {
    pub fn new(
        inner: Arc<SceneSurface>,
        store: Arc<SharedThemeStore>,
        target: &str,
        trigger_path: &str,
        original: ScalarValue,
    ) -> Self {
        Self {
            inner,
            store,
            target: target.to_string(),
            trigger_path: trigger_path.to_string(),
            original,
        }
    }
}

#[async_trait]
impl RenderSurface for VanishingSurface {
    async fn has_root(&self, selector: &str) -> bool {
        self.inner.has_root(selector).await
    }

    async fn active_layer(&self) -> Option<String> {
        self.inner.active_layer().await
    }

    async fn navigate(&self, layer: &str) -> Result<bool> {
        self.inner.navigate(layer).await
    }

    async fn trigger_control(&self, control_id: &str) -> Result<bool> {
        self.inner.trigger_control(control_id).await
    }

    async fn query_elements(&self, root: &str, prefixes: &[String]) -> Vec<ElementInfo> {
        self.inner.query_elements(root, prefixes).await
    }

    async fn computed_style(&self, element_id: &str, properties: &[String]) -> Option<StyleMap> {
        if element_id == self.target {
            let current = self.store.scalar_at(&self.trigger_path).await;
            if current.as_ref() != Some(&self.original) {
                self.inner.remove_element(&self.target).await;
            }
        }
        self.inner.computed_style(element_id, properties).await
    }

    async fn next_frame(&self) {
        self.inner.next_frame().await
    }
}

/// Every frame takes `frame_delay`
pub struct SlowSurface {
    pub inner: Arc<SceneSurface>,
    frame_delay: Duration,
}

impl SlowSurface {
    pub fn new(inner: Arc<SceneSurface>, frame_delay: Duration) -> Self {
        Self { inner, frame_delay }
    }
}

#[async_trait]
impl RenderSurface for SlowSurface {
    async fn has_root(&self, selector: &str) -> bool {
        self.inner.has_root(selector).await
    }

    async fn active_layer(&self) -> Option<String> {
        self.inner.active_layer().await
    }

    async fn navigate(&self, layer: &str) -> Result<bool> {
        self.inner.navigate(layer).await
    }

    async fn trigger_control(&self, control_id: &str) -> Result<bool> {
        self.inner.trigger_control(control_id).await
    }

    async fn query_elements(&self, root: &str, prefixes: &[String]) -> Vec<ElementInfo> {
        self.inner.query_elements(root, prefixes).await
    }

    async fn computed_style(&self, element_id: &str, properties: &[String]) -> Option<StyleMap> {
        self.inner.computed_style(element_id, properties).await
    }

    async fn next_frame(&self) {
        tokio::time::sleep(self.frame_delay).await;
        self.inner.next_frame().await
    }
}

/// Panics on the first rerender request while a signal is applied
pub struct PanickingAdapter {
    pub inner: Arc<SharedThemeStore>,
    armed: AtomicBool,
}

impl PanickingAdapter {
    pub fn new(inner: Arc<SharedThemeStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ThemeAdapter for PanickingAdapter {
    async fn document(&self) -> Result<ThemeNode> {
        self.inner.document().await
    }

    async fn set_scalar(&self, path: &str, value: ScalarValue) -> Result<()> {
        self.inner.set_scalar(path, value).await?;
        self.armed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn restore_scalar(&self, path: &str, previous: ScalarValue) -> Result<()> {
        self.armed.store(false, Ordering::SeqCst);
        self.inner.restore_scalar(path, previous).await
    }

    async fn force_rerender(&self) -> Result<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            panic!("renderer crashed mid-probe");
        }
        self.inner.force_rerender().await
    }
}

/// Accepts signals but refuses to put anything back
pub struct UnrestorableAdapter {
    pub inner: Arc<SharedThemeStore>,
}

#[async_trait]
impl ThemeAdapter for UnrestorableAdapter {
    async fn document(&self) -> Result<ThemeNode> {
        self.inner.document().await
    }

    async fn set_scalar(&self, path: &str, value: ScalarValue) -> Result<()> {
        self.inner.set_scalar(path, value).await
    }

    async fn restore_scalar(&self, _path: &str, _previous: ScalarValue) -> Result<()> {
        Err(Error::Adapter("store is read-only".to_string()))
    }

    async fn force_rerender(&self) -> Result<()> {
        self.inner.force_rerender().await
    }
}
