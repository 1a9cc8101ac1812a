//! Layer activation
//!
//! One-shot state machine per layer and run:
//!
//! ```text
//! Inactive ──trigger──▶ Activating ──frames──▶ Active
//!                                        └──▶ InactiveOrEmpty (terminal)
//! ```
//!
//! There is no retry loop; rendering delays are covered by the frame wait.

use crate::surface::{FrameWaiter, RenderSurface};
use std::sync::Arc;
use themeprobe_common::config::LayerConfig;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Inactive,
    Activating,
    Active,
    InactiveOrEmpty,
}

impl LayerState {
    /// Start an activation attempt; only an inactive layer can be triggered
    pub fn begin(self) -> LayerState {
        match self {
            LayerState::Inactive => LayerState::Activating,
            other => other,
        }
    }

    /// Settle an activation attempt after the frame wait
    ///
    /// Active iff the UI indicator names the target layer and at least one of
    /// its elements is visible. Any other state is returned unchanged.
    pub fn settle(self, indicator_matches: bool, visible_count: usize) -> LayerState {
        match self {
            LayerState::Activating if indicator_matches && visible_count > 0 => LayerState::Active,
            LayerState::Activating => LayerState::InactiveOrEmpty,
            other => other,
        }
    }
}

/// Outcome of activating one layer
#[derive(Debug, Clone)]
pub struct LayerActivation {
    pub layer: String,
    pub state: LayerState,
    /// Visible owned elements, in surface order
    pub visible: Vec<String>,
    /// Every owned element found, visible or not
    pub owned: Vec<String>,
}

impl LayerActivation {
    pub fn is_active(&self) -> bool {
        self.state == LayerState::Active
    }
}

/// Makes a layer visible and enumerates its elements
pub struct LayerActivator {
    surface: Arc<dyn RenderSurface>,
    waiter: FrameWaiter,
}

impl LayerActivator {
    pub fn new(surface: Arc<dyn RenderSurface>, waiter: FrameWaiter) -> Self {
        Self { surface, waiter }
    }

    /// Run the activation state machine for `layer` under `root`
    pub async fn activate(&self, layer: &LayerConfig, root: &str) -> LayerActivation {
        let state = LayerState::Inactive.begin();
        debug!(layer = %layer.name, ?state, "Activating layer");

        self.trigger(layer).await;

        self.waiter.wait(self.surface.as_ref()).await;

        let indicator = self.surface.active_layer().await;
        let elements = self
            .surface
            .query_elements(root, &layer.effective_prefixes())
            .await;
        let visible: Vec<String> = elements
            .iter()
            .filter(|e| e.is_visible())
            .map(|e| e.id.clone())
            .collect();
        let owned: Vec<String> = elements.into_iter().map(|e| e.id).collect();

        let indicator_matches = indicator.as_deref() == Some(layer.name.as_str());
        let state = state.settle(indicator_matches, visible.len());

        if state == LayerState::Active {
            info!(
                "Layer '{}' active with {} visible elements",
                layer.name,
                visible.len()
            );
        } else {
            warn!(
                layer = %layer.name,
                indicator = ?indicator,
                owned = owned.len(),
                visible = visible.len(),
                "Layer inactive or empty, elements will not be probed"
            );
        }

        LayerActivation {
            layer: layer.name.clone(),
            state,
            visible,
            owned,
        }
    }

    /// Programmatic navigation first, then navigation controls
    async fn trigger(&self, layer: &LayerConfig) {
        match self.surface.navigate(&layer.name).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => warn!(layer = %layer.name, "Programmatic navigation failed: {}", e),
        }

        for control in layer.effective_nav_controls() {
            match self.surface.trigger_control(&control).await {
                Ok(true) => {
                    debug!(layer = %layer.name, control = %control, "Triggered navigation control");
                    return;
                }
                Ok(false) => {}
                Err(e) => warn!(control = %control, "Navigation control failed: {}", e),
            }
        }

        // Layer may already be showing; the settle step decides
        debug!(layer = %layer.name, "No navigation path found");
    }
}
