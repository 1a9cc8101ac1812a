//! Render surface contract
//!
//! Everything the probe needs from the rendered UI: locating the root
//! container, layer navigation, element enumeration by id prefix, computed
//! style reads, and yielding to the rendering pipeline.

use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

/// Computed style of one element: property → value
pub type StyleMap = BTreeMap<String, String>;

/// An addressable element as reported by the surface
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Computed `visibility` value
    pub visibility: String,
}

impl ElementInfo {
    /// Non-zero bounding box and not hidden by computed visibility
    pub fn is_visible(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.visibility != "hidden"
            && self.visibility != "collapse"
    }
}

#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// True if `selector` addresses a container in the current UI
    async fn has_root(&self, selector: &str) -> bool;

    /// Name of the currently active layer, as the UI indicates it
    async fn active_layer(&self) -> Option<String>;

    /// Programmatic navigation; `Ok(false)` when no such API exists
    async fn navigate(&self, layer: &str) -> Result<bool>;

    /// Trigger a navigation control; `Ok(false)` when it is not found
    async fn trigger_control(&self, control_id: &str) -> Result<bool>;

    /// Elements under `root` whose id starts with any of `prefixes`
    async fn query_elements(&self, root: &str, prefixes: &[String]) -> Vec<ElementInfo>;

    /// Computed values of `properties`; `None` if the element is gone
    async fn computed_style(&self, element_id: &str, properties: &[String]) -> Option<StyleMap>;

    /// Resolve after the next rendered frame
    async fn next_frame(&self);
}

/// Waits a fixed number of frames, each bounded by a timeout fallback
#[derive(Debug, Clone, Copy)]
pub struct FrameWaiter {
    frames: u32,
    frame_timeout: Duration,
}

impl FrameWaiter {
    pub fn new(frames: u32, frame_timeout: Duration) -> Self {
        Self {
            frames,
            frame_timeout,
        }
    }

    /// Yield to the rendering pipeline `frames` times
    ///
    /// A frame that does not arrive within the timeout counts as elapsed.
    pub async fn wait(&self, surface: &dyn RenderSurface) {
        for frame in 0..self.frames {
            if tokio::time::timeout(self.frame_timeout, surface.next_frame())
                .await
                .is_err()
            {
                trace!(frame, "Frame wait fell back to timeout");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(width: f64, height: f64, visibility: &str) -> ElementInfo {
        ElementInfo {
            id: "home-x".to_string(),
            width,
            height,
            visibility: visibility.to_string(),
        }
    }

    #[test]
    fn test_visibility_rules() {
        assert!(element(10.0, 10.0, "visible").is_visible());
        assert!(!element(0.0, 10.0, "visible").is_visible());
        assert!(!element(10.0, 0.0, "visible").is_visible());
        assert!(!element(10.0, 10.0, "hidden").is_visible());
        assert!(!element(10.0, 10.0, "collapse").is_visible());
    }
}
