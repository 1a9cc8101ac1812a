//! Runtime probe options
//!
//! Built from the TOML [`ProbeConfig`] with command-line overrides applied on
//! top. Durations are resolved here so the engine never deals in raw
//! milliseconds.

use std::time::Duration;
use themeprobe_common::config::{LayerConfig, ProbeConfig};

/// Scope value selecting every configured layer
pub const SCOPE_ALL: &str = "all";

/// Settings consumed by the probe engine
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub style_properties: Vec<String>,
    pub key_properties: Vec<String>,
    pub batch_size: usize,
    pub wait_frames: u32,
    pub frame_timeout: Duration,
    pub ok_threshold: f64,
    pub root_candidates: Vec<String>,
    pub layers: Vec<LayerConfig>,
}

/// Optional command-line overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub wait_frames: Option<u32>,
    pub batch_size: Option<usize>,
    pub connect_timeout_ms: Option<u64>,
    pub run_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Apply overrides to a loaded config
    pub fn apply(&self, mut config: ProbeConfig) -> ProbeConfig {
        if let Some(frames) = self.wait_frames {
            config.wait_frames = frames;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size.max(1);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.run_timeout_ms {
            config.run_timeout_ms = ms;
        }
        config
    }
}

impl From<&ProbeConfig> for ProbeOptions {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            style_properties: config.style_properties.clone(),
            key_properties: config.key_properties.clone(),
            batch_size: config.batch_size.max(1),
            wait_frames: config.wait_frames,
            frame_timeout: Duration::from_millis(config.frame_timeout_ms),
            ok_threshold: config.ok_threshold,
            root_candidates: config.root_candidates.clone(),
            layers: config.layers.clone(),
        }
    }
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self::from(&ProbeConfig::default())
    }
}

impl ProbeOptions {
    /// Layers to scan for a run scope, in scan order
    ///
    /// `all` yields every configured layer. A name that is not configured
    /// falls back to the `"<name>-"` prefix convention.
    pub fn resolve_scope(&self, scope: &str) -> Vec<LayerConfig> {
        if scope == SCOPE_ALL {
            return self.layers.clone();
        }
        let layer = self
            .layers
            .iter()
            .find(|l| l.name == scope)
            .cloned()
            .unwrap_or_else(|| LayerConfig::named(scope));
        vec![layer]
    }
}
