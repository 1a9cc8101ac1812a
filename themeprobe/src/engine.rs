//! Probe engine
//!
//! Drives the whole scan: locate the root container, activate each layer in
//! scope, then for every scalar path run the cycle
//!
//! ```text
//! snapshot → mutate → wait → re-snapshot → diff → restore
//! ```
//!
//! Probes are strictly sequential. Restoration runs whether the cycle
//! succeeded, returned an error, or panicked, and a path's original value is
//! back in place (plus one rerender and frame wait) before the next path is
//! touched.

use crate::adapter::ThemeAdapter;
use crate::config::ProbeOptions;
use crate::document::ScalarValue;
use crate::enumerate::{enumerate_scalars, ScalarDescriptor};
use crate::error::{Error, Result};
use crate::layer::LayerActivator;
use crate::report::ReportBuilder;
use crate::scorer::ConfidenceScorer;
use crate::signal::synthesize;
use crate::surface::{FrameWaiter, RenderSurface, StyleMap};
use futures::FutureExt;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use themeprobe_common::config::LayerConfig;
use themeprobe_common::model::{
    Hit, LayerStatus, LayerSummary, MappingItem, MappingStatus, ProbeRunResult,
};
use tracing::{debug, error, info};

/// Progress notification, emitted once per probed path
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeProgress {
    pub layer: String,
    /// Zero-based position of `path` in the layer's scalar list
    pub index: usize,
    pub total: usize,
    pub path: String,
}

pub type ProgressCallback = Arc<dyn Fn(&ProbeProgress) + Send + Sync>;

/// Point-in-time computed styles of a set of elements
///
/// Elements that were gone at capture time are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSnapshot(BTreeMap<String, StyleMap>);

impl StyleSnapshot {
    pub async fn capture(
        surface: &dyn RenderSurface,
        element_ids: &[String],
        properties: &[String],
    ) -> Self {
        let mut styles = BTreeMap::new();
        for id in element_ids {
            if let Some(style) = surface.computed_style(id, properties).await {
                styles.insert(id.clone(), style);
            }
        }
        Self(styles)
    }

    pub fn get(&self, element_id: &str) -> Option<&StyleMap> {
        self.0.get(element_id)
    }

    /// Properties of `element_id` whose value differs in `after`
    ///
    /// `None` unless the element is present in both snapshots.
    pub fn changed_properties(&self, after: &StyleSnapshot, element_id: &str) -> Option<Vec<String>> {
        let before = self.0.get(element_id)?;
        let after = after.0.get(element_id)?;
        Some(
            before
                .iter()
                .filter(|(prop, value)| after.get(prop.as_str()) != Some(*value))
                .map(|(prop, _)| prop.clone())
                .collect(),
        )
    }

    /// One hit per element present in both snapshots with a changed property
    pub fn diff(&self, after: &StyleSnapshot, path: &str, key_properties: &[String]) -> Vec<Hit> {
        self.0
            .keys()
            .filter_map(|id| {
                let changed = self.changed_properties(after, id)?;
                if changed.is_empty() {
                    return None;
                }
                Some(Hit {
                    path: path.to_string(),
                    element_id: id.clone(),
                    magnitude: magnitude(&changed, key_properties),
                    changed_properties: changed,
                })
            })
            .collect()
    }
}

/// Changed property count plus one per changed key property
pub fn magnitude(changed: &[String], key_properties: &[String]) -> u32 {
    let keys = changed.iter().filter(|p| key_properties.contains(*p)).count();
    (changed.len() + keys) as u32
}

/// Runs probe scans against one theme adapter and render surface
pub struct ProbeEngine {
    adapter: Arc<dyn ThemeAdapter>,
    surface: Arc<dyn RenderSurface>,
    options: ProbeOptions,
    progress: Option<ProgressCallback>,
}

impl ProbeEngine {
    pub fn new(
        adapter: Arc<dyn ThemeAdapter>,
        surface: Arc<dyn RenderSurface>,
        options: ProbeOptions,
    ) -> Self {
        Self {
            adapter,
            surface,
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Styles of `element_ids` right now
    pub async fn snapshot(&self, element_ids: &[String], properties: &[String]) -> StyleSnapshot {
        StyleSnapshot::capture(self.surface.as_ref(), element_ids, properties).await
    }

    /// Probe a single scalar path against a set of candidate elements
    ///
    /// A vanished path or a non-visual value yields no hits. Any failure
    /// between mutation and re-snapshot is reported as [`Error::Probe`] after
    /// the original value has been restored; a failed restore is
    /// [`Error::RestoreFailed`].
    pub async fn probe_one(
        &self,
        path: &str,
        element_ids: &[String],
        properties: &[String],
        wait_frames: u32,
    ) -> Result<Vec<Hit>> {
        let document = self.adapter.document().await?;
        let original = match document.scalar_at(path) {
            Some(value) => value.clone(),
            None => {
                debug!(path, "Path vanished, skipping");
                return Ok(Vec::new());
            }
        };

        let signal = match synthesize(path, &original) {
            Some(signal) => signal,
            None => return Ok(Vec::new()),
        };

        let waiter = FrameWaiter::new(wait_frames, self.options.frame_timeout);
        let cycle = self.mutate_and_observe(path, signal, element_ids, properties, waiter);
        let outcome = AssertUnwindSafe(cycle).catch_unwind().await;

        self.restore(path, original, waiter).await?;

        match outcome {
            Ok(Ok(hits)) => {
                if !hits.is_empty() {
                    debug!(path, hits = hits.len(), "Signal observed");
                }
                Ok(hits)
            }
            Ok(Err(e)) => Err(Error::Probe {
                path: path.to_string(),
                reason: e.to_string(),
            }),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn mutate_and_observe(
        &self,
        path: &str,
        signal: ScalarValue,
        element_ids: &[String],
        properties: &[String],
        waiter: FrameWaiter,
    ) -> Result<Vec<Hit>> {
        let before = self.snapshot(element_ids, properties).await;

        self.adapter.set_scalar(path, signal).await?;
        self.adapter.force_rerender().await?;
        waiter.wait(self.surface.as_ref()).await;

        let after = self.snapshot(element_ids, properties).await;
        Ok(before.diff(&after, path, &self.options.key_properties))
    }

    async fn restore(&self, path: &str, original: ScalarValue, waiter: FrameWaiter) -> Result<()> {
        let restored = async {
            self.adapter.restore_scalar(path, original).await?;
            self.adapter.force_rerender().await
        }
        .await;

        if let Err(e) = restored {
            error!(path, "Failed to restore original value: {}", e);
            return Err(Error::RestoreFailed {
                path: path.to_string(),
                reason: e.to_string(),
            });
        }

        waiter.wait(self.surface.as_ref()).await;
        Ok(())
    }

    /// First configured root candidate present in the UI
    pub async fn find_root(&self) -> Result<String> {
        for candidate in &self.options.root_candidates {
            if self.surface.has_root(candidate).await {
                return Ok(candidate.clone());
            }
        }
        Err(Error::Setup(format!(
            "no theme root container found (tried {})",
            self.options.root_candidates.join(", ")
        )))
    }

    /// Full scan of `scope` (a layer name or `all`)
    pub async fn run(&self, scope: &str) -> Result<ProbeRunResult> {
        let root = self.find_root().await?;
        let layers = self.options.resolve_scope(scope);
        info!(
            "Starting probe run: scope={}, root={}, layers={}",
            scope,
            root,
            layers.len()
        );

        let activator = LayerActivator::new(
            self.surface.clone(),
            FrameWaiter::new(self.options.wait_frames, self.options.frame_timeout),
        );
        let scorer = ConfidenceScorer::new(self.options.ok_threshold);

        // Active layers claim for good; inactive claims yield to a later active layer
        let mut claimed: HashSet<String> = HashSet::new();
        let mut parked: HashSet<String> = HashSet::new();
        let mut active_layers = Vec::new();
        let mut items: Vec<MappingItem> = Vec::new();
        let mut summaries = Vec::new();

        for layer in &layers {
            let activation = activator.activate(layer, &root).await;

            if activation.is_active() {
                let element_ids = unclaimed(activation.visible, &mut claimed);
                let hits = self.scan_layer(layer, &element_ids).await?;
                let layer_items = scorer.score_layer(&layer.name, &element_ids, &hits);

                let ok = layer_items
                    .iter()
                    .filter(|i| i.status == MappingStatus::Ok)
                    .count();
                info!(
                    "Layer '{}' scanned: {} elements, {} OK, {} hits",
                    layer.name,
                    element_ids.len(),
                    ok,
                    hits.len()
                );

                summaries.push(LayerSummary {
                    layer: layer.name.clone(),
                    total: element_ids.len(),
                    ok,
                    status: LayerStatus::Scanned,
                });
                active_layers.push(layer.name.clone());
                items.extend(layer_items);
            } else {
                let element_ids: Vec<String> = activation
                    .owned
                    .into_iter()
                    .filter(|id| !claimed.contains(id))
                    .collect();
                let element_ids = unclaimed(element_ids, &mut parked);
                items.extend(element_ids.iter().map(|id| {
                    MappingItem::without_hits(id, &layer.name, MappingStatus::InactiveLayer)
                }));
                summaries.push(LayerSummary {
                    layer: layer.name.clone(),
                    total: 0,
                    ok: 0,
                    status: LayerStatus::InactiveOrEmpty,
                });
            }
        }

        items.retain(|i| i.status != MappingStatus::InactiveLayer || !claimed.contains(&i.element_id));

        let result = ReportBuilder::build(scope, &root, active_layers, items, summaries);
        info!(
            "Probe run complete: {} items, coverage {:.1}%",
            result.items.len(),
            result.coverage * 100.0
        );
        Ok(result)
    }

    /// Probe every scalar of the current document against one layer's elements
    async fn scan_layer(&self, layer: &LayerConfig, element_ids: &[String]) -> Result<Vec<Hit>> {
        if element_ids.is_empty() {
            return Ok(Vec::new());
        }

        let document = self.adapter.document().await?;
        let scalars: Vec<ScalarDescriptor> = enumerate_scalars(&document);
        let total = scalars.len();
        let batch_size = self.options.batch_size.max(1);
        let mut hits = Vec::new();

        for (batch_index, batch) in scalars.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;
            debug!(
                layer = %layer.name,
                "Probing paths {}-{} of {}",
                offset + 1,
                offset + batch.len(),
                total
            );

            for (i, scalar) in batch.iter().enumerate() {
                if let Some(progress) = &self.progress {
                    progress(&ProbeProgress {
                        layer: layer.name.clone(),
                        index: offset + i,
                        total,
                        path: scalar.path.clone(),
                    });
                }

                let path_hits = self
                    .probe_one(
                        &scalar.path,
                        element_ids,
                        &self.options.style_properties,
                        self.options.wait_frames,
                    )
                    .await?;
                hits.extend(path_hits);
            }
        }

        Ok(hits)
    }
}

/// Keep ids not yet in `claimed` and claim them
fn unclaimed(ids: Vec<String>, claimed: &mut HashSet<String>) -> Vec<String> {
    ids.into_iter().filter(|id| claimed.insert(id.clone())).collect()
}
