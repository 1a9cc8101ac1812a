//! Mapping data model shared by the probe engine and the transport
//!
//! Field names serialize in camelCase so reports and RESULT payloads match the
//! wire format consumed by browser-side controllers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Evidence that mutating one scalar path changed one element's observed style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub path: String,
    pub element_id: String,
    /// Changed property count plus one per changed key property
    pub magnitude: u32,
    pub changed_properties: Vec<String>,
}

/// Per-element mapping classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingStatus {
    Ok,
    Ambiguous,
    Unmapped,
    NonScalar,
    InactiveLayer,
}

impl MappingStatus {
    pub const ALL: [MappingStatus; 5] = [
        MappingStatus::Ok,
        MappingStatus::Ambiguous,
        MappingStatus::Unmapped,
        MappingStatus::NonScalar,
        MappingStatus::InactiveLayer,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Ok => "OK",
            MappingStatus::Ambiguous => "AMBIGUOUS",
            MappingStatus::Unmapped => "UNMAPPED",
            MappingStatus::NonScalar => "NON_SCALAR",
            MappingStatus::InactiveLayer => "INACTIVE_LAYER",
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-element result of a completed run
///
/// Built once, after every hit for the element has been collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingItem {
    pub element_id: String,
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_path: Option<String>,
    /// Top magnitude over the sum of all magnitudes (0.0-1.0)
    pub confidence: f64,
    #[serde(default)]
    pub changed_properties: Vec<String>,
    /// All hits, strongest first
    #[serde(default)]
    pub candidates: Vec<Hit>,
    pub status: MappingStatus,
}

impl MappingItem {
    /// Item for an element that was never probed or never changed
    pub fn without_hits(element_id: &str, layer: &str, status: MappingStatus) -> Self {
        Self {
            element_id: element_id.to_string(),
            layer: layer.to_string(),
            best_path: None,
            confidence: 0.0,
            changed_properties: Vec::new(),
            candidates: Vec::new(),
            status,
        }
    }
}

/// Outcome of a layer's activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerStatus {
    Scanned,
    InactiveOrEmpty,
}

impl LayerStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerStatus::Scanned => "SCANNED",
            LayerStatus::InactiveOrEmpty => "INACTIVE_OR_EMPTY",
        }
    }
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-layer summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub layer: String,
    /// Number of elements probed in this layer
    pub total: usize,
    pub ok: usize,
    pub status: LayerStatus,
}

/// Count of mapping items per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotals {
    #[serde(rename = "OK")]
    pub ok: usize,
    #[serde(rename = "AMBIGUOUS")]
    pub ambiguous: usize,
    #[serde(rename = "UNMAPPED")]
    pub unmapped: usize,
    #[serde(rename = "NON_SCALAR")]
    pub non_scalar: usize,
    #[serde(rename = "INACTIVE_LAYER")]
    pub inactive_layer: usize,
}

impl StatusTotals {
    pub fn from_items(items: &[MappingItem]) -> Self {
        let mut totals = Self::default();
        for item in items {
            totals.record(item.status);
        }
        totals
    }

    pub fn record(&mut self, status: MappingStatus) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: MappingStatus) -> usize {
        match status {
            MappingStatus::Ok => self.ok,
            MappingStatus::Ambiguous => self.ambiguous,
            MappingStatus::Unmapped => self.unmapped,
            MappingStatus::NonScalar => self.non_scalar,
            MappingStatus::InactiveLayer => self.inactive_layer,
        }
    }

    pub fn total(&self) -> usize {
        MappingStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    fn slot(&mut self, status: MappingStatus) -> &mut usize {
        match status {
            MappingStatus::Ok => &mut self.ok,
            MappingStatus::Ambiguous => &mut self.ambiguous,
            MappingStatus::Unmapped => &mut self.unmapped,
            MappingStatus::NonScalar => &mut self.non_scalar,
            MappingStatus::InactiveLayer => &mut self.inactive_layer,
        }
    }
}

/// Aggregate result of one probe run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRunResult {
    /// Requested scope (a layer name or `all`)
    pub scope: String,
    /// Root container the scan was anchored on
    pub root: String,
    /// Layers that reached the active state
    pub active_layers: Vec<String>,
    pub items: Vec<MappingItem>,
    pub totals: StatusTotals,
    /// OK items over all items (0 when there are no items)
    pub coverage: f64,
    pub layer_summary: Vec<LayerSummary>,
    pub generated_at: DateTime<Utc>,
}

impl ProbeRunResult {
    /// Find the mapping item for an element
    pub fn item(&self, element_id: &str) -> Option<&MappingItem> {
        self.items.iter().find(|i| i.element_id == element_id)
    }

    /// Items that mapped with high confidence
    pub fn ok_items(&self) -> impl Iterator<Item = &MappingItem> {
        self.items.iter().filter(|i| i.status == MappingStatus::Ok)
    }

    pub fn layer(&self, name: &str) -> Option<&LayerSummary> {
        self.layer_summary.iter().find(|l| l.layer == name)
    }
}
