//! Confidence scoring
//!
//! Groups hits by element and ranks each element's candidate paths.
//!
//! - No hits: `UNMAPPED`, confidence 0
//! - Otherwise confidence = top magnitude / sum of magnitudes, and the item is
//!   `OK` when there is exactly one hit or confidence exceeds the threshold,
//!   `AMBIGUOUS` otherwise
//!
//! Equal magnitudes keep probe order, so the first-probed path wins a tie.

use std::collections::HashMap;
use themeprobe_common::model::{Hit, MappingItem, MappingStatus};

/// Default confidence above which a multi-hit element is OK
pub const DEFAULT_OK_THRESHOLD: f64 = 0.8;

pub struct ConfidenceScorer {
    ok_threshold: f64,
}

impl ConfidenceScorer {
    pub fn new(ok_threshold: f64) -> Self {
        Self {
            ok_threshold: ok_threshold.clamp(0.0, 1.0),
        }
    }

    /// One item per element of a scanned layer
    ///
    /// `hits` must be in probe order; items follow `element_ids` order.
    pub fn score_layer(&self, layer: &str, element_ids: &[String], hits: &[Hit]) -> Vec<MappingItem> {
        let mut by_element: HashMap<&str, Vec<Hit>> = HashMap::new();
        for hit in hits {
            by_element
                .entry(hit.element_id.as_str())
                .or_default()
                .push(hit.clone());
        }

        element_ids
            .iter()
            .map(|id| {
                let element_hits = by_element.remove(id.as_str()).unwrap_or_default();
                self.score_element(id, layer, element_hits)
            })
            .collect()
    }

    /// Rank one element's hits and classify it
    pub fn score_element(&self, element_id: &str, layer: &str, mut hits: Vec<Hit>) -> MappingItem {
        if hits.is_empty() {
            return MappingItem::without_hits(element_id, layer, MappingStatus::Unmapped);
        }

        // Stable sort keeps probe order among equal magnitudes
        hits.sort_by(|a, b| b.magnitude.cmp(&a.magnitude));

        let top = &hits[0];
        let total: u32 = hits.iter().map(|h| h.magnitude).sum();
        let confidence = if total == 0 {
            0.0
        } else {
            (top.magnitude as f64 / total as f64).clamp(0.0, 1.0)
        };

        let status = if hits.len() == 1 || confidence > self.ok_threshold {
            MappingStatus::Ok
        } else {
            MappingStatus::Ambiguous
        };

        MappingItem {
            element_id: element_id.to_string(),
            layer: layer.to_string(),
            best_path: Some(top.path.clone()),
            confidence,
            changed_properties: top.changed_properties.clone(),
            candidates: hits.clone(),
            status,
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(DEFAULT_OK_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(path: &str, element: &str, magnitude: u32) -> Hit {
        Hit {
            path: path.to_string(),
            element_id: element.to_string(),
            magnitude,
            changed_properties: vec!["background-color".to_string()],
        }
    }

    #[test]
    fn test_single_hit_is_ok_with_full_confidence() {
        let item = ConfidenceScorer::default().score_element("home-a", "home", vec![hit("/a", "home-a", 1)]);
        assert_eq!(item.status, MappingStatus::Ok);
        assert_eq!(item.confidence, 1.0);
        assert_eq!(item.best_path.as_deref(), Some("/a"));
    }

    #[test]
    fn test_equal_hits_are_ambiguous_first_seen_wins() {
        let hits = vec![hit("/first", "home-a", 2), hit("/second", "home-a", 2)];
        let item = ConfidenceScorer::default().score_element("home-a", "home", hits);

        assert_eq!(item.status, MappingStatus::Ambiguous);
        assert!((item.confidence - 0.5).abs() < 1e-9);
        assert_eq!(item.candidates.len(), 2);
        assert_eq!(item.best_path.as_deref(), Some("/first"));
    }

    #[test]
    fn test_dominant_hit_clears_threshold() {
        // 9 / (9 + 1) = 0.9 > 0.8
        let hits = vec![hit("/weak", "home-a", 1), hit("/strong", "home-a", 9)];
        let item = ConfidenceScorer::default().score_element("home-a", "home", hits);

        assert_eq!(item.status, MappingStatus::Ok);
        assert_eq!(item.best_path.as_deref(), Some("/strong"));
        assert!(item.confidence < 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 4 / (4 + 1) = 0.8, not above 0.8
        let hits = vec![hit("/a", "home-a", 4), hit("/b", "home-a", 1)];
        let item = ConfidenceScorer::default().score_element("home-a", "home", hits);
        assert_eq!(item.status, MappingStatus::Ambiguous);
    }

    #[test]
    fn test_layer_scoring_covers_every_element() {
        let ids = vec!["home-a".to_string(), "home-b".to_string()];
        let hits = vec![hit("/x", "home-a", 2), hit("/x", "stranger", 2)];
        let items = ConfidenceScorer::default().score_layer("home", &ids, &hits);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].status, MappingStatus::Ok);
        assert_eq!(items[1].element_id, "home-b");
        assert_eq!(items[1].status, MappingStatus::Unmapped);
        assert_eq!(items[1].confidence, 0.0);
    }
}
