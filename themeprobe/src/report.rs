//! Report building and formatting
//!
//! Pure assembly of run results and the three exported artifacts: the compact
//! applied mapping (OK items only), the full report, and a Markdown summary.
//! Writing them anywhere is up to the caller.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use themeprobe_common::model::{
    LayerSummary, MappingItem, MappingStatus, ProbeRunResult, StatusTotals,
};

/// Assembles a [`ProbeRunResult`]
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(
        scope: &str,
        root: &str,
        active_layers: Vec<String>,
        items: Vec<MappingItem>,
        layer_summary: Vec<LayerSummary>,
    ) -> ProbeRunResult {
        let totals = StatusTotals::from_items(&items);
        let coverage = Self::coverage(&totals);

        ProbeRunResult {
            scope: scope.to_string(),
            root: root.to_string(),
            active_layers,
            items,
            totals,
            coverage,
            layer_summary,
            generated_at: Utc::now(),
        }
    }

    /// OK items over all items, 0 when there are none
    pub fn coverage(totals: &StatusTotals) -> f64 {
        let total = totals.total();
        if total == 0 {
            0.0
        } else {
            totals.ok as f64 / total as f64
        }
    }
}

/// Compact artifact: high-confidence element → path pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMapping {
    pub screen: String,
    pub generated_at: String,
    pub coverage: f64,
    pub items: Vec<AppliedMappingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMappingItem {
    pub id: String,
    pub path: String,
    pub confidence: f64,
    pub changed_properties: Vec<String>,
    pub status: MappingStatus,
}

impl AppliedMapping {
    pub fn from_result(result: &ProbeRunResult) -> Self {
        let items = result
            .ok_items()
            .filter_map(|item| {
                item.best_path.as_ref().map(|path| AppliedMappingItem {
                    id: item.element_id.clone(),
                    path: path.clone(),
                    confidence: item.confidence,
                    changed_properties: item.changed_properties.clone(),
                    status: item.status,
                })
            })
            .collect();

        Self {
            screen: result.scope.clone(),
            generated_at: result.generated_at.to_rfc3339(),
            coverage: result.coverage,
            items,
        }
    }
}

/// The three per-run artifacts, rendered and ready to persist
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub applied_json: String,
    pub report_json: String,
    pub summary_md: String,
}

impl ReportArtifacts {
    pub fn render(result: &ProbeRunResult) -> serde_json::Result<Self> {
        Ok(Self {
            applied_json: serde_json::to_string_pretty(&AppliedMapping::from_result(result))?,
            report_json: serde_json::to_string_pretty(result)?,
            summary_md: SummaryFormatter::format_summary(result),
        })
    }

    /// Conventional file names, in artifact order
    pub fn file_names(screen: &str) -> [String; 3] {
        [
            format!("mapping.{}.autogen.json", screen),
            format!("mapping.{}.report.json", screen),
            format!("mapping.{}.summary.md", screen),
        ]
    }
}

/// Human-readable summaries
pub struct SummaryFormatter;

impl SummaryFormatter {
    /// Markdown summary: overview, status breakdown, layers, detail tables
    pub fn format_summary(result: &ProbeRunResult) -> String {
        let mut md = String::new();

        md.push_str(&format!("# Theme Probe Mapping Summary: {}\n\n", result.scope));
        md.push_str(&format!("Generated: {}\n\n", result.generated_at.to_rfc3339()));

        md.push_str("## Overview\n\n");
        md.push_str(&format!("- **Root**: {}\n", result.root));
        md.push_str(&format!("- **Coverage**: {}\n", format_percent(result.coverage)));
        md.push_str(&format!("- **Total Elements**: {}\n", result.items.len()));
        md.push_str(&format!(
            "- **Active Layers**: {}\n\n",
            if result.active_layers.is_empty() {
                "none".to_string()
            } else {
                result.active_layers.join(", ")
            }
        ));

        md.push_str("## Status Breakdown\n\n");
        md.push_str("| Status | Count |\n");
        md.push_str("|--------|-------|\n");
        for status in MappingStatus::ALL {
            md.push_str(&format!("| {} | {} |\n", status, result.totals.get(status)));
        }
        md.push('\n');

        md.push_str("## Layers\n\n");
        md.push_str("| Layer | Total | OK | Status |\n");
        md.push_str("|-------|-------|----|--------|\n");
        for layer in &result.layer_summary {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                layer.layer, layer.total, layer.ok, layer.status
            ));
        }
        md.push('\n');

        if !result.items.is_empty() {
            md.push_str("## Detailed Mapping\n\n");
            md.push_str("| Element ID | Path | Status | Confidence | Changed Props |\n");
            md.push_str("|------------|------|--------|------------|---------------|\n");
            for item in sorted_for_display(&result.items) {
                md.push_str(&format_item_row(item));
            }
            md.push('\n');
        }

        let problematic: Vec<&MappingItem> = sorted_for_display(&result.items)
            .into_iter()
            .filter(|i| i.status != MappingStatus::Ok)
            .collect();
        if !problematic.is_empty() {
            md.push_str(&format!("## Problematic Elements ({})\n\n", problematic.len()));
            md.push_str("| Element ID | Status | Confidence | Best Path |\n");
            md.push_str("|------------|--------|------------|-----------|\n");
            for item in problematic {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    item.element_id,
                    item.status,
                    format_percent(item.confidence),
                    item.best_path.as_deref().unwrap_or("N/A")
                ));
            }
        }

        md
    }

    /// One-line console summary
    pub fn format_one_line(result: &ProbeRunResult) -> String {
        format!(
            "{} OK, {} AMBIGUOUS, {} UNMAPPED, {} INACTIVE_LAYER, coverage {}",
            result.totals.ok,
            result.totals.ambiguous,
            result.totals.unmapped,
            result.totals.inactive_layer,
            format_percent(result.coverage)
        )
    }
}

/// Console formatter for the CLI
pub struct CliFormatter;

impl CliFormatter {
    /// Per-layer box table
    pub fn format_layer_table(result: &ProbeRunResult) -> String {
        let mut output = String::new();

        output.push_str("\nLayers:\n");
        output.push_str("┌──────────────┬───────┬───────┬───────────────────┐\n");
        output.push_str("│ Layer        │ Total │ OK    │ Status            │\n");
        output.push_str("├──────────────┼───────┼───────┼───────────────────┤\n");

        for layer in &result.layer_summary {
            output.push_str(&format!(
                "│ {:<12} │ {:>5} │ {:>5} │ {:<17} │\n",
                truncate(&layer.layer, 12),
                layer.total,
                layer.ok,
                layer.status.as_str()
            ));
        }

        output.push_str("└──────────────┴───────┴───────┴───────────────────┘\n");
        output
    }

    /// Closing banner with the one-line summary
    pub fn format_completion(result: &ProbeRunResult) -> String {
        let mut output = String::new();
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        output.push_str(&format!("Scope: {}  Root: {}\n", result.scope, result.root));
        output.push_str(&SummaryFormatter::format_one_line(result));
        output.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        output
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}

fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn format_item_row(item: &MappingItem) -> String {
    let props = if item.changed_properties.is_empty() {
        "-".to_string()
    } else {
        item.changed_properties.join(", ")
    };
    format!(
        "| {} | {} | {} | {} | {} |\n",
        item.element_id,
        item.best_path.as_deref().unwrap_or("-"),
        item.status,
        format_percent(item.confidence),
        props
    )
}

/// Status order first, then confidence descending
fn sorted_for_display(items: &[MappingItem]) -> Vec<&MappingItem> {
    let mut sorted: Vec<&MappingItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use themeprobe_common::model::LayerStatus;

    fn item(id: &str, status: MappingStatus, confidence: f64) -> MappingItem {
        MappingItem {
            element_id: id.to_string(),
            layer: "home".to_string(),
            best_path: (status == MappingStatus::Ok || status == MappingStatus::Ambiguous)
                .then(|| format!("/{}/color", id)),
            confidence,
            changed_properties: vec!["color".to_string()],
            candidates: vec![],
            status,
        }
    }

    fn sample_result() -> ProbeRunResult {
        ReportBuilder::build(
            "all",
            "[data-theme-root]",
            vec!["home".to_string()],
            vec![
                item("home-a", MappingStatus::Ok, 1.0),
                item("home-b", MappingStatus::Ambiguous, 0.5),
                item("home-c", MappingStatus::Unmapped, 0.0),
                item("lock-a", MappingStatus::InactiveLayer, 0.0),
            ],
            vec![
                LayerSummary {
                    layer: "home".to_string(),
                    total: 3,
                    ok: 1,
                    status: LayerStatus::Scanned,
                },
                LayerSummary {
                    layer: "lock".to_string(),
                    total: 0,
                    ok: 0,
                    status: LayerStatus::InactiveOrEmpty,
                },
            ],
        )
    }

    #[test]
    fn test_coverage_and_totals() {
        let result = sample_result();
        assert_eq!(result.totals.ok, 1);
        assert_eq!(result.totals.inactive_layer, 1);
        assert!((result.coverage - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run_has_zero_coverage() {
        let result = ReportBuilder::build("home", "#root", vec![], vec![], vec![]);
        assert_eq!(result.coverage, 0.0);
        assert_eq!(result.totals.total(), 0);
    }

    #[test]
    fn test_applied_mapping_keeps_ok_only() {
        let applied = AppliedMapping::from_result(&sample_result());
        assert_eq!(applied.items.len(), 1);
        assert_eq!(applied.items[0].id, "home-a");
        assert_eq!(applied.items[0].path, "/home-a/color");
        assert_eq!(applied.screen, "all");
    }

    #[test]
    fn test_summary_lists_problematic_elements() {
        let md = SummaryFormatter::format_summary(&sample_result());
        assert!(md.contains("# Theme Probe Mapping Summary: all"));
        assert!(md.contains("**Coverage**: 25.0%"));
        assert!(md.contains("| INACTIVE_LAYER | 1 |"));
        assert!(md.contains("## Problematic Elements (3)"));
        assert!(md.contains("| home | 3 | 1 | SCANNED |"));
        assert!(md.contains("| home-b | AMBIGUOUS | 50.0% | /home-b/color |"));
        assert!(md.contains("| lock | 0 | 0 | INACTIVE_OR_EMPTY |"));
    }

    #[test]
    fn test_cli_layer_table() {
        let table = CliFormatter::format_layer_table(&sample_result());
        assert!(table.contains("│ home         │     3 │     1 │ SCANNED           │"));
        assert!(table.contains("│ lock         │     0 │     0 │ INACTIVE_OR_EMPTY │"));
        assert_eq!(truncate("a-very-long-layer-name", 12).chars().count(), 12);
    }

    #[test]
    fn test_artifacts_render() {
        let artifacts = ReportArtifacts::render(&sample_result()).unwrap();
        let report: serde_json::Value = serde_json::from_str(&artifacts.report_json).unwrap();
        assert_eq!(report["items"].as_array().unwrap().len(), 4);
        assert_eq!(report["layerSummary"][1]["status"], "INACTIVE_OR_EMPTY");

        let names = ReportArtifacts::file_names("lock");
        assert_eq!(names[0], "mapping.lock.autogen.json");
        assert_eq!(names[2], "mapping.lock.summary.md");
    }
}
