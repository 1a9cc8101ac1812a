//! Declarative scene surface
//!
//! A [`RenderSurface`] backed by a scene description instead of a browser.
//! Each element's computed styles are templates over theme paths, e.g.
//! `"color": "{/text/color}"` or `"font-size": "{/text/size}px"`, evaluated
//! against the live [`SharedThemeStore`] on every read.
//!
//! Layers are mutually exclusive: elements of inactive layers stay mounted
//! with a zero-size box, as a `display: none` screen would.

use crate::adapter::SharedThemeStore;
use crate::document::ThemeNode;
use crate::surface::{ElementInfo, RenderSurface, StyleMap};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const ELEMENT_WIDTH: f64 = 120.0;
const ELEMENT_HEIGHT: f64 = 24.0;

/// Scene file contents: theme document plus the UI built on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSpec {
    /// Selector of the root container (must match a configured candidate)
    pub root: String,

    /// Layer shown before any navigation
    #[serde(default)]
    pub initial_layer: Option<String>,

    /// Whether the UI exposes a programmatic navigate API
    #[serde(default = "default_true")]
    pub programmatic_navigation: bool,

    /// Theme document
    pub theme: serde_json::Value,

    pub layers: Vec<SceneLayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneLayer {
    pub name: String,

    /// Id of the control that switches to this layer
    #[serde(default)]
    pub nav_control: Option<String>,

    #[serde(default)]
    pub elements: Vec<SceneElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneElement {
    pub id: String,

    /// Rendered but `visibility: hidden`
    #[serde(default)]
    pub hidden: bool,

    /// Style property → value template
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl SceneSpec {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn element(&self, id: &str) -> Option<(&SceneLayer, &SceneElement)> {
        self.layers.iter().find_map(|layer| {
            layer
                .elements
                .iter()
                .find(|e| e.id == id)
                .map(|element| (layer, element))
        })
    }
}

/// Scene-driven render surface over a shared theme store
pub struct SceneSurface {
    spec: SceneSpec,
    store: Arc<SharedThemeStore>,
    active: RwLock<Option<String>>,
    removed: RwLock<HashSet<String>>,
}

impl SceneSurface {
    pub fn new(spec: SceneSpec, store: Arc<SharedThemeStore>) -> Self {
        let active = spec.initial_layer.clone();
        Self {
            spec,
            store,
            active: RwLock::new(active),
            removed: RwLock::new(HashSet::new()),
        }
    }

    /// Build the store from the scene's theme and the surface on top of it
    pub fn with_store(spec: SceneSpec) -> (Arc<SharedThemeStore>, Self) {
        let store = Arc::new(SharedThemeStore::from_json(spec.theme.clone()));
        let surface = Self::new(spec, store.clone());
        (store, surface)
    }

    /// Unmount an element, as if the UI dropped it
    pub async fn remove_element(&self, id: &str) {
        self.removed.write().await.insert(id.to_string());
    }

    fn has_layer(&self, name: &str) -> bool {
        self.spec.layers.iter().any(|l| l.name == name)
    }
}

#[async_trait]
impl RenderSurface for SceneSurface {
    async fn has_root(&self, selector: &str) -> bool {
        self.spec.root == selector
    }

    async fn active_layer(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    async fn navigate(&self, layer: &str) -> Result<bool> {
        if !self.spec.programmatic_navigation {
            return Ok(false);
        }
        if self.has_layer(layer) {
            debug!(layer, "Scene navigated");
            *self.active.write().await = Some(layer.to_string());
        }
        Ok(true)
    }

    async fn trigger_control(&self, control_id: &str) -> Result<bool> {
        let target = self
            .spec
            .layers
            .iter()
            .find(|l| l.nav_control.as_deref() == Some(control_id));

        match target {
            Some(layer) => {
                debug!(control_id, layer = %layer.name, "Scene control triggered");
                *self.active.write().await = Some(layer.name.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn query_elements(&self, root: &str, prefixes: &[String]) -> Vec<ElementInfo> {
        if root != self.spec.root {
            return Vec::new();
        }
        let active = self.active.read().await.clone();
        let removed = self.removed.read().await;

        let mut found = Vec::new();
        for layer in &self.spec.layers {
            let mounted = active.as_deref() == Some(layer.name.as_str());
            for element in &layer.elements {
                if removed.contains(&element.id)
                    || !prefixes.iter().any(|p| element.id.starts_with(p.as_str()))
                {
                    continue;
                }
                let (width, height) = if mounted {
                    (ELEMENT_WIDTH, ELEMENT_HEIGHT)
                } else {
                    (0.0, 0.0)
                };
                found.push(ElementInfo {
                    id: element.id.clone(),
                    width,
                    height,
                    visibility: if element.hidden { "hidden" } else { "visible" }.to_string(),
                });
            }
        }
        found
    }

    async fn computed_style(&self, element_id: &str, properties: &[String]) -> Option<StyleMap> {
        if self.removed.read().await.contains(element_id) {
            return None;
        }
        let (_, element) = self.spec.element(element_id)?;
        let document = self.store.snapshot().await;

        let styles = properties
            .iter()
            .map(|prop| {
                let value = element
                    .styles
                    .get(prop)
                    .map(|template| render_template(template, &document))
                    .unwrap_or_default();
                (prop.clone(), value)
            })
            .collect();
        Some(styles)
    }

    async fn next_frame(&self) {
        tokio::task::yield_now().await;
    }
}

/// Substitute every `{/path}` placeholder with the scalar at that path
///
/// Unknown paths render as the empty string. An unterminated brace is kept
/// verbatim.
pub fn render_template(template: &str, document: &ThemeNode) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                if let Some(value) = document.scalar_at(&after[..close]) {
                    out.push_str(&value.to_string());
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ThemeAdapter;
    use serde_json::json;

    fn scene() -> SceneSpec {
        SceneSpec::from_json_str(
            &json!({
                "root": "[data-theme-root]",
                "initial_layer": "home",
                "programmatic_navigation": false,
                "theme": { "text": { "color": "#222222", "size": 14 } },
                "layers": [
                    {
                        "name": "home",
                        "nav_control": "nav-home",
                        "elements": [
                            { "id": "home-title", "styles": {
                                "color": "{/text/color}",
                                "font-size": "{/text/size}px"
                            }},
                            { "id": "home-ghost", "hidden": true }
                        ]
                    },
                    {
                        "name": "lock",
                        "nav_control": "nav-lock",
                        "elements": [ { "id": "lock-button" } ]
                    }
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_template() {
        let doc = ThemeNode::from(json!({ "a": { "color": "#111", "w": 2 } }));
        assert_eq!(render_template("{/a/color}", &doc), "#111");
        assert_eq!(render_template("{/a/w}px solid {/a/color}", &doc), "2px solid #111");
        assert_eq!(render_template("{/missing}", &doc), "");
        assert_eq!(render_template("plain", &doc), "plain");
        assert_eq!(render_template("open {brace", &doc), "open {brace");
    }

    #[tokio::test]
    async fn test_styles_follow_store() {
        let (store, surface) = SceneSurface::with_store(scene());
        let props = vec!["color".to_string(), "font-size".to_string(), "opacity".to_string()];

        let before = surface.computed_style("home-title", &props).await.unwrap();
        assert_eq!(before["color"], "#222222");
        assert_eq!(before["font-size"], "14px");
        assert_eq!(before["opacity"], "");

        store.set_scalar("/text/color", "rgb(1, 2, 3)".into()).await.unwrap();
        let after = surface.computed_style("home-title", &props).await.unwrap();
        assert_eq!(after["color"], "rgb(1, 2, 3)");

        surface.remove_element("home-title").await;
        assert!(surface.computed_style("home-title", &props).await.is_none());
    }

    #[tokio::test]
    async fn test_inactive_layer_elements_have_no_box() {
        let (_store, surface) = SceneSurface::with_store(scene());
        let prefixes = vec!["home-".to_string(), "lock-".to_string()];

        let elements = surface.query_elements("[data-theme-root]", &prefixes).await;
        let visible: Vec<&str> = elements
            .iter()
            .filter(|e| e.is_visible())
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(elements.len(), 3);
        assert_eq!(visible, vec!["home-title"]);

        assert!(surface.query_elements(".other-root", &prefixes).await.is_empty());
    }

    #[tokio::test]
    async fn test_navigation_by_control_only() {
        let (_store, surface) = SceneSurface::with_store(scene());

        assert!(!surface.navigate("lock").await.unwrap());
        assert!(!surface.trigger_control("nav-settings").await.unwrap());
        assert!(surface.trigger_control("nav-lock").await.unwrap());
        assert_eq!(surface.active_layer().await.as_deref(), Some("lock"));
    }
}
