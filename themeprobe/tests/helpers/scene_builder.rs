//! Scene construction for tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use themeprobe::adapter::SharedThemeStore;
use themeprobe::config::ProbeOptions;
use themeprobe::scene::{SceneSpec, SceneSurface};
use themeprobe::transport::{context_pair, ContextEndpoint, ContextOpener, ListenerHandle, ProbeListener};
use themeprobe::ProbeEngine;

pub const ROOT: &str = "[data-theme-root]";

/// Fluent builder over the scene JSON format
pub struct SceneBuilder {
    root: String,
    initial_layer: Option<String>,
    programmatic_navigation: bool,
    theme: Value,
    layers: Vec<Value>,
}

impl SceneBuilder {
    /// Scene rooted at `[data-theme-root]` showing `home` initially
    pub fn new(theme: Value) -> Self {
        Self {
            root: ROOT.to_string(),
            initial_layer: Some("home".to_string()),
            programmatic_navigation: true,
            theme,
            layers: Vec::new(),
        }
    }

    pub fn root(mut self, selector: &str) -> Self {
        self.root = selector.to_string();
        self
    }

    pub fn initial_layer(mut self, layer: Option<&str>) -> Self {
        self.initial_layer = layer.map(str::to_string);
        self
    }

    pub fn without_programmatic_navigation(mut self) -> Self {
        self.programmatic_navigation = false;
        self
    }

    pub fn layer(mut self, name: &str, nav_control: Option<&str>, elements: Vec<Value>) -> Self {
        self.layers.push(json!({
            "name": name,
            "nav_control": nav_control,
            "elements": elements,
        }));
        self
    }

    pub fn build(self) -> SceneSpec {
        let scene = json!({
            "root": self.root,
            "initial_layer": self.initial_layer,
            "programmatic_navigation": self.programmatic_navigation,
            "theme": self.theme,
            "layers": self.layers,
        });
        SceneSpec::from_json_str(&scene.to_string()).expect("scene JSON")
    }
}

/// Visible element with `(property, template)` styles
pub fn element(id: &str, styles: &[(&str, &str)]) -> Value {
    let styles: serde_json::Map<String, Value> = styles
        .iter()
        .map(|(prop, template)| (prop.to_string(), Value::String(template.to_string())))
        .collect();
    json!({ "id": id, "styles": styles })
}

pub fn hidden_element(id: &str) -> Value {
    json!({ "id": id, "hidden": true })
}

/// Store, surface and engine wired over one scene
pub struct ProbeSetup {
    pub store: Arc<SharedThemeStore>,
    pub surface: Arc<SceneSurface>,
    pub engine: ProbeEngine,
}

pub fn probe_setup(spec: SceneSpec) -> ProbeSetup {
    probe_setup_with(spec, ProbeOptions::default())
}

pub fn probe_setup_with(spec: SceneSpec, options: ProbeOptions) -> ProbeSetup {
    let (store, surface) = SceneSurface::with_store(spec);
    let surface = Arc::new(surface);
    let engine = ProbeEngine::new(store.clone(), surface.clone(), options);
    ProbeSetup {
        store,
        surface,
        engine,
    }
}

/// Opens a new in-process context served by a fresh listener
pub struct ListenerOpener {
    engine: Arc<ProbeEngine>,
    pub handles: Mutex<Vec<ListenerHandle>>,
}

impl ListenerOpener {
    pub fn new(engine: Arc<ProbeEngine>) -> Self {
        Self {
            engine,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> usize {
        self.handles.lock().unwrap().len()
    }
}

#[async_trait]
impl ContextOpener for ListenerOpener {
    async fn open(&self) -> themeprobe::Result<ContextEndpoint> {
        let (local, remote) = context_pair();
        let handle = ProbeListener::new(self.engine.clone(), "test://popup").start(remote);
        self.handles.lock().unwrap().push(handle);
        Ok(local)
    }
}
