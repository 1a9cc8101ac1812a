//! Configuration loading and config file resolution
//!
//! Probe settings come from a TOML file. The file is located in priority order:
//! 1. Explicit path (command-line argument)
//! 2. Environment variable (`THEMEPROBE_CONFIG`)
//! 3. User config directory, then system config (Linux only)
//! 4. None: compiled defaults are used
//!
//! A missing file is not an error. A file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "THEMEPROBE_CONFIG";

/// Probe configuration loaded from TOML
///
/// Every field has a built-in default, so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Computed style properties observed on every candidate element
    #[serde(default = "default_style_properties")]
    pub style_properties: Vec<String>,

    /// Properties that earn a magnitude bonus when they change
    #[serde(default = "default_key_properties")]
    pub key_properties: Vec<String>,

    /// Number of scalar paths per progress batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Animation frames to wait after activation, mutation and restoration
    #[serde(default = "default_wait_frames")]
    pub wait_frames: u32,

    /// Upper bound on a single frame wait before falling back to a timer
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,

    /// Confidence above which a multi-hit element is still considered OK
    #[serde(default = "default_ok_threshold")]
    pub ok_threshold: f64,

    /// Handshake timeout (PING → READY)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Run timeout (RUN → RESULT)
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,

    /// Origin the listener declares in READY replies
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Root container candidates, tried in order
    #[serde(default = "default_root_candidates")]
    pub root_candidates: Vec<String>,

    /// Known layers, in scan order for the `all` scope
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerConfig>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One navigable layer (screen) of the target application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,

    /// Element id prefixes owned by this layer (default `"<name>-"`)
    #[serde(default)]
    pub id_prefixes: Vec<String>,

    /// Navigation control ids to trigger (default `nav-<name>`, `tab-<name>`)
    #[serde(default)]
    pub nav_controls: Vec<String>,
}

impl LayerConfig {
    /// Layer following the `"<name>-*"` ownership convention
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id_prefixes: Vec::new(),
            nav_controls: Vec::new(),
        }
    }

    pub fn with_prefixes(name: &str, prefixes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            id_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            nav_controls: Vec::new(),
        }
    }

    /// Prefixes with the naming convention applied when none are configured
    pub fn effective_prefixes(&self) -> Vec<String> {
        if self.id_prefixes.is_empty() {
            vec![format!("{}-", self.name)]
        } else {
            self.id_prefixes.clone()
        }
    }

    /// Navigation control candidates with the naming convention applied
    pub fn effective_nav_controls(&self) -> Vec<String> {
        if self.nav_controls.is_empty() {
            vec![format!("nav-{}", self.name), format!("tab-{}", self.name)]
        } else {
            self.nav_controls.clone()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_style_properties() -> Vec<String> {
    [
        "color",
        "background-color",
        "border-color",
        "outline-color",
        "fill",
        "stroke",
        "font-size",
        "font-weight",
        "opacity",
        "box-shadow",
        "text-shadow",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_key_properties() -> Vec<String> {
    ["color", "background-color", "fill", "stroke"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_batch_size() -> usize {
    20
}

fn default_wait_frames() -> u32 {
    2
}

fn default_frame_timeout_ms() -> u64 {
    50
}

fn default_ok_threshold() -> f64 {
    0.8
}

fn default_connect_timeout_ms() -> u64 {
    15_000
}

fn default_run_timeout_ms() -> u64 {
    60_000
}

fn default_origin() -> String {
    "themeprobe://preview".to_string()
}

fn default_root_candidates() -> Vec<String> {
    [
        "[data-theme-root]",
        "[data-testid=\"theme-preview\"]",
        ".theme-preview",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig::with_prefixes("home", &["home-", "action-", "header-"]),
        LayerConfig::with_prefixes("lock", &["lock-", "unlock-"]),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            style_properties: default_style_properties(),
            key_properties: default_key_properties(),
            batch_size: default_batch_size(),
            wait_frames: default_wait_frames(),
            frame_timeout_ms: default_frame_timeout_ms(),
            ok_threshold: default_ok_threshold(),
            connect_timeout_ms: default_connect_timeout_ms(),
            run_timeout_ms: default_run_timeout_ms(),
            origin: default_origin(),
            root_candidates: default_root_candidates(),
            layers: default_layers(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ProbeConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file path
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded probe configuration from {:?}", path);
        Ok(config)
    }

    /// Resolve the config file and load it, falling back to compiled defaults
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_file(cli_arg) {
            Some(path) => Self::load_file(&path),
            None => {
                warn!("No probe config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Look up a configured layer by name
    pub fn layer(&self, name: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.ok_threshold) {
            return Err(Error::Config(format!(
                "ok_threshold must be within 0.0-1.0, got {}",
                self.ok_threshold
            )));
        }
        if self.style_properties.is_empty() {
            return Err(Error::Config("style_properties must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Locate the config file following the priority order in the module docs
///
/// Returns `None` when no candidate exists.
pub fn resolve_config_file(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config, then system config
    let user_config = dirs::config_dir().map(|d| d.join("themeprobe").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/themeprobe/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
