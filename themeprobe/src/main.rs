//! Theme Probe (themeprobe) - Main entry point
//!
//! Runs a complete probe scan against a scene file offline: the scene's theme
//! document is loaded into an in-memory store, its layers and elements become
//! the render surface, and the scan is driven through a bridge/listener pair
//! exactly as it would be across two contexts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use themeprobe::config::{ConfigOverrides, ProbeOptions, SCOPE_ALL};
use themeprobe::engine::{ProbeEngine, ProbeProgress};
use themeprobe::report::{CliFormatter, ReportArtifacts};
use themeprobe::scene::{SceneSpec, SceneSurface};
use themeprobe::transport::{context_pair, ProbeBridge, ProbeListener};
use themeprobe_common::config::ProbeConfig;
use themeprobe_common::model::ProbeRunResult;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for themeprobe
#[derive(Parser, Debug)]
#[command(name = "themeprobe")]
#[command(about = "Discover which theme fields drive which UI elements")]
#[command(version)]
struct Args {
    /// Scene file: theme document plus layers and elements (JSON)
    #[arg(short, long, env = "THEMEPROBE_SCENE")]
    scene: PathBuf,

    /// Layer to probe, or "all"
    #[arg(long, default_value = SCOPE_ALL, env = "THEMEPROBE_SCOPE")]
    scope: String,

    /// Directory for the exported artifacts
    #[arg(short, long, default_value = ".", env = "THEMEPROBE_OUT")]
    out: PathBuf,

    /// Probe configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to wait after each mutation and restore
    #[arg(long, env = "THEMEPROBE_WAIT_FRAMES")]
    wait_frames: Option<u32>,

    /// Paths per progress batch
    #[arg(long, env = "THEMEPROBE_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Handshake timeout in milliseconds
    #[arg(long, env = "THEMEPROBE_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: Option<u64>,

    /// Run timeout in milliseconds
    #[arg(long, env = "THEMEPROBE_RUN_TIMEOUT_MS")]
    run_timeout_ms: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            wait_frames: self.wait_frames,
            batch_size: self.batch_size,
            connect_timeout_ms: self.connect_timeout_ms,
            run_timeout_ms: self.run_timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config comes first so its logging level can seed the filter
    let config = ProbeConfig::load(args.config.as_deref()).context("Failed to load probe configuration")?;
    let config = args.overrides().apply(config);

    // Initialize tracing
    let default_filter = format!(
        "themeprobe={level},themeprobe_common={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting theme probe: scene={}, scope={}", args.scene.display(), args.scope);

    let spec = SceneSpec::load(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    let (store, surface) = SceneSurface::with_store(spec);

    let engine = ProbeEngine::new(store, Arc::new(surface), ProbeOptions::from(&config))
        .with_progress(Arc::new(|p: &ProbeProgress| {
            debug!(layer = %p.layer, "[{}/{}] {}", p.index + 1, p.total, p.path);
        }));

    // Rendering side and controller side of one in-process link
    let (controller_end, preview_end) = context_pair();
    let listener = ProbeListener::from_config(Arc::new(engine), &config).start(preview_end);
    let bridge = ProbeBridge::from_config(controller_end, &config);

    let outcome = tokio::select! {
        outcome = run_probe(&bridge, &args.scope) => Some(outcome),
        _ = shutdown_signal() => None,
    };

    // Waits for an in-flight run so the document is always restored
    listener.stop().await;

    let result = match outcome {
        Some(result) => result?,
        None => {
            warn!("Probe run interrupted, no artifacts written");
            return Ok(());
        }
    };

    write_artifacts(&result, &args.out)?;
    print!("{}", CliFormatter::format_layer_table(&result));
    print!("{}", CliFormatter::format_completion(&result));

    info!("Theme probe complete");
    Ok(())
}

async fn run_probe(bridge: &ProbeBridge, scope: &str) -> Result<ProbeRunResult> {
    let origin = bridge.connect().await.context("Probe listener unreachable")?;
    info!("Probe listener ready at {}", origin);

    bridge
        .run(scope)
        .await
        .with_context(|| format!("Probe run for '{}' failed", scope))
}

fn write_artifacts(result: &ProbeRunResult, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let artifacts = ReportArtifacts::render(result).context("Failed to render report")?;
    let [applied, report, summary] = ReportArtifacts::file_names(&result.scope);

    for (name, content) in [
        (applied, &artifacts.applied_json),
        (report, &artifacts.report_json),
        (summary, &artifacts.summary_md),
    ] {
        let path = out_dir.join(&name);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    Ok(())
}

/// Ctrl+C / SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, abandoning probe run");
        },
        _ = terminate => {
            info!("Received terminate signal, abandoning probe run");
        },
    }
}
