use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tether_core::events::EventBus;
use tether_server::{register_builtin, AppState, HandlerContext, MessageHandlerRegistry, ServerConfig};
use tether_sessions::{spawn_sweeper, LifecycleConfig, SessionLifecycleManager, SessionRegistry};
use tether_settings::TetherSettings;
use tether_telemetry::TelemetryConfig;
use tokio_util::sync::CancellationToken;

/// Session routing daemon.
#[derive(Debug, Parser)]
#[command(name = "tether", version)]
struct Args {
    /// Settings file (defaults to ~/.tether/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Root directory for session artifact trees.
    #[arg(long)]
    sessions_dir: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// CLI flags win over file and environment.
    fn apply(&self, settings: &mut TetherSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = &self.sessions_dir {
            settings.sessions.root_dir.clone_from(dir);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }
}

fn lifecycle_config(settings: &TetherSettings) -> LifecycleConfig {
    let root = settings.sessions.resolved_root(&tether_settings::tether_home());
    LifecycleConfig {
        cleanup_after: Duration::from_secs(settings.sessions.cleanup_after_secs),
        development_auto_cleanup: settings.sessions.development_auto_cleanup,
        sweep_interval: Duration::from_secs(settings.sessions.sweep_interval_secs),
        ..LifecycleConfig::new(root)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => tether_settings::load_settings_from_path(path),
        None => tether_settings::load_settings(),
    }
    .context("failed to load settings")?;
    let mut settings = loaded.settings;
    args.apply(&mut settings);

    let telemetry = tether_telemetry::init_telemetry(TelemetryConfig::from_level_name(
        &settings.logging.level,
        settings.logging.json,
    ));
    // Settings load before the subscriber exists; report rejected values now.
    for warning in &loaded.warnings {
        tracing::warn!(key = %warning.key, value = %warning.value, "Invalid setting ignored");
    }
    tracing::info!("Starting tether daemon");

    let lifecycle = lifecycle_config(&settings);
    tokio::fs::create_dir_all(&lifecycle.root)
        .await
        .with_context(|| format!("failed to create {}", lifecycle.root.display()))?;
    tracing::info!(root = %lifecycle.root.display(), "Session root ready");

    let bus = EventBus::default();
    let _logger = tether_telemetry::spawn_event_logger(bus.subscribe());
    let _recorder = tether_telemetry::spawn_metrics_recorder(telemetry.metrics(), bus.subscribe());

    let sweep_interval = lifecycle.sweep_interval;
    let manager = Arc::new(SessionLifecycleManager::new(
        Arc::new(SessionRegistry::new()),
        bus,
        lifecycle,
    ));

    let cancel = CancellationToken::new();
    let mut sweeper = spawn_sweeper(Arc::clone(&manager), sweep_interval, cancel.clone());

    let registry = Arc::new(MessageHandlerRegistry::new());
    register_builtin(&registry).context("failed to register message handlers")?;

    let state = AppState {
        registry,
        ctx: Arc::new(HandlerContext::new(manager, telemetry.metrics())),
    };
    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
    };
    let handle = tether_server::start(config, state)
        .await
        .context("failed to start server")?;

    tracing::info!(port = handle.port(), "Tether daemon ready");

    let sweeper_done = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl+c")?;
            false
        }
        // The sweeper only returns early if it failed.
        joined = &mut sweeper => {
            match joined {
                Ok(()) => tracing::error!("Session sweeper exited unexpectedly"),
                Err(e) => tracing::error!(error = %e, "Session sweeper task failed"),
            }
            true
        }
    };

    tracing::info!("Shutting down");
    cancel.cancel();
    handle.shutdown().await;
    if sweeper_done {
        anyhow::bail!("session sweeper stopped, idle sessions would never be cleaned up");
    }
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "Session sweeper task failed");
    }
    Ok(())
}
