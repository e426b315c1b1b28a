//! Zonewatch host. Loads analysis plugins and keeps them resident.
//!
//! Main entry point that wires configuration, logging and the plugin
//! manager together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt};

use zonewatch_core::config::AppConfig;
use zonewatch_core::error::AppError;
use zonewatch_plugin::{PluginManager, PluginState};

/// Plugin manager shared between the host's tasks.
type SharedManager = Arc<Mutex<PluginManager>>;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path = std::env::var("ZONEWATCH_CONFIG").ok().map(PathBuf::from);
    AppConfig::load(config_path.as_deref())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main host run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Zonewatch v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(config);

    // ── Step 1: Discover and load plugins ────────────────────────
    tracing::info!(
        dir = %config.plugins.directory,
        load_plugins = config.plugins.load_plugins,
        "Initializing plugin system..."
    );
    let manager = {
        let config = Arc::clone(&config);
        tokio::task::spawn_blocking(move || {
            let mut manager = PluginManager::from_config(&config.plugins);
            refresh(&mut manager, &config);
            manager
        })
        .await
        .map_err(|e| AppError::internal(format!("Plugin initialisation failed: {}", e)))?
    };
    log_plugin_summary(&manager);

    let manager: SharedManager = Arc::new(Mutex::new(manager));

    // ── Step 2: Serve until shutdown, rescanning on SIGHUP ───────
    tracing::info!("Zonewatch host ready");
    wait_for_signals(&manager, &config).await;
    tracing::info!("Shutdown signal received, stopping");

    Ok(())
}

/// Rescans the plugin directory and reapplies the plugin settings file.
///
/// Identities seen before are not loaded again.
fn refresh(manager: &mut PluginManager, config: &AppConfig) {
    let report = manager.find_plugins(Path::new(&config.plugins.directory), false);
    if report.scan_error.is_some() {
        tracing::warn!("Plugin support disabled: directory unavailable");
    }

    if let Some(file) = config.plugins.config_file.as_deref() {
        if let Err(e) = manager.configure_plugins(Path::new(file), config.plugins.native_detection) {
            tracing::error!(file = %file, error = %e, "Plugin settings not applied");
        }
    }
}

fn log_plugin_summary(manager: &PluginManager) {
    for (identity, state) in manager.registry().states() {
        match state {
            PluginState::Registered => tracing::info!(plugin = %identity, "Plugin available"),
            PluginState::Discovered => tracing::info!(plugin = %identity, "Plugin discovered, not loaded"),
            PluginState::Failed(cause) => {
                tracing::warn!(plugin = %identity, cause = %cause, "Plugin unavailable")
            }
        }
    }
    tracing::info!(
        registered = manager.registry().loaded_count(),
        known = manager.registry().len(),
        "Plugin system initialized"
    );
}

/// Wait for Ctrl+C or SIGTERM; SIGHUP triggers a plugin rescan.
async fn wait_for_signals(manager: &SharedManager, config: &Arc<AppConfig>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut terminate, mut hangup) =
            match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
                (Ok(t), Ok(h)) => (t, h),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "Signal handlers unavailable, waiting for Ctrl+C");
                    ctrl_c().await;
                    return;
                }
            };

        loop {
            tokio::select! {
                _ = ctrl_c() => return,
                _ = terminate.recv() => return,
                _ = hangup.recv() => {
                    tracing::info!("SIGHUP received, rescanning plugins");
                    let mut guard = Arc::clone(manager).lock_owned().await;
                    let config = Arc::clone(config);
                    let rescanned = tokio::task::spawn_blocking(move || {
                        refresh(&mut guard, &config);
                        log_plugin_summary(&guard);
                    })
                    .await;
                    if let Err(e) = rescanned {
                        tracing::error!(error = %e, "Plugin rescan failed");
                    }
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (manager, config);
        ctrl_c().await;
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
