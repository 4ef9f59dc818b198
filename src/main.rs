//! DLC Manager - command-line entry point.
//!
//! # Overview
//!
//! Loads the world-book snapshot named in the configuration, groups its
//! entries into toggle options, cross-references cores with the remote
//! classification and logs what it found. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + optional console output)
//! - The snapshot registry and remote catalog
//! - State management ([`StateManager`]) driven by a [`SessionController`]
//!
//! # Usage
//!
//! ```text
//! dlc-manager [config-dir]
//! ```
//!
//! `config-dir` defaults to `DLC Manager Data` and holds `DLC Manager.yaml`;
//! relative paths inside it resolve against that directory.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use dlc_manager::catalog::{DataSource, FetchError, RemoteCatalog};
use dlc_manager::metrics::Metrics;
use dlc_manager::services::DlcService;
use dlc_manager::{
    APP_NAME, Category, ConfigManager, SessionController, SnapshotRegistry, StateManager, VERSION,
};
use std::sync::Arc;

const DEFAULT_CONFIG_DIR: &str = "DLC Manager Data";

/// Stand-in data source when the HTTP client cannot be built; every document
/// reads as missing so cores land in the uncategorized tab.
struct OfflineSource;

#[async_trait::async_trait]
impl DataSource for OfflineSource {
    async fn fetch(&self, _file: &str) -> Result<Option<String>, FetchError> {
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_dir = std::env::args()
        .nth(1)
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_DIR));

    let config_manager = ConfigManager::new(&config_dir)?;
    let config = config_manager.load_config()?;

    // Held until exit so buffered log lines are flushed
    let _guard = dlc_manager::logging::setup_logging(config_manager.config_dir(), &config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let snapshot_path = config_manager.resolve(&config.registry.snapshot_path);
    let registry = SnapshotRegistry::open(&snapshot_path)
        .await
        .with_context(|| format!("Failed to open world-book snapshot: {}", snapshot_path))?;

    let catalog = match RemoteCatalog::http(&config.remote) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!("Remote data unavailable, continuing offline: {}", e);
            RemoteCatalog::new(Arc::new(OfflineSource))
        }
    };

    let metrics = Arc::new(Metrics::new());
    let state_manager = Arc::new(StateManager::new().with_metrics(Arc::clone(&metrics)));
    let service = DlcService::new(Arc::new(registry), Arc::clone(&metrics));
    let controller = SessionController::new(state_manager, service, catalog);

    controller.reload().await?;

    let state = controller.state().snapshot();
    tracing::info!(
        "World book: {}",
        state.book_name.as_deref().unwrap_or("<none>")
    );
    for category in Category::ALL {
        tracing::info!(
            "{}: {} options, {} enabled",
            category,
            state.option_count(category),
            state.enabled_count(category)
        );
    }
    if let Some(core) = state.selected_core() {
        tracing::info!("Active core: {}", core);
    }
    for special in state.special_recommend.iter().filter(|s| s.available) {
        tracing::info!("Special recommend: {} ({})", special.label, special.special_note);
    }

    metrics.log_summary();
    tracing::info!("{} finished", APP_NAME);

    Ok(())
}
