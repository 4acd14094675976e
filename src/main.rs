mod api;
mod config;
mod error;
mod model;
mod prefs;
mod scan;
mod submit;
mod ui;
mod web;

use crate::api::TcClient;
use crate::config::AppConfig;
use crate::prefs::{FileStore, MemoryStore, PreferenceStore};
use crate::web::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Arc::new(AppConfig::from_env());

    tracing::info!(
        "Starting tc-console on {} (backend: {})",
        config.http_bind,
        config.api_base
    );

    let store: Arc<dyn PreferenceStore> = match FileStore::open(&config.preferences_path) {
        Ok(store) => {
            tracing::info!("Preferences stored in {}", store.path().display());
            Arc::new(store)
        }
        Err(err) => {
            tracing::warn!(
                "Unable to open preferences at {}, keeping them in memory: {err}",
                config.preferences_path.display()
            );
            Arc::new(MemoryStore::new())
        }
    };
    let client = TcClient::new(&config.api_base, config.backend_timeout)
        .context("unable to build backend client")?;

    let state = AppState::new(config.clone(), client, store);
    web::serve(state).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let _ = fmt().with_env_filter(env_filter).try_init();
}
