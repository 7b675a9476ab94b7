mod activity;
mod config;
mod errors;
mod guard;
mod ledger;
mod letter;
mod routes;
mod settings;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::letter::convert::ScriptConverter;
use crate::letter::mailer::SmtpMailer;
use crate::letter::render::DocxRenderer;
use crate::routes::build_router;
use crate::settings::validation::check_setup;
use crate::settings::SettingsStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting FINDint API v{}", env!("CARGO_PKG_VERSION"));
    info!("Base directory: {}", config.base_dir.display());

    let settings = SettingsStore::new(&config.settings_path);
    if settings.has_override().await {
        info!("Using settings from {}", settings.path().display());
    } else {
        info!(
            "No settings file at {}; using defaults",
            settings.path().display()
        );
    }

    let state = AppState {
        config: config.clone(),
        settings,
        renderer: Arc::new(DocxRenderer),
        converter: Arc::new(ScriptConverter),
        mailer: Arc::new(SmtpMailer),
        intermediate_lock: Arc::default(),
    };

    // Surface setup problems early; requests still re-check per call.
    match state.current_settings().await {
        Ok((current, paths)) => {
            for problem in check_setup(&current, &paths) {
                warn!("Setup: {problem}");
            }
        }
        Err(e) => warn!("Settings could not be loaded: {e}"),
    }

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
