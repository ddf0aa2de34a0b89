#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod error;
mod io;
mod model;
mod sync;
mod ui;

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{BoardConfig, SettingsFile};
use io::HttpGateway;
use sync::MutationEngine;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kanban_board=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let settings_file = SettingsFile::locate();
    let settings = settings_file.load();
    let config = BoardConfig::from_env(&settings).context("Invalid configuration")?;
    tracing::info!(
        api_url = %config.api_url,
        timeout_secs = config.request_timeout.as_secs(),
        settings = ?settings_file.path(),
        "Loaded board configuration"
    );

    // --- Remote API ---
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("board-io")
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let gateway = HttpGateway::new(&config.api_url, config.request_timeout)
        .context("Failed to build HTTP client")?;
    let engine = MutationEngine::new(
        Arc::new(gateway),
        runtime.handle().clone(),
        config.search_debounce,
    );

    // --- Window ---
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 760.0])
            .with_min_inner_size([900.0, 480.0])
            .with_title("Kanban Board"),
        ..Default::default()
    };

    eframe::run_native(
        "Kanban Board",
        options,
        Box::new(move |cc| Ok(Box::new(app::BoardApp::new(cc, engine, settings_file, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {e}"))?;

    tracing::info!("Window closed, shutting down");
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    Ok(())
}
