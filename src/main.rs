//! Menu500 Tracker - taskbar lunch menu overlay
//!
//! Startup sequence:
//! - File logging next to the executable
//! - Configuration from the user data directory
//! - Run-at-login registration
//! - Menu fetcher on its own thread
//! - Taskbar widget and the Win32 message loop

#![windows_subsystem = "windows"]

use std::sync::Arc;

use anyhow::{Context, Result};

use menu500_tracker::{config, fetch::MenuFetchService, logging, startup};

fn main() -> Result<()> {
    let config = config::load_config();
    let _log_guard = logging::init(config.debug_logging);

    tracing::info!("Menu500 Tracker {} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Config: {:?}", config);

    if config.start_with_windows {
        startup::ensure_enabled();
    }

    let service = Arc::new(MenuFetchService::new(config.menu_url.clone(), config.refresh_interval()));

    let result = run(&config, service.clone());
    if let Err(e) = &result {
        tracing::error!("Fatal: {:#}", e);
    }

    service.dispose();
    tracing::info!("Menu500 Tracker exiting");
    result
}

#[cfg(windows)]
fn run(config: &config::OverlayConfig, service: Arc<MenuFetchService>) -> Result<()> {
    use menu500_tracker::host::widget::{run_message_loop, OverlayWidget};

    let mut widget = OverlayWidget::new(config.clone(), service.clone());
    widget.initialize().context("Failed to initialize taskbar widget")?;

    service.start();
    tracing::info!("Entering message loop");
    run_message_loop();

    widget.dispose();
    Ok(())
}

#[cfg(not(windows))]
fn run(_config: &config::OverlayConfig, _service: Arc<MenuFetchService>) -> Result<()> {
    tracing::warn!("The taskbar overlay is only available on Windows");
    Ok(())
}
