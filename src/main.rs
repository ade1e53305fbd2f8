//! TasteCheck - how good is your music taste?
//!
//! Main entry point for the desktop client.

use anyhow::{Context, Result};
use eframe::egui;
use tastecheck::api::HttpTasteService;
use tastecheck::config::ClientConfig;
use tastecheck::orchestrator::Controller;
use tastecheck::testconfig::TestConfig;
use tastecheck::ui::TasteApp;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tastecheck=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TasteCheck");

    let test_config = parse_test_config()?;
    let config = ClientConfig::discover().context("loading configuration")?;
    info!("Using server {}", config.base_url());

    let service = HttpTasteService::new(&config).context("creating HTTP client")?;
    let (controller, handle) =
        Controller::new(config.clone(), service).context("creating controller")?;
    let _threads = controller.start().context("starting controller")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 900.0])
            .with_min_inner_size([480.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("TasteCheck"),
        ..Default::default()
    };

    eframe::run_native(
        "TasteCheck",
        options,
        Box::new(move |cc| Ok(Box::new(TasteApp::new(cc, handle, config, test_config)))),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {}", e))
}

/// Load `--test-config <file>` if given
fn parse_test_config() -> Result<Option<TestConfig>> {
    let args: Vec<String> = std::env::args().collect();
    let Some(index) = args.iter().position(|a| a == "--test-config") else {
        return Ok(None);
    };
    let path = args
        .get(index + 1)
        .context("--test-config needs a file argument")?;
    let config = TestConfig::load(path).map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("[TEST] Running scenario from {}", path);
    Ok(Some(config))
}
