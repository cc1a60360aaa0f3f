use anyhow::Result;
use eframe::egui;
use log::info;

mod camera;
mod config;
mod errors;
mod gallery;
mod notify;
mod overlay;
mod printer;
mod session;
mod storage;
mod timelapse;
mod ui;

use crate::config::Config;
use crate::ui::PhotoboxApp;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting Photobox");

    // Load configuration
    let config = Config::load()?;
    config.validate()?;
    config.create_directories()?;
    info!(
        "Configured for {} photos per session (~{}s), timelapse {}",
        config.session.quota,
        config.session_duration_secs(),
        if config.timelapse.enabled { "on" } else { "off" }
    );

    let width = config.display.width as f32;
    let height = config.display.height as f32;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([width, height])
            .with_fullscreen(config.display.fullscreen)
            .with_decorations(!config.display.fullscreen),
        ..Default::default()
    };

    info!("Launching GUI application...");

    eframe::run_native(
        "Photobox",
        options,
        Box::new(|cc| {
            // Setup egui style for the booth touch interface
            setup_kiosk_style(&cc.egui_ctx);

            Box::new(PhotoboxApp::new(config))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))?;

    info!("Application shut down gracefully");
    Ok(())
}

fn setup_kiosk_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    // Larger UI elements for touch interaction
    style.spacing.button_padding = egui::vec2(16.0, 12.0);
    style.spacing.item_spacing = egui::vec2(12.0, 8.0);
    style.spacing.combo_width = 240.0;

    // Larger text for better readability from arm's length
    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::new(18.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Body,
        egui::FontId::new(16.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::new(26.0, egui::FontFamily::Proportional),
    );

    ctx.set_style(style);
}
