// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod engine;
mod frequency;
mod gui;
mod pattern;
mod serial_link;
mod spectrum;
mod sweep;
mod types;
mod visualizer;

use config::DashboardConfig;
use eframe::egui;

// 入口函数
fn main() -> eframe::Result<()> {
    env_logger::init();

    let config_path = DashboardConfig::default_path();
    let config = DashboardConfig::load_or_default(&config_path);
    log::info!(
        "pattern={} baud={} tick={}ms",
        config.pattern_path.display(),
        config.baud_rate,
        config.tick_ms
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title("RF Lab Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "RF Lab Dashboard",
        options,
        Box::new(move |cc| Box::new(gui::RfLabApp::new(cc, config, config_path))),
    )
}
