mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::HousingApp;
use config::Config;
use data::store::ResourceStore;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let state = match Config::discover() {
        Ok(config) => AppState::from_store(ResourceStore::open(config)),
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            AppState {
                fatal: Some(format!("{e:#}")),
                ..AppState::default()
            }
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Housing Price Prediction",
        options,
        Box::new(|_cc| Ok(Box::new(HousingApp::new(state)))),
    )
}
