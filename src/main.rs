mod app;
mod charts;
mod color;
mod config;
mod data;
mod model;
mod state;
mod ui;

use app::Co2LensApp;
use config::Config;
use eframe::egui;
use state::{AppState, BaseData};

fn main() -> eframe::Result {
    env_logger::init();

    let cfg = Config::from_env();
    let mut state = AppState::default();
    match BaseData::load(&cfg) {
        Ok(base) => state.set_base(base),
        Err(e) => {
            // Open anyway; the top bar shows what went wrong and
            // File → Open can still load a table by hand.
            log::error!("startup load failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CO₂ Lens – Vehicle Emissions Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(Co2LensApp::new(state)))),
    )
}
