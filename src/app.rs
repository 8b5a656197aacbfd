use eframe::egui;

use crate::state::{AppState, Tab};
use crate::ui::{panels, predict};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct Co2LensApp {
    pub state: AppState,
}

impl Co2LensApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for Co2LensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + tab strip ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.state.tab, Tab::Explore, "📊 Data exploration");
                ui.selectable_value(&mut self.state.tab, Tab::Predict, "🧠 CO\u{2082} prediction");
            });
        });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Explore => panels::explore_view(ui, &mut self.state),
            Tab::Predict => predict::predict_view(ui, &mut self.state),
        });
    }
}
