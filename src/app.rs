use eframe::egui;

use crate::state::{AppState, Variant};
use crate::ui::{map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct HousingApp {
    pub state: AppState,
}

impl HousingApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for HousingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // Missing resources: nothing else renders.
        if let Some(message) = self.state.fatal.clone() {
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::fatal_panel(ui, &message);
            });
            return;
        }

        match self.state.variant {
            Variant::CountyMap => {
                // ---- Left side panel: form ----
                egui::SidePanel::left("form_panel")
                    .default_width(340.0)
                    .resizable(true)
                    .show(ctx, |ui| {
                        panels::form_panel(ui, &mut self.state);
                    });

                // ---- Central panel: map ----
                egui::CentralPanel::default().show(ctx, |ui| {
                    map::county_map(ui, &mut self.state);
                });
            }
            Variant::Manual | Variant::County => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    panels::form_panel(ui, &mut self.state);
                });
            }
        }
    }
}
