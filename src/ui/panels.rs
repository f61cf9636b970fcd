use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Slider, Ui};
use egui_extras::{Column, TableBuilder};

use crate::config::Config;
use crate::data::model::ModelInputRow;
use crate::state::{AppState, CountyForm, Variant};

// ---------------------------------------------------------------------------
// Input form
// ---------------------------------------------------------------------------

/// Render the form of the active variant, the submit button and the result.
pub fn form_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Housing price prediction");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match state.variant {
                Variant::Manual => manual_form(ui, state),
                Variant::County | Variant::CountyMap => county_form(ui, state),
            }

            ui.add_space(8.0);
            if ui.button(RichText::new("Predict price").strong()).clicked() {
                state.submit();
            }
            ui.add_space(8.0);

            result_section(ui, state);
        });
}

fn county_form(ui: &mut Ui, state: &mut AppState) {
    ui.strong("County");
    let current = state.county_form.county.clone();
    let mut chosen = None;
    egui::ComboBox::from_id_salt("county")
        .selected_text(&current)
        .width(ui.available_width() * 0.9)
        .show_ui(ui, |ui: &mut Ui| {
            for name in &state.counties {
                if ui.selectable_label(current == *name, name).clicked() {
                    chosen = Some(name.clone());
                }
            }
        });
    if let Some(name) = chosen {
        state.select_county(&name);
    }

    ui.add_space(4.0);
    ui.strong("Property age");
    ui.add(
        DragValue::new(&mut state.county_form.housing_median_age)
            .range(CountyForm::AGE_RANGE)
            .speed(1.0)
            .fixed_decimals(0),
    );

    ui.add_space(4.0);
    ui.strong("Median income (thousands of US$)");
    ui.add(
        Slider::new(&mut state.county_form.median_income, CountyForm::INCOME_RANGE)
            .step_by(CountyForm::INCOME_STEP),
    );
}

fn manual_form(ui: &mut Ui, state: &mut AppState) {
    let form = &mut state.manual_form;
    egui::Grid::new("manual_form")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            number_row(ui, "Longitude", &mut form.longitude, -180.0..=180.0, 4);
            number_row(ui, "Latitude", &mut form.latitude, -90.0..=90.0, 4);
            number_row(ui, "Property age", &mut form.housing_median_age, 1.0..=50.0, 0);
            number_row(ui, "Total rooms", &mut form.total_rooms, 1.0..=f64::MAX, 0);
            number_row(ui, "Total bedrooms", &mut form.total_bedrooms, 0.0..=f64::MAX, 0);
            number_row(ui, "Population", &mut form.population, 0.0..=f64::MAX, 0);
            number_row(ui, "Households", &mut form.households, 1.0..=f64::MAX, 0);
            number_row(
                ui,
                "Median income (tens of thousands)",
                &mut form.median_income,
                0.0..=20.0,
                2,
            );

            ui.label("Ocean proximity");
            egui::ComboBox::from_id_salt("ocean_proximity")
                .selected_text(&form.ocean_proximity)
                .show_ui(ui, |ui: &mut Ui| {
                    for category in &state.ocean_categories {
                        ui.selectable_value(&mut form.ocean_proximity, category.clone(), category);
                    }
                });
            ui.end_row();
        });
}

fn number_row(
    ui: &mut Ui,
    label: &str,
    value: &mut f64,
    range: std::ops::RangeInclusive<f64>,
    decimals: usize,
) {
    ui.label(label);
    ui.add(DragValue::new(value).range(range).fixed_decimals(decimals));
    ui.end_row();
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

fn result_section(ui: &mut Ui, state: &AppState) {
    if let Some(prediction) = &state.prediction {
        ui.label("Predicted price:");
        ui.label(RichText::new(prediction.amount.to_string()).size(26.0).strong());
        ui.add_space(6.0);
        egui::CollapsingHeader::new("Model input")
            .default_open(false)
            .show(ui, |ui: &mut Ui| row_table(ui, &prediction.row));
    }

    if let Some((message, row)) = &state.prediction_error {
        ui.label(RichText::new(format!("Error: {message}")).color(Color32::RED));
        if let Some(row) = row {
            egui::CollapsingHeader::new("Submitted row")
                .default_open(true)
                .show(ui, |ui: &mut Ui| row_table(ui, row));
        }
    }
}

/// Two-column table of the row handed to the model.
fn row_table(ui: &mut Ui, row: &ModelInputRow) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(160.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Column");
            });
            header.col(|ui| {
                ui.strong("Value");
            });
        })
        .body(|mut body| {
            for (name, value) in row.features() {
                body.row(18.0, |mut r| {
                    r.col(|ui| {
                        ui.label(name);
                    });
                    r.col(|ui| {
                        ui.label(value.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open config…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for variant in Variant::ALL {
            if ui
                .selectable_label(state.variant == variant, variant.label())
                .clicked()
            {
                state.set_variant(variant);
            }
        }

        ui.separator();

        if state.store.is_some() {
            ui.label(format!("{} counties", state.counties.len()));
        }
    });
}

/// Full-window message shown while resources are unavailable.
pub fn fatal_panel(ui: &mut Ui, message: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(
            RichText::new(format!("Data unavailable\n\n{message}\n\nFile → Open config…"))
                .color(Color32::RED),
        );
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open configuration")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match Config::from_file(&path) {
            Ok(config) => state.reload(config),
            Err(e) => {
                log::error!("Failed to read config: {e:#}");
                state.fatal = Some(format!("{e:#}"));
                state.store = None;
            }
        }
    }
}
