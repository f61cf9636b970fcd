use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Plot, PlotBounds, PlotPoints, Polygon};

use crate::color::{LayerStyle, TOOLTIP_BG};
use crate::data::geometry::MapFeature;
use crate::state::AppState;

/// Degrees shown around the selected county when the view is recentred.
const VIEW_HALF_WIDTH: f64 = 4.0;
const VIEW_HALF_HEIGHT: f64 = 3.0;

// ---------------------------------------------------------------------------
// County map (central panel)
// ---------------------------------------------------------------------------

/// Render every county plus the highlighted selection.
pub fn county_map(ui: &mut Ui, state: &mut AppState) {
    state.ensure_map_layer();

    let layer = match &state.map_layer {
        Some(Ok(layer)) => layer,
        Some(Err(e)) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(format!("Map unavailable: {e}")).color(Color32::RED));
            });
            return;
        }
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No county data loaded");
            });
            return;
        }
    };

    let selected = state.county_form.county.as_str();
    let hovered = state.hovered_county.as_deref();
    let recenter = state
        .recenter_map
        .then(|| state.selected_center())
        .flatten();

    let base = LayerStyle::base();
    let highlight = LayerStyle::selected();

    let response = Plot::new("county_map")
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show_x(false)
        .show_y(false)
        .show(ui, |plot_ui| {
            if let Some((lon, lat)) = recenter {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [lon - VIEW_HALF_WIDTH, lat - VIEW_HALF_HEIGHT],
                    [lon + VIEW_HALF_WIDTH, lat + VIEW_HALF_HEIGHT],
                ));
            }

            for feature in &layer.features {
                let style = if hovered == Some(feature.name.as_str()) {
                    base.hovered()
                } else {
                    base
                };
                draw_feature(plot_ui, feature, style);
            }
            for feature in layer.features_named(selected) {
                draw_feature(plot_ui, feature, highlight);
            }

            plot_ui
                .pointer_coordinate()
                .and_then(|p| layer.hit(p.x, p.y))
                .map(|f| f.name.clone())
        });

    if recenter.is_some() {
        state.recenter_map = false;
    }

    let hovered = response.inner;
    if let Some(name) = &hovered {
        response.response.on_hover_ui_at_pointer(|ui: &mut Ui| {
            egui::Frame::new().fill(TOOLTIP_BG).inner_margin(4.0).show(ui, |ui: &mut Ui| {
                ui.label(
                    RichText::new(format!("County: {name}"))
                        .color(Color32::WHITE)
                        .size(10.0),
                );
            });
        });
    }
    state.hovered_county = hovered;
}

fn draw_feature(plot_ui: &mut egui_plot::PlotUi, feature: &MapFeature, style: LayerStyle) {
    for ring in &feature.rings {
        let points: PlotPoints = ring.iter().copied().collect();
        plot_ui.polygon(
            Polygon::new(points)
                .name(&feature.name)
                .fill_color(style.fill)
                .stroke(style.stroke()),
        );
    }
}
