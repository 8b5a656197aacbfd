use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::charts::{ColorRange, bar_chart, scatter_chart, treemap};
use crate::color::emission_background;
use crate::data::filter::{ColumnFilter, FilterControl, FilterOutcome, WidgetState, apply_filters};
use crate::data::frame::DataFrame;
use crate::data::loader::{load_table, prepare_consolidated};
use crate::state::AppState;

use super::plot;

/// Rows shown in the data table before truncation kicks in.
const TABLE_ROW_CAP: usize = 200;

const EMISSIONS_COLUMN: &str = "co2_emissions_g_km";
/// Columns rendered with the emissions colour gradient in the table.
const GRADIENT_COLUMNS: [&str; 2] = [EMISSIONS_COLUMN, "combined_l_100_km"];

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(base) = &state.base {
            ui.label(format!("{} vehicles loaded", base.consolidated.n_rows()));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// Replace the consolidated table with a user-picked file. The reference
/// table and model stay as loaded at startup.
pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open consolidated emissions data")
        .add_filter("Supported files", &["parquet", "pq", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match load_table(&path).and_then(|raw| prepare_consolidated(&raw)) {
            Ok(frame) => {
                log::info!(
                    "loaded {} rows with columns {:?}",
                    frame.n_rows(),
                    frame.names()
                );
                state.replace_consolidated(frame);
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Explore tab
// ---------------------------------------------------------------------------

/// The data-exploration view: filter widgets, the table, and the charts.
pub fn explore_view(ui: &mut Ui, state: &mut AppState) {
    let Some(base) = &state.base else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No dataset loaded  (File → Open…)");
        });
        return;
    };
    let consolidated = base.consolidated.clone();

    ui.heading("Vehicle CO\u{2082} emissions");
    ui.checkbox(&mut state.explore.filters_enabled, "🔍 Add filters");

    // Widget edits land in `state.explore.widgets` and take effect on the
    // repaint they trigger.
    let outcome = if state.explore.filters_enabled {
        column_multiselect(ui, state, consolidated.names());
        let outcome = apply_filters(
            &consolidated,
            &state.explore.selected_columns,
            &state.explore.widgets,
        );
        for control in &outcome.controls {
            filter_control_ui(ui, control, &mut state.explore.widgets);
        }
        outcome
    } else {
        FilterOutcome {
            frame: (*consolidated).clone(),
            controls: Vec::new(),
        }
    };

    ui.separator();

    // One colour range per interaction, shared by the table gradient and
    // every chart below.
    let color_range = ColorRange::from_frame(&outcome.frame, EMISSIONS_COLUMN)
        .unwrap_or(ColorRange { min: 0.0, max: 1.0 });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            data_table(ui, &outcome.frame, color_range);
            charts_section(ui, &outcome.frame, color_range);
        });
}

fn column_multiselect(ui: &mut Ui, state: &mut AppState, columns: &[String]) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Filter columns:");
        for col in columns {
            let selected = state.explore.is_selected(col);
            if ui.selectable_label(selected, col).clicked() {
                state.explore.toggle_column(col);
            }
        }
    });
}

/// Render one filter control, writing the user's selection back into the
/// widget state.
fn filter_control_ui(ui: &mut Ui, control: &FilterControl, widgets: &mut WidgetState) {
    match control {
        FilterControl::Categorical {
            column,
            options,
            selected,
        } => {
            let header = format!("{column}  ({}/{})", selected.len(), options.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt(column)
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    let mut chosen: BTreeSet<_> = selected.clone();
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            chosen = options.iter().cloned().collect();
                        }
                        if ui.small_button("None").clicked() {
                            chosen.clear();
                        }
                    });
                    for val in options {
                        let mut checked = chosen.contains(val);
                        if ui.checkbox(&mut checked, val.to_string()).changed() {
                            if checked {
                                chosen.insert(val.clone());
                            } else {
                                chosen.remove(val);
                            }
                        }
                    }
                    widgets.insert(column.clone(), ColumnFilter::Categorical(chosen));
                });
        }
        FilterControl::Numeric {
            column,
            min,
            max,
            step,
            lo,
            hi,
        } => {
            let (mut lo, mut hi) = (*lo, *hi);
            ui.horizontal(|ui: &mut Ui| {
                ui.label(RichText::new(column).strong());
                ui.add(
                    egui::Slider::new(&mut lo, *min..=*max)
                        .step_by(step.max(f64::EPSILON))
                        .text("from"),
                );
                ui.add(
                    egui::Slider::new(&mut hi, *min..=*max)
                        .step_by(step.max(f64::EPSILON))
                        .text("to"),
                );
            });
            if lo > hi {
                std::mem::swap(&mut lo, &mut hi);
            }
            widgets.insert(column.clone(), ColumnFilter::Numeric { lo, hi });
        }
        FilterControl::Temporal {
            column,
            min,
            max,
            start,
            end,
        } => {
            let mut use_range = start.is_some() && end.is_some();
            let mut s = start.unwrap_or(*min);
            let mut e = end.unwrap_or(*max);
            ui.horizontal(|ui: &mut Ui| {
                ui.label(RichText::new(column).strong());
                ui.checkbox(&mut use_range, "range");
                if use_range {
                    ui.add(DatePickerButton::new(&mut s).id_salt(&format!("{column}_start")));
                    ui.add(DatePickerButton::new(&mut e).id_salt(&format!("{column}_end")));
                }
            });
            let filter = if use_range {
                ColumnFilter::Temporal {
                    start: Some(s),
                    end: Some(e),
                }
            } else {
                ColumnFilter::Temporal {
                    start: None,
                    end: None,
                }
            };
            widgets.insert(column.clone(), filter);
        }
        FilterControl::Text { column, query } => {
            let mut text = query.clone();
            ui.horizontal(|ui: &mut Ui| {
                ui.label(RichText::new(column).strong());
                ui.add(
                    egui::TextEdit::singleline(&mut text)
                        .hint_text("substring")
                        .desired_width(180.0),
                );
            });
            widgets.insert(column.clone(), ColumnFilter::Text(text));
        }
    }
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

fn data_table(ui: &mut Ui, frame: &DataFrame, color_range: ColorRange) {
    let n_rows = frame.n_rows();
    let shown = n_rows.min(TABLE_ROW_CAP);
    if n_rows > shown {
        ui.label(format!("Showing first {shown} of {n_rows} rows"));
    }

    egui::Grid::new("data_table")
        .striped(true)
        .min_col_width(70.0)
        .show(ui, |ui: &mut Ui| {
            for name in frame.names() {
                ui.label(RichText::new(name).strong());
            }
            ui.end_row();

            for row in 0..shown {
                for (col_idx, name) in frame.names().iter().enumerate() {
                    let value = frame.value(row, col_idx);
                    let mut text = RichText::new(value.to_string());
                    if GRADIENT_COLUMNS.contains(&name.as_str()) {
                        if let Some(v) = value.as_f64() {
                            text = text.background_color(emission_background(v, color_range));
                        }
                    }
                    ui.label(text);
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn charts_section(ui: &mut Ui, frame: &DataFrame, color_range: ColorRange) {
    ui.collapsing("📈 Bar charts", |ui: &mut Ui| {
        let specs = [
            ("make", "Emissions by make"),
            ("vehicle_class", "Emissions by vehicle class"),
            ("model_year", "Emissions by model year"),
        ];
        for (category, title) in specs {
            if let Some(spec) = bar_chart(frame, category, EMISSIONS_COLUMN, title, color_range) {
                plot::render_bar(ui, &spec);
            }
        }
    });

    ui.collapsing("📉 Scatter plots", |ui: &mut Ui| {
        let groupings = [
            ("fuel_type", "Emissions vs consumption by fuel"),
            ("vehicle_class", "Emissions vs consumption by vehicle class"),
        ];
        for (group, title) in groupings {
            if let Some(spec) = scatter_chart(
                frame,
                "combined_l_100_km",
                EMISSIONS_COLUMN,
                group,
                title,
                "Consumption (l/100 km)",
                "Emissions (g/km)",
            ) {
                plot::render_scatter(ui, &spec);
            }
        }
    });

    ui.collapsing("🗺 Treemap", |ui: &mut Ui| {
        if let Some(spec) = treemap(frame, color_range) {
            plot::render_treemap(ui, &spec);
        }
    });
}
