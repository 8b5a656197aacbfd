use eframe::egui::{self, Color32, RichText, Slider, Ui};

use crate::data::frame::{DataFrame, Value};
use crate::state::{AppState, PredictForm};

// ---------------------------------------------------------------------------
// Prediction tab
// ---------------------------------------------------------------------------

/// The prediction view: six selects + three sliders, a submit button, and
/// the resulting estimate. The model only runs on submission.
pub fn predict_view(ui: &mut Ui, state: &mut AppState) {
    let Some(base) = &state.base else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No model loaded");
        });
        return;
    };
    let reference = base.reference.clone();

    ui.heading("⚙ Predict CO\u{2082} emissions");
    ui.add_space(4.0);

    let mut submit = false;

    match &mut state.predict.form {
        Some(form) => {
            form_ui(ui, form, &reference);
            ui.add_space(8.0);
            submit = ui.button("🚗 Predict CO\u{2082} emissions").clicked();
        }
        None => {
            ui.label(
                RichText::new("Reference dataset is missing the model's feature columns")
                    .color(Color32::RED),
            );
        }
    }

    if submit {
        state.run_prediction();
    }

    ui.add_space(12.0);
    if let Some(value) = state.predict.result {
        ui.label("Predicted CO\u{2082} emissions (g/km)");
        ui.label(RichText::new(format!("{value:.2}")).size(32.0).strong());
    }
    if let Some(err) = &state.predict.error {
        ui.label(RichText::new(format!("Prediction failed: {err}")).color(Color32::RED));
    }
}

fn form_ui(ui: &mut Ui, form: &mut PredictForm, reference: &DataFrame) {
    ui.columns(2, |cols| {
        value_select(&mut cols[0], "Year", reference, "model_year", &mut form.model_year);
        value_select(
            &mut cols[0],
            "Transmission",
            reference,
            "transmission",
            &mut form.transmission,
        );
        value_select(
            &mut cols[0],
            "Fuel type",
            reference,
            "fuel_type",
            &mut form.fuel_type,
        );
        value_select(
            &mut cols[1],
            "Vehicle class",
            reference,
            "vehicle_class_grouped",
            &mut form.vehicle_class,
        );
        value_select(
            &mut cols[1],
            "Engine size",
            reference,
            "engine_size_l_class",
            &mut form.engine_size,
        );
        value_select(
            &mut cols[1],
            "Cylinders",
            reference,
            "cylinders_class",
            &mut form.cylinders,
        );
    });

    ui.add_space(8.0);
    consumption_slider(ui, "City consumption (l/100 km)", reference, "city_l_100_km", &mut form.city);
    consumption_slider(
        ui,
        "Highway consumption (l/100 km)",
        reference,
        "highway_l_100_km",
        &mut form.highway,
    );
    consumption_slider(
        ui,
        "Combined consumption (l/100 km)",
        reference,
        "combined_l_100_km",
        &mut form.combined,
    );
}

/// A select box constrained to the distinct values observed in the
/// reference dataset.
fn value_select(ui: &mut Ui, label: &str, reference: &DataFrame, column: &str, current: &mut Value) {
    egui::ComboBox::from_label(label)
        .selected_text(current.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for option in reference.distinct(column) {
                if option.is_null() {
                    continue;
                }
                let text = option.to_string();
                ui.selectable_value(current, option, text);
            }
        });
}

/// A slider bounded by the reference dataset's observed min/max.
fn consumption_slider(ui: &mut Ui, label: &str, reference: &DataFrame, column: &str, value: &mut f64) {
    let Some((min, max)) = reference.numeric_bounds(column) else {
        return;
    };
    ui.add(Slider::new(value, min..=max).text(label));
}
