use std::sync::Arc;

use crate::config::Config;
use crate::data::filter::WidgetState;
use crate::data::frame::{DataFrame, Value};
use crate::data::loader::{load_table, prepare_consolidated};
use crate::model::{FEATURE_SCHEMA, FeatureRecord, TrainedModel};

// ---------------------------------------------------------------------------
// BaseData – the once-initialized immutable load
// ---------------------------------------------------------------------------

/// The three artifacts loaded at startup and shared read-only for the
/// process lifetime. Every interaction derives private copies from these
/// and discards them after rendering; nothing mutates them in place. The
/// only way to swap the consolidated table is the explicit File → Open
/// action, which builds a whole new handle state.
pub struct BaseData {
    pub consolidated: Arc<DataFrame>,
    pub reference: Arc<DataFrame>,
    pub model: Arc<TrainedModel>,
}

impl BaseData {
    pub fn load(cfg: &Config) -> anyhow::Result<Self> {
        let raw = load_table(&cfg.consolidated_path)?;
        let consolidated = prepare_consolidated(&raw)?;
        let reference = load_table(&cfg.reference_path)?;
        let model = TrainedModel::load(&cfg.model_path)?;
        log::info!(
            "loaded {} consolidated rows, {} reference rows, model schema {:?}",
            consolidated.n_rows(),
            reference.n_rows(),
            model.schema()
        );
        Ok(BaseData {
            consolidated: Arc::new(consolidated),
            reference: Arc::new(reference),
            model: Arc::new(model),
        })
    }
}

// ---------------------------------------------------------------------------
// Exploration tab state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ExploreState {
    /// Mirrors the "add filters" checkbox; when off, the base frame shows
    /// unfiltered.
    pub filters_enabled: bool,
    /// Columns chosen for filtering, in the order the user picked them.
    /// Predicates apply in exactly this order.
    pub selected_columns: Vec<String>,
    pub widgets: WidgetState,
}

impl ExploreState {
    pub fn is_selected(&self, column: &str) -> bool {
        self.selected_columns.iter().any(|c| c == column)
    }

    /// Add or remove a column from the filter list. Removing also drops
    /// its stale widget selection.
    pub fn toggle_column(&mut self, column: &str) {
        if let Some(pos) = self.selected_columns.iter().position(|c| c == column) {
            self.selected_columns.remove(pos);
            self.widgets.remove(column);
        } else {
            self.selected_columns.push(column.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.selected_columns.clear();
        self.widgets.clear();
    }
}

// ---------------------------------------------------------------------------
// Prediction tab state
// ---------------------------------------------------------------------------

/// The six categorical selections plus three consumption sliders. Always
/// fully populated once constructed, so assembling a record can't produce
/// a partial row.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictForm {
    pub model_year: Value,
    pub transmission: Value,
    pub fuel_type: Value,
    pub vehicle_class: Value,
    pub engine_size: Value,
    pub cylinders: Value,
    pub city: f64,
    pub highway: f64,
    pub combined: f64,
}

impl PredictForm {
    /// Default form: the first option of every select, sliders at their
    /// lower bound. `None` when the reference table is missing a column
    /// or empty.
    pub fn from_reference(reference: &DataFrame) -> Option<Self> {
        let first = |col: &str| -> Option<Value> {
            reference
                .distinct(col)
                .into_iter()
                .find(|v| !v.is_null())
        };
        let lo = |col: &str| -> Option<f64> { reference.numeric_bounds(col).map(|b| b.0) };

        Some(PredictForm {
            model_year: first("model_year")?,
            transmission: first("transmission")?,
            fuel_type: first("fuel_type")?,
            vehicle_class: first("vehicle_class_grouped")?,
            engine_size: first("engine_size_l_class")?,
            cylinders: first("cylinders_class")?,
            city: lo("city_l_100_km")?,
            highway: lo("highway_l_100_km")?,
            combined: lo("combined_l_100_km")?,
        })
    }

    /// Assemble the single-row model input, columns in trained-schema
    /// order.
    pub fn record(&self) -> FeatureRecord {
        let values = [
            self.model_year.clone(),
            self.transmission.clone(),
            self.fuel_type.clone(),
            self.vehicle_class.clone(),
            self.engine_size.clone(),
            self.cylinders.clone(),
            Value::Float(self.city),
            Value::Float(self.highway),
            Value::Float(self.combined),
        ];
        FeatureRecord::new(
            FEATURE_SCHEMA
                .iter()
                .map(|s| s.to_string())
                .zip(values)
                .collect(),
        )
    }
}

#[derive(Default)]
pub struct PredictState {
    pub form: Option<PredictForm>,
    /// Last prediction, g/km. Cleared on a full reload; swapping just the
    /// consolidated table keeps it, since the model and reference table
    /// it came from stay loaded.
    pub result: Option<f64>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Explore,
    Predict,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded artifacts (None when the startup load failed).
    pub base: Option<BaseData>,
    pub tab: Tab,
    pub explore: ExploreState,
    pub predict: PredictState,
    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            base: None,
            tab: Tab::Explore,
            explore: ExploreState::default(),
            predict: PredictState::default(),
            status_message: None,
        }
    }
}

impl AppState {
    pub fn set_base(&mut self, base: BaseData) {
        self.predict = PredictState {
            form: PredictForm::from_reference(&base.reference),
            result: None,
            error: None,
        };
        self.explore.clear();
        self.base = Some(base);
        self.status_message = None;
    }

    /// Swap in a different consolidated table (File → Open), keeping the
    /// reference table and model.
    pub fn replace_consolidated(&mut self, frame: DataFrame) {
        if let Some(base) = &mut self.base {
            base.consolidated = Arc::new(frame);
            self.explore.clear();
        }
    }

    /// Run the model on the current form. Triggered by the submit button
    /// only, never on field changes.
    pub fn run_prediction(&mut self) {
        let Some(base) = &self.base else {
            return;
        };
        let Some(form) = &self.predict.form else {
            return;
        };
        match base.model.predict(&form.record()) {
            Ok(value) => {
                self.predict.result = Some(value);
                self.predict.error = None;
            }
            Err(e) => {
                log::error!("prediction failed: {e}");
                self.predict.result = None;
                self.predict.error = Some(e.to_string());
            }
        }
    }
}
