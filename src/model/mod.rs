use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::frame::Value;

// ---------------------------------------------------------------------------
// Feature schema
// ---------------------------------------------------------------------------

/// The exact column identifiers, in order, the regression model was
/// trained on. A record with any other shape is rejected before the
/// weights are touched.
pub const FEATURE_SCHEMA: [&str; 9] = [
    "model_year",
    "transmission",
    "fuel_type",
    "vehicle_class_grouped",
    "engine_size_l_class",
    "cylinders_class",
    "city_l_100_km",
    "highway_l_100_km",
    "combined_l_100_km",
];

/// One fully-populated prediction input row. Constructed only from a
/// complete set of selections, so partial records are unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    names: Vec<String>,
    values: Vec<Value>,
}

impl FeatureRecord {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        let (names, values) = fields.into_iter().unzip();
        FeatureRecord { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
    }
}

// ---------------------------------------------------------------------------
// Prediction errors
// ---------------------------------------------------------------------------

/// A malformed model input is surfaced to the user as a visible failure,
/// never a silent wrong prediction.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("feature schema mismatch: model expects {expected:?}, got {got:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("feature '{feature}' has no weight for category '{value}'")]
    UnknownCategory { feature: String, value: String },
    #[error("feature '{feature}' expects a numeric value, got '{value}'")]
    NonNumericFeature { feature: String, value: String },
}

// ---------------------------------------------------------------------------
// TrainedModel – the serialized regression artifact
// ---------------------------------------------------------------------------

/// A fitted linear regression over one-hot-encoded categorical features
/// and raw numeric features, deserialized from a JSON artifact exported
/// by the training pipeline. This crate never trains or refits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Column identifiers the model expects, in order.
    schema: Vec<String>,
    intercept: f64,
    /// Coefficient per numeric feature.
    numeric: BTreeMap<String, f64>,
    /// Weight per observed level, per categorical feature.
    categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl TrainedModel {
    /// Load the artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        let model: TrainedModel =
            serde_json::from_str(&text).context("parsing model artifact")?;
        Ok(model)
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Point prediction for one feature record, in g/km.
    ///
    /// The record's column names and order must match the trained schema
    /// exactly; each categorical feature's value must be a level the
    /// model saw during training.
    pub fn predict(&self, record: &FeatureRecord) -> std::result::Result<f64, ModelError> {
        if record.names != self.schema {
            return Err(ModelError::SchemaMismatch {
                expected: self.schema.clone(),
                got: record.names.clone(),
            });
        }

        let mut estimate = self.intercept;
        for (name, value) in record.names.iter().zip(&record.values) {
            if let Some(coef) = self.numeric.get(name) {
                let x = value.as_f64().ok_or_else(|| ModelError::NonNumericFeature {
                    feature: name.clone(),
                    value: value.to_string(),
                })?;
                estimate += coef * x;
            } else if let Some(weights) = self.categorical.get(name) {
                let label = value.to_string();
                let w = weights
                    .get(&label)
                    .ok_or_else(|| ModelError::UnknownCategory {
                        feature: name.clone(),
                        value: label.clone(),
                    })?;
                estimate += w;
            } else {
                // A schema column with no weights at all: treat as an
                // unknown category so the artifact's inconsistency is
                // visible instead of silently ignored.
                return Err(ModelError::UnknownCategory {
                    feature: name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> TrainedModel {
        let schema: Vec<String> = FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect();
        let mut numeric = BTreeMap::new();
        numeric.insert("city_l_100_km".to_string(), 2.0);
        numeric.insert("highway_l_100_km".to_string(), 1.0);
        numeric.insert("combined_l_100_km".to_string(), 10.0);

        let mut categorical = BTreeMap::new();
        let table = |pairs: &[(&str, f64)]| -> BTreeMap<String, f64> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        categorical.insert("model_year".to_string(), table(&[("2019", 5.0), ("2020", 3.0)]));
        categorical.insert("transmission".to_string(), table(&[("A", 1.0), ("M", -1.0)]));
        categorical.insert(
            "fuel_type".to_string(),
            table(&[("reg_gasoline", 4.0), ("diesel", 9.0)]),
        );
        categorical.insert(
            "vehicle_class_grouped".to_string(),
            table(&[("suv", 12.0), ("compact", -6.0)]),
        );
        categorical.insert(
            "engine_size_l_class".to_string(),
            table(&[("small", -3.0), ("large", 8.0)]),
        );
        categorical.insert(
            "cylinders_class".to_string(),
            table(&[("four", 0.5), ("six", 2.5)]),
        );

        TrainedModel {
            schema,
            intercept: 100.0,
            numeric,
            categorical,
        }
    }

    fn complete_record() -> FeatureRecord {
        FeatureRecord::new(vec![
            ("model_year".into(), Value::Int(2019)),
            ("transmission".into(), Value::Str("A".into())),
            ("fuel_type".into(), Value::Str("reg_gasoline".into())),
            ("vehicle_class_grouped".into(), Value::Str("suv".into())),
            ("engine_size_l_class".into(), Value::Str("small".into())),
            ("cylinders_class".into(), Value::Str("four".into())),
            ("city_l_100_km".into(), Value::Float(9.0)),
            ("highway_l_100_km".into(), Value::Float(6.0)),
            ("combined_l_100_km".into(), Value::Float(8.0)),
        ])
    }

    #[test]
    fn predict_complete_record() {
        let model = toy_model();
        let got = model.predict(&complete_record()).unwrap();
        // 100 + 5 + 1 + 4 + 12 - 3 + 0.5 + 2*9 + 6 + 10*8 = 223.5
        assert!((got - 223.5).abs() < 1e-9);
        // Displayed with two decimals.
        assert_eq!(format!("{got:.2}"), "223.50");
    }

    #[test]
    fn predict_rejects_wrong_schema() {
        let model = toy_model();
        let record = FeatureRecord::new(vec![
            ("model_year".into(), Value::Int(2019)),
            ("transmission".into(), Value::Str("A".into())),
        ]);
        assert!(matches!(
            model.predict(&record),
            Err(ModelError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn predict_rejects_unseen_category() {
        let model = toy_model();
        let mut fields: Vec<(String, Value)> = complete_record()
            .names()
            .iter()
            .map(|n| (n.clone(), complete_record().get(n).unwrap().clone()))
            .collect();
        fields[2].1 = Value::Str("plutonium".into());
        let record = FeatureRecord::new(fields);
        assert_eq!(
            model.predict(&record),
            Err(ModelError::UnknownCategory {
                feature: "fuel_type".into(),
                value: "plutonium".into(),
            })
        );
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let model = toy_model();
        let text = serde_json::to_string(&model).unwrap();
        let back: TrainedModel = serde_json::from_str(&text).unwrap();
        let a = model.predict(&complete_record()).unwrap();
        let b = back.predict(&complete_record()).unwrap();
        assert_eq!(a, b);
    }
}
