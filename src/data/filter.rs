use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::frame::{ColumnKind, DataFrame, Value, classify, coerce_temporal};

// ---------------------------------------------------------------------------
// Widget state: one user selection per filtered column
// ---------------------------------------------------------------------------

/// The user's current selection for one filter control. A missing entry
/// (or one whose variant no longer matches the column's inferred kind)
/// means "no restriction".
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Values kept by a categorical multi-select.
    Categorical(BTreeSet<Value>),
    /// Closed numeric interval, both ends inclusive.
    Numeric { lo: f64, hi: f64 },
    /// Date-range endpoints. Exactly two form a closed interval; zero or
    /// one is a pass-through, not an error.
    Temporal {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Case-sensitive literal substring matched against the cell's string
    /// rendering. Empty string is a pass-through; null cells never match
    /// an active query.
    Text(String),
}

/// Per-column selection state: maps column_name → the widget's selection.
pub type WidgetState = BTreeMap<String, ColumnFilter>;

// ---------------------------------------------------------------------------
// Filter controls: what the UI should render for each selected column
// ---------------------------------------------------------------------------

/// Description of the control built for one selected column, with bounds
/// and options computed against the frame as narrowed by the columns
/// filtered *before* this one.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterControl {
    Categorical {
        column: String,
        options: Vec<Value>,
        selected: BTreeSet<Value>,
    },
    Numeric {
        column: String,
        min: f64,
        max: f64,
        step: f64,
        lo: f64,
        hi: f64,
    },
    Temporal {
        column: String,
        min: NaiveDate,
        max: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Text {
        column: String,
        query: String,
    },
}

impl FilterControl {
    pub fn column(&self) -> &str {
        match self {
            FilterControl::Categorical { column, .. }
            | FilterControl::Numeric { column, .. }
            | FilterControl::Temporal { column, .. }
            | FilterControl::Text { column, .. } => column,
        }
    }
}

/// Result of one filter pass: the narrowed frame plus the controls the
/// presentation layer should show for the selected columns.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub frame: DataFrame,
    pub controls: Vec<FilterControl>,
}

// ---------------------------------------------------------------------------
// The engine
// ---------------------------------------------------------------------------

/// Narrow `base` by the selected columns' widget state.
///
/// Columns apply in selection order and each predicate runs before the
/// next column's bounds and cardinality are computed, so a later numeric
/// slider's [min, max] reflects the rows that survived the earlier
/// filters. Computing all ranges once against the unfiltered frame would
/// be observably different behaviour.
pub fn apply_filters(
    base: &DataFrame,
    selected_columns: &[String],
    widgets: &WidgetState,
) -> FilterOutcome {
    let mut working = base.clone();

    // One best-effort temporal coercion pass over the whole copy, before
    // any classification. Columns that fail to parse stay as they are.
    for name in working.names().to_vec() {
        if let Some(coerced) = working.column(&name).and_then(coerce_temporal) {
            working.set_column(&name, coerced);
        }
    }

    let mut controls = Vec::with_capacity(selected_columns.len());

    for name in selected_columns {
        let Some(values) = working.column(name) else {
            continue;
        };
        let kind = classify(values, working.is_tagged_categorical(name));

        let (control, mask) = match kind {
            ColumnKind::Categorical => categorical_step(&working, name, widgets),
            ColumnKind::Numeric => numeric_step(&working, name, widgets),
            ColumnKind::Temporal => temporal_step(&working, name, widgets),
            ColumnKind::Text => text_step(&working, name, widgets),
        };

        if let Some(control) = control {
            controls.push(control);
        }
        if let Some(mask) = mask {
            working = working.filter_rows(&mask);
        }
    }

    FilterOutcome {
        frame: working,
        controls,
    }
}

/// `(control, mask)`; a `None` mask means the column is a pass-through.
type Step = (Option<FilterControl>, Option<Vec<bool>>);

fn categorical_step(frame: &DataFrame, name: &str, widgets: &WidgetState) -> Step {
    let options: Vec<Value> = frame.distinct(name).into_iter().collect();
    let selected: BTreeSet<Value> = match widgets.get(name) {
        Some(ColumnFilter::Categorical(sel)) => sel.clone(),
        // Default: everything selected, i.e. no restriction.
        _ => options.iter().cloned().collect(),
    };

    let all_selected = options.iter().all(|v| selected.contains(v));
    let mask = if all_selected {
        None
    } else {
        frame
            .column(name)
            .map(|col| col.iter().map(|v| selected.contains(v)).collect())
    };

    (
        Some(FilterControl::Categorical {
            column: name.to_string(),
            options,
            selected,
        }),
        mask,
    )
}

fn numeric_step(frame: &DataFrame, name: &str, widgets: &WidgetState) -> Step {
    let Some((min, max)) = frame.numeric_bounds(name) else {
        // Nothing numeric left to bound (e.g. all rows already filtered
        // away), so there is nothing to restrict either.
        return (None, None);
    };
    let step = (max - min) / 100.0;

    let (lo, hi) = match widgets.get(name) {
        // Clamp into the current bounds, mirroring what a slider bounded
        // by [min, max] can actually hold.
        Some(ColumnFilter::Numeric { lo, hi }) => (lo.max(min), hi.min(max)),
        _ => (min, max),
    };

    let mask = (lo > min || hi < max).then(|| {
        frame
            .column(name)
            .map(|col| {
                col.iter()
                    .map(|v| v.as_f64().is_some_and(|x| x >= lo && x <= hi))
                    .collect()
            })
            .unwrap_or_default()
    });

    (
        Some(FilterControl::Numeric {
            column: name.to_string(),
            min,
            max,
            step,
            lo,
            hi,
        }),
        mask,
    )
}

fn temporal_step(frame: &DataFrame, name: &str, widgets: &WidgetState) -> Step {
    let Some((min, max)) = frame.date_bounds(name) else {
        return (None, None);
    };

    let (start, end) = match widgets.get(name) {
        Some(ColumnFilter::Temporal { start, end }) => (*start, *end),
        _ => (None, None),
    };

    // Both endpoints present → closed interval; otherwise pass-through.
    let mask = match (start, end) {
        (Some(s), Some(e)) => frame.column(name).map(|col| {
            col.iter()
                .map(|v| v.as_date().is_some_and(|d| d >= s && d <= e))
                .collect()
        }),
        _ => None,
    };

    (
        Some(FilterControl::Temporal {
            column: name.to_string(),
            min,
            max,
            start,
            end,
        }),
        mask,
    )
}

fn text_step(frame: &DataFrame, name: &str, widgets: &WidgetState) -> Step {
    let query = match widgets.get(name) {
        Some(ColumnFilter::Text(q)) => q.clone(),
        _ => String::new(),
    };

    let mask = if query.is_empty() {
        None
    } else {
        frame
            .column(name)
            .map(|col| {
                col.iter()
                    .map(|v| !v.is_null() && v.to_string().contains(&query))
                    .collect()
            })
    };

    (
        Some(FilterControl::Text {
            column: name.to_string(),
            query,
        }),
        mask,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // 13 rows; the emissions column keeps >= 10 distinct values both
    // before and after narrowing to Toyota, so it classifies numeric in
    // every step below.
    fn fleet() -> DataFrame {
        let mut makes = vec!["Toyota"; 10];
        makes.extend(["Honda", "Honda", "Ford"]);
        let mut emissions: Vec<f64> = (0..10).map(|i| 120.0 + i as f64 * 10.0).collect();
        emissions.extend([155.5, 215.0, 260.0]);
        let mut classes = Vec::new();
        for i in 0..13 {
            classes.push(if i % 2 == 0 { "suv" } else { "compact" });
        }
        DataFrame::from_columns(vec![
            (
                "make".into(),
                makes.iter().map(|s| Value::Str(s.to_string())).collect(),
            ),
            (
                "co2_emissions_g_km".into(),
                emissions.iter().map(|&v| Value::Float(v)).collect(),
            ),
            (
                "vehicle_class".into(),
                classes.iter().map(|s| Value::Str(s.to_string())).collect(),
            ),
        ])
        .unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_widget_state_is_identity() {
        let df = fleet();
        let out = apply_filters(
            &df,
            &cols(&["make", "co2_emissions_g_km", "vehicle_class"]),
            &WidgetState::new(),
        );
        assert_eq!(out.frame.n_rows(), df.n_rows());
        assert_eq!(out.controls.len(), 3);
    }

    #[test]
    fn categorical_subset_narrows() {
        let df = fleet();
        let mut widgets = WidgetState::new();
        widgets.insert(
            "make".into(),
            ColumnFilter::Categorical([Value::Str("Toyota".into())].into_iter().collect()),
        );
        let out = apply_filters(&df, &cols(&["make"]), &widgets);
        assert_eq!(out.frame.n_rows(), 10);
        assert!(out
            .frame
            .column("make")
            .unwrap()
            .iter()
            .all(|v| v.to_string() == "Toyota"));
    }

    #[test]
    fn numeric_bounds_follow_prior_narrowing() {
        let df = fleet();
        let mut widgets = WidgetState::new();
        widgets.insert(
            "make".into(),
            ColumnFilter::Categorical([Value::Str("Toyota".into())].into_iter().collect()),
        );
        let out = apply_filters(&df, &cols(&["make", "co2_emissions_g_km"]), &widgets);

        // Toyota rows only: 120..=210 → bounds (120, 210), not the
        // frame-wide (120, 260).
        let numeric = out
            .controls
            .iter()
            .find(|c| c.column() == "co2_emissions_g_km")
            .unwrap();
        match numeric {
            FilterControl::Numeric { min, max, step, .. } => {
                assert_eq!((*min, *max), (120.0, 210.0));
                assert!((step - 0.9).abs() < 1e-9);
            }
            other => panic!("expected numeric control, got {other:?}"),
        }
    }

    #[test]
    fn numeric_closed_interval_keeps_endpoints() {
        // 12 distinct values so the column classifies numeric, not
        // categorical.
        let values: Vec<Value> = (0..12)
            .map(|i| Value::Float(100.0 + i as f64 * 10.0))
            .collect();
        let df = DataFrame::from_columns(vec![("co2".into(), values)]).unwrap();
        let mut widgets = WidgetState::new();
        widgets.insert(
            "co2".into(),
            ColumnFilter::Numeric { lo: 120.0, hi: 160.0 },
        );

        let out = apply_filters(&df, &cols(&["co2"]), &widgets);
        let kept: Vec<f64> = out
            .frame
            .column("co2")
            .unwrap()
            .iter()
            .filter_map(Value::as_f64)
            .collect();
        assert_eq!(kept, vec![120.0, 130.0, 140.0, 150.0, 160.0]);
    }

    #[test]
    fn temporal_needs_both_endpoints() {
        let dates: Vec<Value> = (1..=20)
            .map(|d| Value::Str(format!("2022-03-{d:02}")))
            .collect();
        let df = DataFrame::from_columns(vec![("sold_on".into(), dates)]).unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2022, 3, d).unwrap();

        // One endpoint → pass-through.
        let mut widgets = WidgetState::new();
        widgets.insert(
            "sold_on".into(),
            ColumnFilter::Temporal {
                start: Some(day(5)),
                end: None,
            },
        );
        let out = apply_filters(&df, &cols(&["sold_on"]), &widgets);
        assert_eq!(out.frame.n_rows(), 20);

        // Two endpoints → inclusive closed interval.
        widgets.insert(
            "sold_on".into(),
            ColumnFilter::Temporal {
                start: Some(day(5)),
                end: Some(day(8)),
            },
        );
        let out = apply_filters(&df, &cols(&["sold_on"]), &widgets);
        assert_eq!(out.frame.n_rows(), 4);
        let kept = out.frame.column("sold_on").unwrap();
        assert_eq!(kept.first().unwrap().as_date(), Some(day(5)));
        assert_eq!(kept.last().unwrap().as_date(), Some(day(8)));
    }

    #[test]
    fn text_filter_substring_semantics() {
        let models: Vec<Value> = [
            "Toyota Corolla",
            "Toyota RAV4",
            "Honda Civic",
            "Ford F-150",
            "Toyota Camry",
            "Honda CR-V",
            "Mazda 3",
            "Mazda CX-5",
            "Kia Rio",
            "Kia Soul",
            "Fiat 500",
            "Mini Cooper",
        ]
        .iter()
        .map(|s| Value::Str(s.to_string()))
        .collect();
        let df = DataFrame::from_columns(vec![("model".into(), models)]).unwrap();

        // Empty query → unchanged.
        let mut widgets = WidgetState::new();
        widgets.insert("model".into(), ColumnFilter::Text(String::new()));
        let out = apply_filters(&df, &cols(&["model"]), &widgets);
        assert_eq!(out.frame.n_rows(), 12);

        // Substring, case-sensitive.
        widgets.insert("model".into(), ColumnFilter::Text("Toyota".into()));
        let out = apply_filters(&df, &cols(&["model"]), &widgets);
        assert_eq!(out.frame.n_rows(), 3);

        widgets.insert("model".into(), ColumnFilter::Text("toyota".into()));
        let out = apply_filters(&df, &cols(&["model"]), &widgets);
        assert_eq!(out.frame.n_rows(), 0);
    }

    #[test]
    fn text_filter_never_matches_missing_cells() {
        let mut models: Vec<Value> = (0..10)
            .map(|i| Value::Str(format!("model-{i}")))
            .collect();
        models.extend([Value::Null, Value::Null]);
        let df = DataFrame::from_columns(vec![("model".into(), models)]).unwrap();

        // The null placeholder rendering is not searchable text.
        for query in ["null", "<", "model"] {
            let mut widgets = WidgetState::new();
            widgets.insert("model".into(), ColumnFilter::Text(query.into()));
            let out = apply_filters(&df, &cols(&["model"]), &widgets);
            assert!(
                out.frame
                    .column("model")
                    .unwrap()
                    .iter()
                    .all(|v| !v.is_null()),
                "query {query:?} kept a null cell"
            );
        }
    }

    #[test]
    fn unparseable_dates_fall_through_to_text() {
        let vals: Vec<Value> = (0..12).map(|i| Value::Str(format!("spring-{i}"))).collect();
        let df = DataFrame::from_columns(vec![("season".into(), vals)]).unwrap();
        let out = apply_filters(&df, &cols(&["season"]), &WidgetState::new());
        assert!(matches!(out.controls[0], FilterControl::Text { .. }));
        assert_eq!(out.frame.n_rows(), 12);
    }
}
