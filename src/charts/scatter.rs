use std::collections::BTreeMap;

use crate::data::frame::DataFrame;

// ---------------------------------------------------------------------------
// Scatter plot grouped by a categorical column
// ---------------------------------------------------------------------------

/// Points sharing one legend entry (one value of the grouping column).
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterGroup {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Groups in sorted label order; each gets a distinct hue.
    pub groups: Vec<ScatterGroup>,
    /// Fixed fill opacity so overlapping points stay readable.
    pub opacity: f32,
}

/// Plot `x` against `y`, one point group per distinct value of `group`.
/// Rows where either coordinate is non-numeric are skipped.
pub fn scatter_chart(
    frame: &DataFrame,
    x: &str,
    y: &str,
    group: &str,
    title: &str,
    x_label: &str,
    y_label: &str,
) -> Option<ScatterSpec> {
    let xs = frame.column(x)?;
    let ys = frame.column(y)?;
    let labels = frame.column(group)?;

    let mut groups: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for ((xv, yv), label) in xs.iter().zip(ys).zip(labels) {
        if let (Some(px), Some(py)) = (xv.as_f64(), yv.as_f64()) {
            groups.entry(label.to_string()).or_default().push([px, py]);
        }
    }

    Some(ScatterSpec {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        groups: groups
            .into_iter()
            .map(|(label, points)| ScatterGroup { label, points })
            .collect(),
        opacity: 0.5,
    })
}
