use crate::data::frame::DataFrame;

use super::ColorRange;

// ---------------------------------------------------------------------------
// Bar chart with an overall-mean reference line
// ---------------------------------------------------------------------------

/// One bar: the per-group mean of the value column.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub label: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartSpec {
    pub title: String,
    /// Bars sorted descending by mean.
    pub bars: Vec<BarGroup>,
    /// Overall (ungrouped) mean of the value column, drawn as the
    /// horizontal reference line.
    pub mean_line: f64,
    /// Annotation next to the reference line, mean to 2 decimals.
    pub mean_label: String,
    pub color_range: ColorRange,
}

/// Group by `category`, average `value` per group, and sort descending.
///
/// The reference line is the mean of the *ungrouped* value column, so it
/// is independent of how many groups exist. Callers guarantee the frame
/// is non-empty and the columns exist; otherwise `None`.
pub fn bar_chart(
    frame: &DataFrame,
    category: &str,
    value: &str,
    title: &str,
    color_range: ColorRange,
) -> Option<BarChartSpec> {
    let grouped = frame.grouped_mean(category, value)?;
    let mean_line = frame.mean(value)?;

    let mut bars: Vec<BarGroup> = grouped
        .into_iter()
        .map(|(label, mean)| BarGroup { label, mean })
        .collect();
    bars.sort_by(|a, b| b.mean.total_cmp(&a.mean));

    Some(BarChartSpec {
        title: title.to_string(),
        bars,
        mean_line,
        mean_label: format!("Mean: {mean_line:.2} (g/km)"),
        color_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::Value;

    fn frame() -> DataFrame {
        let makes = ["a", "b", "a", "c", "b", "a"];
        let co2 = [100.0, 200.0, 140.0, 250.0, 220.0, 120.0];
        DataFrame::from_columns(vec![
            (
                "make".into(),
                makes.iter().map(|s| Value::Str(s.to_string())).collect(),
            ),
            (
                "co2".into(),
                co2.iter().map(|&v| Value::Float(v)).collect(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn bars_sorted_descending_by_group_mean() {
        let range = ColorRange { min: 100.0, max: 250.0 };
        let spec = bar_chart(&frame(), "make", "co2", "By make", range).unwrap();
        let labels: Vec<&str> = spec.bars.iter().map(|b| b.label.as_str()).collect();
        // means: a = 120, b = 210, c = 250
        assert_eq!(labels, ["c", "b", "a"]);
        assert!((spec.bars[1].mean - 210.0).abs() < 1e-9);
    }

    #[test]
    fn reference_line_is_ungrouped_mean() {
        let range = ColorRange { min: 0.0, max: 1.0 };
        let spec = bar_chart(&frame(), "make", "co2", "By make", range).unwrap();
        // (100+200+140+250+220+120)/6 = 171.666…, regardless of the three
        // groups' means.
        assert!((spec.mean_line - 1030.0 / 6.0).abs() < 1e-9);
        assert_eq!(spec.mean_label, "Mean: 171.67 (g/km)");
    }

    #[test]
    fn missing_column_yields_none() {
        let range = ColorRange { min: 0.0, max: 1.0 };
        assert!(bar_chart(&frame(), "nope", "co2", "t", range).is_none());
    }
}
