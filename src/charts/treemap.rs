use crate::data::frame::{DataFrame, Value};

use super::ColorRange;

// ---------------------------------------------------------------------------
// Treemap: fixed emissions hierarchy + slice layout
// ---------------------------------------------------------------------------

/// Constant root label, then the drill-down order of the hierarchy.
pub const TREEMAP_ROOT: &str = "CO\u{2082}";
pub const TREEMAP_PATH: [&str; 5] = [
    "make",
    "vehicle_class",
    "fuel_type",
    "model_year",
    "model",
];

/// One aggregation node: the rows sharing a label prefix along the path.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapNode {
    pub label: String,
    /// Rows aggregated under this node, its area weight.
    pub rows: usize,
    /// Mean emission of those rows, its colour.
    pub mean_emission: f64,
    pub children: Vec<TreemapNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreemapSpec {
    pub root: TreemapNode,
    pub color_range: ColorRange,
}

/// Build the emissions treemap over the fixed hierarchy. Node colour uses
/// the same `[min, max]` scale as the other charts in the interaction.
pub fn treemap(frame: &DataFrame, color_range: ColorRange) -> Option<TreemapSpec> {
    if frame.is_empty() {
        return None;
    }
    let emissions = frame.column("co2_emissions_g_km")?;
    for col in TREEMAP_PATH {
        frame.column(col)?;
    }

    let all_rows: Vec<usize> = (0..frame.n_rows()).collect();
    let root = build_node(frame, emissions, TREEMAP_ROOT.to_string(), all_rows, 0);
    Some(TreemapSpec { root, color_range })
}

fn build_node(
    frame: &DataFrame,
    emissions: &[Value],
    label: String,
    rows: Vec<usize>,
    depth: usize,
) -> TreemapNode {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &r in &rows {
        if let Some(v) = emissions[r].as_f64() {
            sum += v;
            n += 1;
        }
    }
    let mean_emission = if n > 0 { sum / n as f64 } else { 0.0 };

    let children = if depth < TREEMAP_PATH.len() {
        let col = frame
            .column(TREEMAP_PATH[depth])
            .unwrap_or(&[]);
        // Group the node's rows by the next path column, preserving the
        // order labels first appear in.
        let mut order: Vec<String> = Vec::new();
        let mut buckets: std::collections::BTreeMap<String, Vec<usize>> = Default::default();
        for &r in &rows {
            let key = col[r].to_string();
            if !buckets.contains_key(&key) {
                order.push(key.clone());
            }
            buckets.entry(key).or_default().push(r);
        }
        order
            .into_iter()
            .map(|key| {
                let bucket = buckets.remove(&key).unwrap_or_default();
                build_node(frame, emissions, key, bucket, depth + 1)
            })
            .collect()
    } else {
        Vec::new()
    };

    TreemapNode {
        label,
        rows: rows.len(),
        mean_emission,
        children,
    }
}

// ---------------------------------------------------------------------------
// Slice layout – positioned rectangles for the renderer
// ---------------------------------------------------------------------------

/// A positioned node rectangle, in the same coordinate space as the rect
/// handed to [`layout`]. `depth` 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapTile {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub label: String,
    pub mean_emission: f64,
    pub depth: usize,
    pub is_leaf: bool,
}

/// Deterministic slice layout: each node's rectangle is split along its
/// longer side among the children, proportional to row counts, largest
/// child first. Yields one tile per node, parents before children.
pub fn layout(spec: &TreemapSpec, x: f64, y: f64, w: f64, h: f64) -> Vec<TreemapTile> {
    let mut tiles = Vec::new();
    layout_node(&spec.root, x, y, w, h, 0, &mut tiles);
    tiles
}

fn layout_node(
    node: &TreemapNode,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    depth: usize,
    out: &mut Vec<TreemapTile>,
) {
    out.push(TreemapTile {
        x,
        y,
        w,
        h,
        label: node.label.clone(),
        mean_emission: node.mean_emission,
        depth,
        is_leaf: node.children.is_empty(),
    });

    if node.children.is_empty() || node.rows == 0 {
        return;
    }

    let mut children: Vec<&TreemapNode> = node.children.iter().collect();
    children.sort_by(|a, b| b.rows.cmp(&a.rows));

    let total = node.rows as f64;
    let horizontal = w >= h;
    let mut offset = 0.0;
    for child in children {
        let share = child.rows as f64 / total;
        if horizontal {
            let cw = w * share;
            layout_node(child, x + offset, y, cw, h, depth + 1, out);
            offset += cw;
        } else {
            let ch = h * share;
            layout_node(child, x, y + offset, w, ch, depth + 1, out);
            offset += ch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        let s = |v: &str| Value::Str(v.to_string());
        DataFrame::from_columns(vec![
            (
                "make".into(),
                vec![s("Toyota"), s("Toyota"), s("Ford"), s("Ford")],
            ),
            (
                "vehicle_class".into(),
                vec![s("suv"), s("compact"), s("pickup"), s("pickup")],
            ),
            (
                "fuel_type".into(),
                vec![s("reg_gasoline"); 4],
            ),
            (
                "model_year".into(),
                vec![
                    Value::Int(2020),
                    Value::Int(2020),
                    Value::Int(2021),
                    Value::Int(2021),
                ],
            ),
            (
                "model".into(),
                vec![s("RAV4"), s("Corolla"), s("F-150"), s("Ranger")],
            ),
            (
                "co2_emissions_g_km".into(),
                vec![
                    Value::Float(200.0),
                    Value::Float(120.0),
                    Value::Float(280.0),
                    Value::Float(240.0),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn hierarchy_follows_fixed_path() {
        let spec = treemap(&frame(), ColorRange { min: 120.0, max: 280.0 }).unwrap();
        assert_eq!(spec.root.label, TREEMAP_ROOT);
        assert_eq!(spec.root.rows, 4);
        assert!((spec.root.mean_emission - 210.0).abs() < 1e-9);

        let labels: Vec<&str> = spec.root.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Toyota", "Ford"]);

        let ford = &spec.root.children[1];
        assert_eq!(ford.rows, 2);
        assert!((ford.mean_emission - 260.0).abs() < 1e-9);
        // Both Ford rows are pickups → a single second-level child.
        assert_eq!(ford.children.len(), 1);
        assert_eq!(ford.children[0].label, "pickup");
    }

    #[test]
    fn layout_partitions_area_by_row_count() {
        let spec = treemap(&frame(), ColorRange { min: 120.0, max: 280.0 }).unwrap();
        let tiles = layout(&spec, 0.0, 0.0, 100.0, 50.0);

        // Root spans the whole rect.
        assert_eq!((tiles[0].w, tiles[0].h), (100.0, 50.0));

        // Depth-1 tiles split the width in proportion to rows (2/2).
        let depth1: Vec<&TreemapTile> = tiles.iter().filter(|t| t.depth == 1).collect();
        assert_eq!(depth1.len(), 2);
        let width_sum: f64 = depth1.iter().map(|t| t.w).sum();
        assert!((width_sum - 100.0).abs() < 1e-9);
        assert!((depth1[0].w - 50.0).abs() < 1e-9);

        // Leaves carry the per-model labels.
        let leaves: Vec<&str> = tiles
            .iter()
            .filter(|t| t.is_leaf)
            .map(|t| t.label.as_str())
            .collect();
        assert_eq!(leaves.len(), 4);
        assert!(leaves.contains(&"RAV4"));
    }

    #[test]
    fn empty_frame_yields_none() {
        let df = DataFrame::from_columns(vec![]).unwrap();
        assert!(treemap(&df, ColorRange { min: 0.0, max: 1.0 }).is_none());
    }
}
