use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{Result, bail};
use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes found in the source
/// tables. Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Int(_) => 1,
                Float(_) => 2,
                Str(_) => 3,
                Date(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Str(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    // Integers render without a decimal point so model years show as
    // "2015", not "2015.0".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Try to interpret the value as an `f64` for bounds and colour mapping.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – semantic column type
// ---------------------------------------------------------------------------

/// Columns with fewer distinct values than this are treated as categorical
/// even when their cells are numeric.
pub const CATEGORICAL_CARDINALITY_LIMIT: usize = 10;

/// Closed set of semantic column types the filter engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Temporal,
    Text,
}

/// Classify a column from its current values. Deterministic and pure.
///
/// Precedence: explicit categorical tag or low cardinality first, then
/// numeric, then temporal, then text. A column that is all-null ends up
/// categorical (cardinality zero).
pub fn classify(values: &[Value], tagged_categorical: bool) -> ColumnKind {
    if tagged_categorical {
        return ColumnKind::Categorical;
    }
    let distinct: BTreeSet<&Value> = values.iter().collect();
    if distinct.len() < CATEGORICAL_CARDINALITY_LIMIT {
        return ColumnKind::Categorical;
    }

    let non_null = || values.iter().filter(|v| !v.is_null());
    if non_null().all(|v| v.as_f64().is_some()) {
        return ColumnKind::Numeric;
    }
    if non_null().all(|v| v.as_date().is_some()) {
        return ColumnKind::Temporal;
    }
    ColumnKind::Text
}

/// Best-effort temporal coercion of a string column.
///
/// Returns the coerced values only when every non-null cell parses as a
/// date; otherwise `None` and the caller keeps the column unchanged. No
/// error ever escapes. Timezone-aware timestamps are stripped to their
/// naive date.
pub fn coerce_temporal(values: &[Value]) -> Option<Vec<Value>> {
    let mut saw_string = false;
    let coerced: Option<Vec<Value>> = values
        .iter()
        .map(|v| match v {
            Value::Null => Some(Value::Null),
            Value::Date(d) => Some(Value::Date(*d)),
            Value::Str(s) => {
                saw_string = true;
                parse_date(s).map(Value::Date)
            }
            // Numeric columns are never coerced.
            _ => None,
        })
        .collect();
    match coerced {
        Some(vals) if saw_string => Some(vals),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = s.parse::<NaiveDate>() {
        return Some(d);
    }
    // RFC 3339 timestamps drop their offset here, matching the
    // tz-stripping the exploration view expects.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    None
}

// ---------------------------------------------------------------------------
// DataFrame – ordered named columns
// ---------------------------------------------------------------------------

/// An in-memory table: ordered named columns of equal length. Row order is
/// the order rows appeared in the source file. Frames are cheap-ish to
/// clone and every filter step produces a fresh one; the base frame loaded
/// at startup is never mutated.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    /// Columns explicitly tagged categorical by the loader, regardless of
    /// cardinality.
    categorical_tags: BTreeSet<String>,
}

impl DataFrame {
    /// Build a frame from `(name, values)` pairs. All columns must share
    /// one length and names must be unique.
    pub fn from_columns(cols: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let mut names = Vec::with_capacity(cols.len());
        let mut columns = Vec::with_capacity(cols.len());
        let mut n_rows: Option<usize> = None;
        for (name, values) in cols {
            match n_rows {
                None => n_rows = Some(values.len()),
                Some(n) if n != values.len() => {
                    bail!(
                        "column '{name}' has {} rows, expected {n}",
                        values.len()
                    );
                }
                _ => {}
            }
            if names.contains(&name) {
                bail!("duplicate column name '{name}'");
            }
            names.push(name);
            columns.push(values);
        }
        Ok(DataFrame {
            names,
            columns,
            categorical_tags: BTreeSet::new(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.columns[col][row]
    }

    /// Mark a column as categorical for the filter engine's type dispatch.
    pub fn tag_categorical(&mut self, name: &str) {
        self.categorical_tags.insert(name.to_string());
    }

    pub fn is_tagged_categorical(&self, name: &str) -> bool {
        self.categorical_tags.contains(name)
    }

    /// Project onto `keep`, in the given order. Unknown names are an error
    /// so schema drift in the source file surfaces at load time.
    pub fn select(&self, keep: &[&str]) -> Result<DataFrame> {
        let mut names = Vec::with_capacity(keep.len());
        let mut columns = Vec::with_capacity(keep.len());
        for &name in keep {
            let Some(idx) = self.column_index(name) else {
                bail!("missing column '{name}'");
            };
            names.push(name.to_string());
            columns.push(self.columns[idx].clone());
        }
        let categorical_tags = self
            .categorical_tags
            .iter()
            .filter(|t| keep.contains(&t.as_str()))
            .cloned()
            .collect();
        Ok(DataFrame {
            names,
            columns,
            categorical_tags,
        })
    }

    /// Drop the named columns; names not present are ignored.
    pub fn drop_columns(&self, drop: &[&str]) -> DataFrame {
        let keep: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|n| !drop.contains(n))
            .collect();
        // select() can only fail on unknown names, which `keep` cannot hold.
        self.select(&keep).unwrap_or_default()
    }

    /// Keep the rows where `mask` is true. Mask length must equal row count.
    pub fn filter_rows(&self, mask: &[bool]) -> DataFrame {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                col.iter()
                    .zip(mask)
                    .filter(|(_, &keep)| keep)
                    .map(|(v, _)| v.clone())
                    .collect()
            })
            .collect();
        DataFrame {
            names: self.names.clone(),
            columns,
            categorical_tags: self.categorical_tags.clone(),
        }
    }

    /// Overwrite a column wholesale. Ignored when the name is unknown or
    /// the length differs.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        if let Some(idx) = self.column_index(name) {
            if values.len() == self.columns[idx].len() {
                self.columns[idx] = values;
            }
        }
    }

    /// Sorted distinct values of a column (nulls included, like the
    /// source's `unique()`).
    pub fn distinct(&self, name: &str) -> BTreeSet<Value> {
        self.column(name)
            .map(|col| col.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `(min, max)` over the numeric cells of a column; `None` when the
    /// column is missing or holds no numbers.
    pub fn numeric_bounds(&self, name: &str) -> Option<(f64, f64)> {
        let col = self.column(name)?;
        let mut bounds: Option<(f64, f64)> = None;
        for v in col.iter().filter_map(Value::as_f64) {
            bounds = Some(match bounds {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        bounds
    }

    /// `(min, max)` over the date cells of a column.
    pub fn date_bounds(&self, name: &str) -> Option<(NaiveDate, NaiveDate)> {
        let col = self.column(name)?;
        let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
        for d in col.iter().filter_map(Value::as_date) {
            bounds = Some(match bounds {
                None => (d, d),
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
            });
        }
        bounds
    }

    /// Arithmetic mean of a column's numeric cells.
    pub fn mean(&self, name: &str) -> Option<f64> {
        let col = self.column(name)?;
        let mut sum = 0.0;
        let mut n = 0usize;
        for v in col.iter().filter_map(Value::as_f64) {
            sum += v;
            n += 1;
        }
        (n > 0).then(|| sum / n as f64)
    }

    /// Group rows by the rendered label of `by` and average `value` per
    /// group. Labels come back in sorted order.
    pub fn grouped_mean(&self, by: &str, value: &str) -> Option<BTreeMap<String, f64>> {
        let keys = self.column(by)?;
        let vals = self.column(value)?;
        let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for (k, v) in keys.iter().zip(vals) {
            if let Some(x) = v.as_f64() {
                let slot = acc.entry(k.to_string()).or_insert((0.0, 0));
                slot.0 += x;
                slot.1 += 1;
            }
        }
        Some(
            acc.into_iter()
                .map(|(k, (sum, n))| (k, sum / n as f64))
                .collect(),
        )
    }
}
