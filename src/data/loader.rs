use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::frame::{DataFrame, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file, one column per field (recommended)
/// * `.csv`     – header row with column names, cell types guessed
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Consolidated-dataset post-processing
// ---------------------------------------------------------------------------

/// Columns removed from the consolidated table at load time; they are
/// either ratings irrelevant to the exploration view or duplicated by the
/// processed table.
const DROPPED_COLUMNS: [&str; 7] = [
    "co2_rating",
    "smog_rating",
    "combined_mpg",
    "engine_size_l",
    "cylinders",
    "city_l_100_km",
    "highway_l_100_km",
];

/// Exploration-view column order.
const EXPLORE_COLUMNS: [&str; 7] = [
    "model_year",
    "make",
    "model",
    "co2_emissions_g_km",
    "fuel_type",
    "vehicle_class",
    "combined_l_100_km",
];

/// Raw fuel-type codes as recorded by the source agency.
const FUEL_CODES: [(&str, &str); 5] = [
    ("X", "reg_gasoline"),
    ("Z", "premium_gasoline"),
    ("E", "ethanol"),
    ("D", "diesel"),
    ("N", "natural_gas"),
];

/// Shape the raw consolidated table for the exploration view: drop the
/// unused columns, fix the column order, and spell out the fuel codes.
///
/// Codes outside the known mapping pass through unchanged (logged once
/// per distinct code) rather than turning into nulls; an unrecognised
/// code is still a real observation.
pub fn prepare_consolidated(raw: &DataFrame) -> Result<DataFrame> {
    let mut df = raw
        .drop_columns(&DROPPED_COLUMNS)
        .select(&EXPLORE_COLUMNS)
        .context("consolidated dataset is missing expected columns")?;

    let mut unknown: BTreeSet<String> = BTreeSet::new();
    let remapped: Vec<Value> = df
        .column("fuel_type")
        .unwrap_or(&[])
        .iter()
        .map(|v| match v {
            Value::Str(code) => match FUEL_CODES.iter().find(|(c, _)| c == code) {
                Some((_, label)) => Value::Str((*label).to_string()),
                None => {
                    unknown.insert(code.clone());
                    v.clone()
                }
            },
            other => other.clone(),
        })
        .collect();
    df.set_column("fuel_type", remapped);

    for code in &unknown {
        log::warn!("unknown fuel-type code '{code}' kept as-is");
    }

    Ok(df)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. Cell types are guessed per
/// cell (int → float → date → string); the semantic column kind is
/// resolved later by classification.
fn load_csv(path: &Path) -> Result<DataFrame> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields, expected {}",
                record.len(),
                headers.len()
            );
        }
        for (col, cell) in record.iter().enumerate() {
            columns[col].push(guess_cell_type(cell));
        }
    }

    DataFrame::from_columns(headers.into_iter().zip(columns).collect())
}

fn guess_cell_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if let Ok(d) = s.parse::<NaiveDate>() {
        return Value::Date(d);
    }
    Value::Str(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet table. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<Value>> = Vec::new();
    let mut dictionary_tagged: Vec<String> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if names.is_empty() {
            names = schema.fields().iter().map(|f| f.name().clone()).collect();
            columns = vec![Vec::new(); names.len()];
            // Pandas categoricals arrive as dictionary-encoded columns;
            // carry that through as an explicit categorical tag.
            for field in schema.fields() {
                if matches!(field.data_type(), DataType::Dictionary(_, _)) {
                    dictionary_tagged.push(field.name().clone());
                }
            }
        }

        for (col_idx, name) in names.iter().enumerate() {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("parquet batch missing column '{name}'"))?;
            let array = batch.column(idx);
            for row in 0..batch.num_rows() {
                columns[col_idx].push(extract_cell(array, row));
            }
        }
    }

    let mut df = DataFrame::from_columns(names.into_iter().zip(columns).collect())?;
    for name in dictionary_tagged {
        df.tag_categorical(&name);
    }
    Ok(df)
}

// -- Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                Value::Str(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                Value::Str(s.value(row).to_string())
            }
        }
        DataType::Int16 => {
            let arr = col.as_any().downcast_ref::<Int16Array>();
            arr.map_or(Value::Null, |a| Value::Int(a.value(row) as i64))
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>();
            arr.map_or(Value::Null, |a| Value::Int(a.value(row) as i64))
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>();
            arr.map_or(Value::Null, |a| Value::Int(a.value(row)))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>();
            arr.map_or(Value::Null, |a| Value::Float(a.value(row) as f64))
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>();
            arr.map_or(Value::Null, |a| Value::Float(a.value(row)))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>();
            arr.map_or(Value::Null, |a| Value::Str(a.value(row).to_string()))
        }
        DataType::Date32 => {
            let arr = col.as_any().downcast_ref::<Date32Array>();
            arr.and_then(|a| a.value_as_date(row))
                .map_or(Value::Null, Value::Date)
        }
        DataType::Timestamp(unit, _) => {
            // Timezone is stripped here; the exploration view only deals
            // in naive dates. Pandas writes nanosecond timestamps, Polars
            // microsecond ones, so every unit has to be handled.
            use arrow::datatypes::{
                TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
                TimestampNanosecondType, TimestampSecondType,
            };
            let dt = match unit {
                TimeUnit::Second => col
                    .as_primitive_opt::<TimestampSecondType>()
                    .and_then(|a| chrono::DateTime::from_timestamp(a.value(row), 0)),
                TimeUnit::Millisecond => col
                    .as_primitive_opt::<TimestampMillisecondType>()
                    .and_then(|a| chrono::DateTime::from_timestamp_millis(a.value(row))),
                TimeUnit::Microsecond => col
                    .as_primitive_opt::<TimestampMicrosecondType>()
                    .and_then(|a| chrono::DateTime::from_timestamp_micros(a.value(row))),
                TimeUnit::Nanosecond => col
                    .as_primitive_opt::<TimestampNanosecondType>()
                    .map(|a| chrono::DateTime::from_timestamp_nanos(a.value(row))),
            };
            dt.map_or(Value::Null, |d| Value::Date(d.date_naive()))
        }
        DataType::Dictionary(_, _) => {
            use arrow::datatypes::Int32Type;
            let dict = col.as_dictionary_opt::<Int32Type>();
            match dict {
                Some(d) => {
                    let key = d.keys().value(row) as usize;
                    extract_cell(&d.values().clone(), key)
                }
                None => Value::Str(format!("{:?}", col.data_type())),
            }
        }
        other => Value::Str(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_cell_type_ordering() {
        assert_eq!(guess_cell_type(""), Value::Null);
        assert_eq!(guess_cell_type("2015"), Value::Int(2015));
        assert_eq!(guess_cell_type("7.5"), Value::Float(7.5));
        assert_eq!(
            guess_cell_type("2021-04-03"),
            Value::Date(NaiveDate::from_ymd_opt(2021, 4, 3).unwrap())
        );
        assert_eq!(
            guess_cell_type("Corolla"),
            Value::Str("Corolla".to_string())
        );
    }

    #[test]
    fn timestamp_cells_decode_in_every_unit() {
        use arrow::array::{
            TimestampMicrosecondArray, TimestampMillisecondArray, TimestampSecondArray,
        };

        let noon = NaiveDate::from_ymd_opt(2021, 4, 3)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
            .and_utc();
        let expected = Value::Date(noon.date_naive());

        let secs: Arc<dyn Array> = Arc::new(TimestampSecondArray::from(vec![noon.timestamp()]));
        let millis: Arc<dyn Array> =
            Arc::new(TimestampMillisecondArray::from(vec![noon.timestamp_millis()]));
        let micros: Arc<dyn Array> =
            Arc::new(TimestampMicrosecondArray::from(vec![noon.timestamp_micros()]));

        assert_eq!(extract_cell(&secs, 0), expected);
        assert_eq!(extract_cell(&millis, 0), expected);
        // Polars writes microsecond timestamps by default.
        assert_eq!(extract_cell(&micros, 0), expected);
    }

    fn raw_consolidated() -> DataFrame {
        let codes = ["X", "Z", "E", "D", "N", "Q"];
        let n = codes.len();
        let str_col = |prefix: &str| -> Vec<Value> {
            (0..n).map(|i| Value::Str(format!("{prefix}{i}"))).collect()
        };
        let float_col = |base: f64| -> Vec<Value> {
            (0..n).map(|i| Value::Float(base + i as f64)).collect()
        };
        DataFrame::from_columns(vec![
            ("model_year".into(), (0..n).map(|i| Value::Int(2015 + i as i64)).collect()),
            ("make".into(), str_col("make")),
            ("model".into(), str_col("model")),
            (
                "fuel_type".into(),
                codes.iter().map(|c| Value::Str(c.to_string())).collect(),
            ),
            ("vehicle_class".into(), str_col("class")),
            ("co2_emissions_g_km".into(), float_col(180.0)),
            ("combined_l_100_km".into(), float_col(8.0)),
            ("co2_rating".into(), float_col(4.0)),
            ("smog_rating".into(), float_col(5.0)),
            ("combined_mpg".into(), float_col(30.0)),
            ("engine_size_l".into(), float_col(2.0)),
            ("cylinders".into(), float_col(4.0)),
            ("city_l_100_km".into(), float_col(9.0)),
            ("highway_l_100_km".into(), float_col(7.0)),
        ])
        .unwrap()
    }

    #[test]
    fn prepare_consolidated_shapes_and_remaps() {
        let df = prepare_consolidated(&raw_consolidated()).unwrap();
        assert_eq!(df.names(), EXPLORE_COLUMNS);

        let fuel: Vec<String> = df
            .column("fuel_type")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            fuel,
            [
                "reg_gasoline",
                "premium_gasoline",
                "ethanol",
                "diesel",
                "natural_gas",
                // Unknown code passes through untouched.
                "Q",
            ]
        );
    }

    #[test]
    fn prepare_consolidated_rejects_missing_schema() {
        let df = DataFrame::from_columns(vec![(
            "make".into(),
            vec![Value::Str("Toyota".into())],
        )])
        .unwrap();
        assert!(prepare_consolidated(&df).is_err());
    }
}
