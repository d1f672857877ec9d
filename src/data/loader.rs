use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, ColumnKind, SaleRecord, SalesTable};
use crate::config::ColumnNames;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse a sales table from a file, uncached. Dispatch by extension.
///
/// Supported formats:
/// * `.csv` (default) – comma-separated with a header row
/// * `.json`          – `[{ "genre_desc": "...", "price": 9.9, ... }, ...]`
/// * `.parquet`       – flat Parquet with one column per attribute
///
/// Rows sharing a non-null order identifier are de-duplicated, keeping the
/// first one seen.
pub fn load_file(path: &Path, columns: &ColumnNames) -> Result<SalesTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        _ => read_csv(path)?,
    };

    let table = assemble(raw, columns)?;
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

/// Untyped cells as read from any source format.
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Row assembly: raw cells → SaleRecord
// ---------------------------------------------------------------------------

static NULL_CELL: CellValue = CellValue::Null;

/// Resolved positions of the interpreted columns in a raw header.
struct ColumnIndex {
    order_id: Option<usize>,
    genre: usize,
    price: usize,
    rating: Option<usize>,
    discount: Option<usize>,
    sale_date: Option<usize>,
}

impl ColumnIndex {
    fn resolve(header: &[String], names: &ColumnNames) -> Result<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);
        Ok(ColumnIndex {
            order_id: find(&names.order_id),
            genre: find(&names.genre)
                .with_context(|| format!("missing '{}' column", names.genre))?,
            price: find(&names.price)
                .with_context(|| format!("missing '{}' column", names.price))?,
            rating: find(&names.rating),
            discount: find(&names.discount),
            sale_date: find(&names.sale_date),
        })
    }
}

fn assemble(raw: RawTable, names: &ColumnNames) -> Result<SalesTable> {
    let index = ColumnIndex::resolve(&raw.columns, names)?;

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut duplicates = 0usize;
    let mut records = Vec::with_capacity(raw.rows.len());

    for (row_no, cells) in raw.rows.into_iter().enumerate() {
        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).unwrap_or(&NULL_CELL);

        let order_id = cell(index.order_id).as_key();
        if let Some(id) = &order_id {
            if !seen_ids.insert(id.clone()) {
                duplicates += 1;
                continue;
            }
        }

        let genre = cell(Some(index.genre)).as_key().unwrap_or_default();
        let price = finite_number(cell(Some(index.price)), row_no, &names.price)?
            .with_context(|| format!("row {row_no}, '{}': price is empty", names.price))?;
        let rating = finite_number(cell(index.rating), row_no, &names.rating)?;
        let discount = finite_number(cell(index.discount), row_no, &names.discount)?;
        let sale_date = cell(index.sale_date).as_key();

        let extra: BTreeMap<String, CellValue> = raw
            .columns
            .iter()
            .zip(cells.iter())
            .filter(|(name, _)| !names.is_known(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        records.push(SaleRecord {
            order_id,
            genre,
            price,
            rating,
            discount,
            sale_date,
            extra,
        });
    }

    if duplicates > 0 {
        log::debug!("Dropped {duplicates} rows with a repeated '{}'", names.order_id);
    }

    Ok(SalesTable::from_records(raw.columns, records))
}

/// Numeric reading of an interpreted cell. Text that spells a number is
/// accepted; NaN and infinities are not.
fn finite_number(value: &CellValue, row: usize, col: &str) -> Result<Option<f64>> {
    let number = match value {
        CellValue::Null => return Ok(None),
        CellValue::Text(s) => s.parse::<f64>().ok(),
        other => other.as_f64(),
    };
    match number {
        Some(v) if v.is_finite() => Ok(Some(v)),
        Some(_) => bail!("row {row}, '{col}': '{value}' is not a finite number"),
        None => bail!("row {row}, '{col}': '{value}' is not a number"),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line. Each
/// column's type is inferred from all of its fields, as pandas does.
fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        records.push(result.with_context(|| format!("CSV row {row_no}"))?);
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|i| {
            let fields: Vec<&str> = records
                .iter()
                .map(|r| r.get(i).unwrap_or("").trim())
                .collect();
            ColumnKind::infer(&fields)
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(&kinds)
                .map(|(field, kind)| kind.parse(field.trim()))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "order_id": 1, "genre_desc": "Romance", "price": 10.0, "discount": 0.1 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut objects = Vec::with_capacity(records.len());
    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file, as written by `df.to_parquet()` in Pandas or
/// `df.write_parquet()` in Polars. Every column maps to one cell per row.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, name)| {
                    extract_cell(col, row).with_context(|| format!("parquet column '{name}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(RawTable { columns, rows })
}

/// Extract a single cell from an Arrow column at a given row. Timestamps
/// become `%Y-%m-%d %H:%M:%S` text, the form sale dates are parsed from.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let datetime = |dt: NaiveDateTime| {
        CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    };
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::Int8 => col
            .as_primitive_opt::<Int8Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int16 => col
            .as_primitive_opt::<Int16Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        DataType::Date32 => col
            .as_primitive_opt::<Date32Type>()
            .and_then(|a| a.value_as_date(row))
            .map(|d| CellValue::Text(d.format("%Y-%m-%d").to_string())),
        DataType::Date64 => col
            .as_primitive_opt::<Date64Type>()
            .and_then(|a| a.value_as_datetime(row))
            .map(datetime),
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => col
                .as_primitive_opt::<TimestampSecondType>()
                .and_then(|a| a.value_as_datetime(row)),
            TimeUnit::Millisecond => col
                .as_primitive_opt::<TimestampMillisecondType>()
                .and_then(|a| a.value_as_datetime(row)),
            TimeUnit::Microsecond => col
                .as_primitive_opt::<TimestampMicrosecondType>()
                .and_then(|a| a.value_as_datetime(row)),
            TimeUnit::Nanosecond => col
                .as_primitive_opt::<TimestampNanosecondType>()
                .and_then(|a| a.value_as_datetime(row)),
        }
        .map(datetime),
        other => bail!("unsupported column type {other:?}"),
    };
    value.with_context(|| format!("row {row}: unreadable {:?} value", col.data_type()))
}
