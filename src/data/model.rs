use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::ColumnNames;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a pass-through column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV column can take.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Textual form of a non-null cell, used for identifiers and labels.
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – the dtype inferred for a whole text column
// ---------------------------------------------------------------------------

/// Type shared by every field of a text column, inferred once per column so
/// a column mixing `"007"` and `"abc"` keeps both as text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    /// Narrowest kind every non-empty field parses as: integer, then
    /// float, then boolean, and finally text.
    pub fn infer(fields: &[&str]) -> ColumnKind {
        [ColumnKind::Integer, ColumnKind::Float, ColumnKind::Bool]
            .into_iter()
            .find(|kind| fields.iter().all(|f| f.is_empty() || kind.accepts(f)))
            .unwrap_or(ColumnKind::Text)
    }

    fn accepts(self, field: &str) -> bool {
        match self {
            ColumnKind::Integer => field.parse::<i64>().is_ok(),
            ColumnKind::Float => field.parse::<f64>().is_ok(),
            ColumnKind::Bool => field == "true" || field == "false",
            ColumnKind::Text => true,
        }
    }

    /// Convert one field of a column of this kind. Empty fields are `Null`.
    pub fn parse(self, field: &str) -> CellValue {
        if field.is_empty() {
            return CellValue::Null;
        }
        match self {
            ColumnKind::Integer => field
                .parse()
                .map_or_else(|_| CellValue::Text(field.to_string()), CellValue::Integer),
            ColumnKind::Float => field
                .parse()
                .map_or_else(|_| CellValue::Text(field.to_string()), CellValue::Float),
            ColumnKind::Bool => CellValue::Bool(field == "true"),
            ColumnKind::Text => CellValue::Text(field.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// SaleRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single sale or review (one row of the source file).
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    /// Order identifier, when the source has one. Used for de-duplication.
    pub order_id: Option<String>,
    /// Category label (book genre).
    pub genre: String,
    pub price: f64,
    /// Star rating; only the ratings dataset carries it.
    pub rating: Option<f64>,
    /// Discount fraction in `0..=1`.
    pub discount: Option<f64>,
    /// Sale date as it appears in the file. See [`SaleRecord::sale_date`].
    pub sale_date: Option<String>,
    /// Columns the dashboard does not interpret, passed through untouched.
    pub extra: BTreeMap<String, CellValue>,
}

impl SaleRecord {
    /// Whether the sale carried a strictly positive discount.
    pub fn is_discounted(&self) -> bool {
        self.discount.is_some_and(|d| d > 0.0)
    }

    /// Parse the sale date. Accepts `YYYY-MM-DD`, optionally followed by a
    /// time component.
    pub fn sale_date(&self) -> Option<NaiveDate> {
        let raw = self.sale_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                    .map(|dt| dt.date())
                    .ok()
            })
    }

    /// Text shown for `column` in the data grid.
    pub fn display_cell(&self, column: &str, names: &ColumnNames) -> String {
        let number = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_default();
        match column {
            c if c == names.order_id => self.order_id.clone().unwrap_or_default(),
            c if c == names.genre => self.genre.clone(),
            c if c == names.price => format!("{:.2}", self.price),
            c if c == names.rating => number(self.rating),
            c if c == names.discount => number(self.discount),
            c if c == names.sale_date => self.sale_date.clone().unwrap_or_default(),
            other => self
                .extra
                .get(other)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }

    /// Monetary value of the discount (`price × discount`).
    pub fn discount_value(&self) -> f64 {
        self.price * self.discount.unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// SalesTable – the complete loaded (or filtered) table
// ---------------------------------------------------------------------------

/// An ordered collection of records sharing the same source schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTable {
    /// Column names in source header order.
    pub columns: Vec<String>,
    /// All records (rows), in source order.
    pub records: Vec<SaleRecord>,
    /// Sorted set of distinct genre labels present in `records`.
    pub genres: BTreeSet<String>,
}

impl SalesTable {
    /// Build the genre index from the records.
    pub fn from_records(columns: Vec<String>, records: Vec<SaleRecord>) -> Self {
        let genres = records.iter().map(|r| r.genre.clone()).collect();
        SalesTable {
            columns,
            records,
            genres,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Smallest and largest price, or `None` for an empty table.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut prices = self.records.iter().map(|r| r.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}
