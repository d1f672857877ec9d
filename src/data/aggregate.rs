//! Display aggregates for the dashboard charts.
//!
//! Every function is pure over a borrowed table. Empty input yields empty
//! series or `None`, never NaN.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;

use super::model::{SaleRecord, SalesTable};

/// Ordered `(label, value)` pairs handed to a chart.
pub type Series = Vec<(String, f64)>;

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Ratings at or above this level count as satisfied.
pub const SATISFIED_RATING: f64 = 4.0;

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct SalesSummary {
    pub total_sales: usize,
    pub revenue: f64,
    pub mean_price: f64,
    pub active_genres: usize,
}

impl SalesSummary {
    pub fn compute(table: &SalesTable) -> Option<Self> {
        if table.is_empty() {
            return None;
        }
        let revenue: f64 = table.records.iter().map(|r| r.price).sum();
        Some(SalesSummary {
            total_sales: table.len(),
            revenue,
            mean_price: revenue / table.len() as f64,
            active_genres: table.genres.len(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RatingsSummary {
    /// `None` when no record carries a rating.
    pub mean_rating: Option<f64>,
    pub total_reviews: usize,
    pub mean_price: f64,
    /// Percentage of rows rated [`SATISFIED_RATING`] or higher.
    pub satisfaction_rate: f64,
}

impl RatingsSummary {
    pub fn compute(table: &SalesTable) -> Option<Self> {
        if table.is_empty() {
            return None;
        }
        let n = table.len() as f64;
        let satisfied = table
            .records
            .iter()
            .filter(|r| r.rating.is_some_and(|v| v >= SATISFIED_RATING))
            .count();
        Some(RatingsSummary {
            mean_rating: mean(table.records.iter().filter_map(|r| r.rating)),
            total_reviews: table.len(),
            mean_price: table.records.iter().map(|r| r.price).sum::<f64>() / n,
            satisfaction_rate: satisfied as f64 / n * 100.0,
        })
    }
}

// ---------------------------------------------------------------------------
// Group-by helpers
// ---------------------------------------------------------------------------

#[derive(Default, Clone, Copy)]
struct Acc {
    sum: f64,
    count: usize,
}

impl Acc {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut acc = Acc::default();
    values.for_each(|v| acc.push(v));
    (acc.count > 0).then(|| acc.mean())
}

/// Accumulate `value(record)` per `key(record)`, skipping records where
/// either is absent. Groups come out in key order.
fn group_by<K, FK, FV>(table: &SalesTable, key: FK, value: FV) -> BTreeMap<K, Acc>
where
    K: Ord,
    FK: Fn(&SaleRecord) -> Option<K>,
    FV: Fn(&SaleRecord) -> Option<f64>,
{
    let mut groups: BTreeMap<K, Acc> = BTreeMap::new();
    for record in &table.records {
        if let (Some(k), Some(v)) = (key(record), value(record)) {
            groups.entry(k).or_default().push(v);
        }
    }
    groups
}

fn genre_key(r: &SaleRecord) -> Option<String> {
    Some(r.genre.clone())
}

/// Integer rating level; fractional ratings truncate toward zero.
fn rating_level(r: &SaleRecord) -> Option<i64> {
    r.rating.map(|v| v.trunc() as i64)
}

/// The rating as the ratings charts read it: truncated to its level.
fn truncated_rating(r: &SaleRecord) -> Option<f64> {
    r.rating.map(f64::trunc)
}

/// Stable ascending sort by value; ties keep label order.
fn ascending(mut series: Series) -> Series {
    series.sort_by(|a, b| a.1.total_cmp(&b.1));
    series
}

/// The `n` largest points, returned in ascending order.
fn top_n_ascending(series: Series, n: usize) -> Series {
    let sorted = ascending(series);
    let skip = sorted.len().saturating_sub(n);
    sorted.into_iter().skip(skip).collect()
}

// ---------------------------------------------------------------------------
// Sales page
// ---------------------------------------------------------------------------

pub fn mean_price_by_genre(table: &SalesTable) -> Series {
    ascending(
        group_by(table, genre_key, |r| Some(r.price))
            .into_iter()
            .map(|(g, acc)| (g, acc.mean()))
            .collect(),
    )
}

pub fn sales_count_by_genre(table: &SalesTable) -> Series {
    ascending(
        group_by(table, genre_key, |r| Some(r.price))
            .into_iter()
            .map(|(g, acc)| (g, acc.count as f64))
            .collect(),
    )
}

/// The `n` genres with the highest revenue, ascending.
pub fn top_revenue_by_genre(table: &SalesTable, n: usize) -> Series {
    top_n_ascending(
        group_by(table, genre_key, |r| Some(r.price))
            .into_iter()
            .map(|(g, acc)| (g, acc.sum))
            .collect(),
        n,
    )
}

/// Sum of `value` per calendar month, January first, zero-filled. Records
/// without a parseable sale date are skipped.
fn monthly_sum(table: &SalesTable, value: impl Fn(&SaleRecord) -> f64) -> Series {
    let mut totals = [0.0f64; 12];
    for record in &table.records {
        if let Some(date) = record.sale_date() {
            totals[date.month0() as usize] += value(record);
        }
    }
    MONTHS
        .iter()
        .zip(totals)
        .map(|(m, v)| (m.to_string(), v))
        .collect()
}

pub fn monthly_revenue(table: &SalesTable) -> Series {
    monthly_sum(table, |r| r.price)
}

/// Total discounted amount (`price × discount`) per month.
pub fn monthly_discount_value(table: &SalesTable) -> Series {
    monthly_sum(table, SaleRecord::discount_value)
}

/// Labels of the `n` largest and `n` smallest points.
pub fn extreme_labels(series: &Series, n: usize) -> BTreeSet<String> {
    let sorted = ascending(series.clone());
    let low = sorted.iter().take(n);
    let high = sorted.iter().rev().take(n);
    low.chain(high).map(|(label, _)| label.clone()).collect()
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width bin edges over `[lo, hi]`. A degenerate range gets one
/// unit-wide bin around the value.
fn bin_edges(lo: f64, hi: f64, bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    if hi <= lo {
        return vec![HistogramBin {
            start: lo - 0.5,
            end: lo + 0.5,
            count: 0,
        }];
    }
    let width = (hi - lo) / bins as f64;
    (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect()
}

/// Index of the bin holding `value`; the last bin is closed on the right.
fn bin_index(edges: &[HistogramBin], value: f64) -> usize {
    let Some(first) = edges.first() else {
        return 0;
    };
    if edges.len() == 1 {
        return 0;
    }
    let width = first.width();
    let idx = ((value - first.start) / width).floor();
    (idx.max(0.0) as usize).min(edges.len() - 1)
}

/// Price distribution over `bins` equal-width bins.
pub fn price_histogram(table: &SalesTable, bins: usize) -> Vec<HistogramBin> {
    let Some((lo, hi)) = table.price_bounds() else {
        return Vec::new();
    };
    let mut edges = bin_edges(lo, hi, bins);
    for record in &table.records {
        let i = bin_index(&edges, record.price);
        edges[i].count += 1;
    }
    edges
}

/// Price distribution split by star category (rating truncated, clipped to
/// 1..=5). All categories share the same bin edges. Records without a
/// rating are skipped.
pub fn price_histogram_by_rating(
    table: &SalesTable,
    bins: usize,
) -> BTreeMap<u8, Vec<HistogramBin>> {
    let mut out = BTreeMap::new();
    let Some((lo, hi)) = table.price_bounds() else {
        return out;
    };
    let edges = bin_edges(lo, hi, bins);
    for record in &table.records {
        let Some(rating) = truncated_rating(record) else {
            continue;
        };
        let stars = rating.clamp(1.0, 5.0) as u8;
        let hist = out.entry(stars).or_insert_with(|| edges.clone());
        let i = bin_index(&edges, record.price);
        hist[i].count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Ratings page
// ---------------------------------------------------------------------------

/// Mean price per integer rating level, ascending by price.
pub fn mean_price_by_rating(table: &SalesTable) -> Series {
    ascending(
        group_by(table, rating_level, |r| Some(r.price))
            .into_iter()
            .map(|(level, acc)| (level.to_string(), acc.mean()))
            .collect(),
    )
}

/// Number of reviews per integer rating level, ascending by level.
pub fn rating_distribution(table: &SalesTable) -> Series {
    group_by(table, rating_level, |r| Some(r.price))
        .into_iter()
        .map(|(level, acc)| (level.to_string(), acc.count as f64))
        .collect()
}

/// Mean truncated rating per genre, ascending.
pub fn mean_rating_by_genre(table: &SalesTable) -> Series {
    ascending(
        group_by(table, genre_key, truncated_rating)
            .into_iter()
            .map(|(g, acc)| (g, acc.mean()))
            .collect(),
    )
}

pub fn reviews_by_genre(table: &SalesTable) -> Series {
    sales_count_by_genre(table)
}

/// Genres with the best rating per unit price: mean truncated rating / mean
/// price × 10. Keeps the `n` best, ascending.
pub fn top_value_for_money(table: &SalesTable, n: usize) -> Series {
    let ratings = group_by(table, genre_key, truncated_rating);
    let prices = group_by(table, genre_key, |r| Some(r.price));
    let scores: Series = ratings
        .into_iter()
        .filter_map(|(genre, rating)| {
            let price = prices.get(&genre)?.mean();
            (price > 0.0).then(|| (genre, rating.mean() / price * 10.0))
        })
        .collect();
    top_n_ascending(scores, n)
}
